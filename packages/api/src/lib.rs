//! # remoting
//!
//! TLS socket factories built from declarative trust and key store
//! configuration, plus the response decoders clients plug in on top.
//!
//! The TLS half lives in [`remoting_ssl`] and is re-exported here.

#![deny(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]

pub mod decoder;

pub use decoder::{DecodeError, Decoder, JsonDecoder, TextDelegateDecoder};

pub use remoting_ssl::{
    ConfigurationError, Error, Kind, Result, SslConfiguration, SslConfigurationParts,
    SslSocketFactories, SslSocketFactory, StoreType,
};

/// The TLS configuration and factory crate.
pub use remoting_ssl as ssl;
