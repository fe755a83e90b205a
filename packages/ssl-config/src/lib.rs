//! # remoting_ssl
//!
//! Builds rustls client TLS contexts from Java-style trust and key stores.
//!
//! ## Features
//!
//! - **JKS and PKCS#12** trust and key stores, format declared per store
//! - **Mutual TLS** with alias-based client key selection
//! - **Validated configuration** that can also be deserialized with serde
//! - **Typed errors** with the failing path and alias attached
//!
//! ## Usage
//!
//! ```no_run
//! use remoting_ssl::{SslConfiguration, SslSocketFactories, StoreType};
//!
//! let config = SslConfiguration::builder()
//!     .trust_store_path("certs/truststore.jks")
//!     .key_store_path("certs/client.p12")
//!     .key_store_type(StoreType::Pkcs12)
//!     .key_store_password("changeit")
//!     .build()?;
//!
//! let factory = SslSocketFactories::create_ssl_socket_factory(&config)?;
//! let connector = factory.connector();
//! # drop(connector);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]

pub mod config;
pub mod error;
pub mod store;
pub mod tls;

pub use config::{
    ConfigurationError, KeyStoreConfiguration, SslConfiguration, SslConfigurationParts, StoreType,
};
pub use error::{Error, Kind, Result};
pub use store::{StoreEntry, StoreHandle};
pub use tls::{
    CertificateSummary, KeyMaterial, SslSocketFactories, SslSocketFactory, TrustAnchors,
};
