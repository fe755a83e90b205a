//! TLS material and client context
//!
//! Resolves trust anchors and the client key out of loaded stores, then
//! composes them into a rustls [`ClientConfig`](rustls::ClientConfig).

pub mod certificate;
pub mod factory;
pub mod key;
pub mod trust;

pub use certificate::CertificateSummary;
pub use factory::{SslSocketFactories, SslSocketFactory};
pub use key::{KeyMaterial, resolve_key};
pub use trust::{TrustAnchors, resolve_trust};
