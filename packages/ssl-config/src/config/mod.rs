//! SSL Configuration
//!
//! Declarative description of the trust store and optional key store a TLS
//! client should use. Validation is purely structural and happens once, when
//! the configuration is constructed.

pub mod ssl;
pub mod store_type;
pub mod validation;

pub use ssl::{KeyStoreConfiguration, SslConfiguration, SslConfigurationParts};
pub use store_type::StoreType;
pub use validation::{ConfigResult, ConfigurationError};
