//! SSL configuration value object
//!
//! An `SslConfiguration` can only be obtained through
//! [`SslConfiguration::try_from_parts`] (directly, through
//! [`SslConfigurationParts::build`], or through serde), so every instance in
//! circulation satisfies the key store invariants.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use zeroize::Zeroizing;

use super::store_type::StoreType;
use super::validation::{ConfigResult, ConfigurationError, validate_key_store};

/// Where to find trust material and, optionally, the client identity for
/// mutual TLS.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "SslConfigurationParts")]
pub struct SslConfiguration {
    trust_store_path: PathBuf,
    trust_store_type: StoreType,
    key_store: Option<KeyStoreConfiguration>,
}

/// The key store half of an `SslConfiguration`. Path and password always
/// travel together.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyStoreConfiguration {
    path: PathBuf,
    store_type: StoreType,
    password: Zeroizing<String>,
    key_alias: Option<String>,
}

impl SslConfiguration {
    /// A trust-only configuration reading a JKS trust store.
    pub fn new(trust_store_path: impl Into<PathBuf>) -> Self {
        Self {
            trust_store_path: trust_store_path.into(),
            trust_store_type: StoreType::default(),
            key_store: None,
        }
    }

    /// Starts collecting fields for a configuration.
    #[must_use]
    pub fn builder() -> SslConfigurationParts {
        SslConfigurationParts::default()
    }

    /// Validates the collected fields and produces a configuration.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` naming the violated invariant:
    /// - the trust store path is missing
    /// - only one of key store path and key store password is set
    /// - a key alias is set without a key store path
    pub fn try_from_parts(parts: SslConfigurationParts) -> ConfigResult<Self> {
        let SslConfigurationParts {
            trust_store_path,
            trust_store_type,
            key_store_path,
            key_store_type,
            key_store_password,
            key_store_key_alias,
        } = parts;

        let trust_store_path = trust_store_path.ok_or(ConfigurationError::MissingTrustStorePath)?;

        validate_key_store(
            key_store_path.is_some(),
            key_store_password.is_some(),
            key_store_key_alias.is_some(),
        )?;

        let key_store = match (key_store_path, key_store_password) {
            (Some(path), Some(password)) => Some(KeyStoreConfiguration {
                path,
                store_type: key_store_type.unwrap_or_default(),
                password,
                key_alias: key_store_key_alias,
            }),
            _ => None,
        };

        Ok(Self {
            trust_store_path,
            trust_store_type: trust_store_type.unwrap_or_default(),
            key_store,
        })
    }

    #[must_use]
    pub fn trust_store_path(&self) -> &Path {
        &self.trust_store_path
    }

    #[must_use]
    pub fn trust_store_type(&self) -> StoreType {
        self.trust_store_type
    }

    /// The key store settings, present only for mutual TLS.
    #[must_use]
    pub fn key_store(&self) -> Option<&KeyStoreConfiguration> {
        self.key_store.as_ref()
    }

    #[must_use]
    pub fn key_store_path(&self) -> Option<&Path> {
        self.key_store.as_ref().map(KeyStoreConfiguration::path)
    }

    /// The key store type, defaulting to JKS when no key store is configured.
    #[must_use]
    pub fn key_store_type(&self) -> StoreType {
        self.key_store
            .as_ref()
            .map(KeyStoreConfiguration::store_type)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn key_store_password(&self) -> Option<&str> {
        self.key_store.as_ref().map(KeyStoreConfiguration::password)
    }

    #[must_use]
    pub fn key_store_key_alias(&self) -> Option<&str> {
        self.key_store.as_ref().and_then(KeyStoreConfiguration::key_alias)
    }
}

impl KeyStoreConfiguration {
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn store_type(&self) -> StoreType {
        self.store_type
    }

    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }

    #[must_use]
    pub fn key_alias(&self) -> Option<&str> {
        self.key_alias.as_deref()
    }
}

impl TryFrom<SslConfigurationParts> for SslConfiguration {
    type Error = ConfigurationError;

    fn try_from(parts: SslConfigurationParts) -> Result<Self, Self::Error> {
        Self::try_from_parts(parts)
    }
}

impl fmt::Debug for SslConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SslConfiguration")
            .field("trust_store_path", &self.trust_store_path)
            .field("trust_store_type", &self.trust_store_type)
            .field("key_store", &self.key_store)
            .finish()
    }
}

impl fmt::Debug for KeyStoreConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyStoreConfiguration")
            .field("path", &self.path)
            .field("store_type", &self.store_type)
            .field("password", &"<redacted>")
            .field("key_alias", &self.key_alias)
            .finish()
    }
}

/// Unvalidated configuration fields, in the shape they appear in
/// configuration files.
///
/// Setters consume and return the value so fields can be supplied in any
/// order; [`build`](Self::build) is the only way out.
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SslConfigurationParts {
    trust_store_path: Option<PathBuf>,
    trust_store_type: Option<StoreType>,
    key_store_path: Option<PathBuf>,
    key_store_type: Option<StoreType>,
    key_store_password: Option<Zeroizing<String>>,
    key_store_key_alias: Option<String>,
}

impl SslConfigurationParts {
    #[must_use]
    pub fn trust_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.trust_store_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn trust_store_type(mut self, store_type: StoreType) -> Self {
        self.trust_store_type = Some(store_type);
        self
    }

    #[must_use]
    pub fn key_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.key_store_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn key_store_type(mut self, store_type: StoreType) -> Self {
        self.key_store_type = Some(store_type);
        self
    }

    #[must_use]
    pub fn key_store_password(mut self, password: impl Into<String>) -> Self {
        self.key_store_password = Some(Zeroizing::new(password.into()));
        self
    }

    #[must_use]
    pub fn key_store_key_alias(mut self, alias: impl Into<String>) -> Self {
        self.key_store_key_alias = Some(alias.into());
        self
    }

    /// Validates the fields. See [`SslConfiguration::try_from_parts`].
    ///
    /// # Errors
    ///
    /// Returns the `ConfigurationError` for the first violated invariant.
    pub fn build(self) -> ConfigResult<SslConfiguration> {
        SslConfiguration::try_from_parts(self)
    }
}

impl fmt::Debug for SslConfigurationParts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SslConfigurationParts")
            .field("trust_store_path", &self.trust_store_path)
            .field("trust_store_type", &self.trust_store_type)
            .field("key_store_path", &self.key_store_path)
            .field("key_store_type", &self.key_store_type)
            .field(
                "key_store_password",
                &self.key_store_password.as_ref().map(|_| "<redacted>"),
            )
            .field("key_store_key_alias", &self.key_store_key_alias)
            .finish()
    }
}
