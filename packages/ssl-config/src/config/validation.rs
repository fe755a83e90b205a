//! Configuration invariants
//!
//! Structural checks only. Nothing in here touches the filesystem, so a
//! `ConfigurationError` always means the configuration itself is wrong.

/// Configuration validation result type
pub type ConfigResult<T> = Result<T, ConfigurationError>;

/// Which configuration invariant was violated
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigurationError {
    #[error("trustStorePath is required")]
    MissingTrustStorePath,

    #[error(
        "keyStorePath and keyStorePassword must both be present or both be absent \
         (keyStorePath {}, keyStorePassword {})",
        presence(.key_store_path),
        presence(.key_store_password)
    )]
    KeyStorePasswordMismatch {
        key_store_path: bool,
        key_store_password: bool,
    },

    #[error("keyStorePath must be present if keyStoreKeyAlias is present")]
    KeyAliasWithoutKeyStorePath,

    #[error("unsupported store type '{0}', expected JKS or PKCS12")]
    UnknownStoreType(String),
}

fn presence(present: &bool) -> &'static str {
    if *present { "present" } else { "absent" }
}

/// Checks the key store invariants given which optional fields are set.
///
/// # Errors
///
/// Returns `ConfigurationError::KeyStorePasswordMismatch` if exactly one of
/// the key store path and password is set, and
/// `ConfigurationError::KeyAliasWithoutKeyStorePath` if an alias is set
/// without a key store path. The pairing check runs first.
pub fn validate_key_store(
    has_path: bool,
    has_password: bool,
    has_alias: bool,
) -> ConfigResult<()> {
    if has_path != has_password {
        return Err(ConfigurationError::KeyStorePasswordMismatch {
            key_store_path: has_path,
            key_store_password: has_password,
        });
    }

    if has_alias && !has_path {
        return Err(ConfigurationError::KeyAliasWithoutKeyStorePath);
    }

    Ok(())
}
