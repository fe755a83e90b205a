//! Client key material resolution

use std::fmt;

use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use zeroize::Zeroizing;

use super::certificate::{self, CertificateSummary};
use crate::error::{self, Result};
use crate::store::{PrivateKeyEntry, StoreEntry, StoreHandle};

/// The client identity presented during mutual TLS. Key bytes are wiped on
/// drop.
#[derive(Clone)]
pub struct KeyMaterial {
    alias: String,
    key: Zeroizing<Vec<u8>>,
    chain: Vec<CertificateDer<'static>>,
}

impl KeyMaterial {
    fn from_entry(alias: &str, entry: &PrivateKeyEntry) -> Self {
        Self {
            alias: alias.to_string(),
            key: Zeroizing::new(entry.key().to_vec()),
            chain: entry.chain().to_vec(),
        }
    }

    #[cfg(test)]
    pub(crate) fn from_parts(alias: &str, key: Vec<u8>, chain: Vec<CertificateDer<'static>>) -> Self {
        Self {
            alias: alias.to_string(),
            key: Zeroizing::new(key),
            chain,
        }
    }

    /// The alias the key was selected by.
    #[must_use]
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// DER-encoded PKCS#8 private key.
    #[must_use]
    pub fn key_der(&self) -> &[u8] {
        &self.key
    }

    /// Certificate chain, leaf first.
    #[must_use]
    pub fn certificate_chain(&self) -> &[CertificateDer<'static>] {
        &self.chain
    }

    #[must_use]
    pub fn leaf(&self) -> Option<&CertificateDer<'static>> {
        self.chain.first()
    }

    /// Subject and issuer of the leaf certificate.
    #[must_use]
    pub fn leaf_summary(&self) -> Option<CertificateSummary> {
        self.leaf().and_then(|leaf| certificate::summarize(leaf).ok())
    }

    /// A copy of the key in the form rustls consumes.
    #[must_use]
    pub fn private_key(&self) -> PrivateKeyDer<'static> {
        PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(self.key.to_vec()))
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("alias", &self.alias)
            .field("key", &"<redacted>")
            .field("chain_len", &self.chain.len())
            .finish()
    }
}

/// Picks the client key out of a loaded key store.
///
/// With an alias, the entry with that alias (compared case-insensitively)
/// must be a private key. Without one, the store must hold at most one
/// private key; a store with none yields `Ok(None)`.
///
/// # Errors
///
/// - [`Kind::AliasNotFound`](crate::Kind::AliasNotFound) if `alias` names no
///   private key
/// - [`Kind::AmbiguousKey`](crate::Kind::AmbiguousKey) if no alias is given and
///   several private keys are present
pub fn resolve_key(handle: &StoreHandle, alias: Option<&str>) -> Result<Option<KeyMaterial>> {
    if let Some(alias) = alias {
        return match handle.entry(alias) {
            Some(StoreEntry::PrivateKey(entry)) => {
                tracing::debug!(alias, path = %handle.path().display(), "selected client key");
                Ok(Some(KeyMaterial::from_entry(alias, entry)))
            }
            _ => Err(error::alias_not_found(handle.path(), alias)),
        };
    }

    let keys: Vec<_> = handle.private_keys().collect();
    match keys.as_slice() {
        [] => {
            tracing::warn!(
                path = %handle.path().display(),
                "key store holds no private key, continuing without a client certificate"
            );
            Ok(None)
        }
        [(alias, entry)] => {
            tracing::debug!(alias, path = %handle.path().display(), "selected only client key");
            Ok(Some(KeyMaterial::from_entry(alias, entry)))
        }
        several => {
            let aliases: Vec<&str> = several.iter().map(|(alias, _)| *alias).collect();
            Err(error::ambiguous_key(handle.path(), &aliases))
        }
    }
}
