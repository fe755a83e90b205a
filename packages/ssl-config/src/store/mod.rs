//! Trust and key store loading
//!
//! A store is read from disk exactly once per factory construction and decoded
//! according to its declared [`StoreType`]. The format is never sniffed: a JKS
//! file declared as PKCS12 fails with [`Kind::StoreFormat`](crate::Kind).

pub mod jks;
pub mod pkcs12;

use std::collections::{BTreeMap, btree_map};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use rustls::pki_types::CertificateDer;
use zeroize::Zeroizing;

use crate::config::StoreType;
use crate::error::{self, Result};

/// A single entry of a loaded store.
#[derive(Clone)]
pub enum StoreEntry {
    /// A CA or peer certificate trusted on its own.
    TrustedCertificate(CertificateDer<'static>),
    /// A private key together with its certificate chain.
    PrivateKey(PrivateKeyEntry),
}

/// PKCS#8 private key bytes plus the certificate chain, leaf first.
#[derive(Clone)]
pub struct PrivateKeyEntry {
    key: Zeroizing<Vec<u8>>,
    chain: Vec<CertificateDer<'static>>,
}

impl PrivateKeyEntry {
    pub(crate) fn new(key: Zeroizing<Vec<u8>>, chain: Vec<CertificateDer<'static>>) -> Self {
        Self { key, chain }
    }

    /// DER-encoded PKCS#8 `PrivateKeyInfo`.
    #[must_use]
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    #[must_use]
    pub fn chain(&self) -> &[CertificateDer<'static>] {
        &self.chain
    }
}

impl fmt::Debug for PrivateKeyEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKeyEntry")
            .field("key", &"<redacted>")
            .field("chain_len", &self.chain.len())
            .finish()
    }
}

impl fmt::Debug for StoreEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreEntry::TrustedCertificate(der) => f
                .debug_tuple("TrustedCertificate")
                .field(&format_args!("{} bytes", der.len()))
                .finish(),
            StoreEntry::PrivateKey(entry) => f.debug_tuple("PrivateKey").field(entry).finish(),
        }
    }
}

/// Two entries whose aliases are equal ignoring case.
#[derive(Debug, thiserror::Error)]
#[error("alias '{0}' appears more than once (aliases are case-insensitive)")]
pub struct DuplicateAlias(String);

/// A decoded store, entries keyed by lower-cased alias.
#[derive(Debug, Clone)]
pub struct StoreHandle {
    path: PathBuf,
    store_type: StoreType,
    entries: BTreeMap<String, StoreEntry>,
}

impl StoreHandle {
    fn new(
        path: PathBuf,
        store_type: StoreType,
        decoded: Vec<(String, StoreEntry)>,
    ) -> std::result::Result<Self, DuplicateAlias> {
        let mut entries = BTreeMap::new();
        for (alias, entry) in decoded {
            match entries.entry(alias.to_lowercase()) {
                btree_map::Entry::Vacant(slot) => {
                    slot.insert(entry);
                }
                btree_map::Entry::Occupied(_) => return Err(DuplicateAlias(alias)),
            }
        }
        Ok(Self {
            path,
            store_type,
            entries,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn store_type(&self) -> StoreType {
        self.store_type
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Aliases in ascending order.
    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Looks up an entry, ignoring alias case.
    #[must_use]
    pub fn entry(&self, alias: &str) -> Option<&StoreEntry> {
        self.entries.get(&alias.to_lowercase())
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &StoreEntry)> {
        self.entries.iter().map(|(alias, entry)| (alias.as_str(), entry))
    }

    pub fn trusted_certificates(&self) -> impl Iterator<Item = (&str, &CertificateDer<'static>)> {
        self.entries().filter_map(|(alias, entry)| match entry {
            StoreEntry::TrustedCertificate(der) => Some((alias, der)),
            StoreEntry::PrivateKey(_) => None,
        })
    }

    pub fn private_keys(&self) -> impl Iterator<Item = (&str, &PrivateKeyEntry)> {
        self.entries().filter_map(|(alias, entry)| match entry {
            StoreEntry::PrivateKey(key) => Some((alias, key)),
            StoreEntry::TrustedCertificate(_) => None,
        })
    }
}

/// Reads and decodes the store at `path`.
///
/// Relative paths resolve against the working directory.
///
/// # Errors
///
/// - [`Kind::StoreNotFound`](crate::Kind::StoreNotFound) if the file does not exist
/// - [`Kind::StoreRead`](crate::Kind::StoreRead) for any other I/O failure
/// - [`Kind::StoreFormat`](crate::Kind::StoreFormat) if the bytes are not a
///   store of `store_type`
/// - [`Kind::StoreIntegrity`](crate::Kind::StoreIntegrity) if `password` is
///   wrong or the file was modified
pub fn load(path: &Path, store_type: StoreType, password: Option<&str>) -> Result<StoreHandle> {
    tracing::debug!(path = %path.display(), %store_type, "loading store");

    let data = Zeroizing::new(fs::read(path).map_err(|e| error::store_io(path, e))?);

    let decoded = match store_type {
        StoreType::Jks => jks::decode(&data, password).map_err(|e| {
            if e.is_integrity_failure() {
                error::store_integrity(path, e)
            } else {
                error::store_format(path, e)
            }
        })?,
        StoreType::Pkcs12 => pkcs12::decode(&data, password).map_err(|e| {
            if pkcs12::is_integrity_failure(&e) {
                error::store_integrity(path, e)
            } else {
                error::store_format(path, e)
            }
        })?,
    };

    let handle = StoreHandle::new(path.to_path_buf(), store_type, decoded)
        .map_err(|e| error::store_format(path, e))?;
    tracing::debug!(
        path = %path.display(),
        entries = handle.len(),
        "store loaded"
    );
    Ok(handle)
}
