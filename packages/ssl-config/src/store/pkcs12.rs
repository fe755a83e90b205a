//! PKCS#12 stores
//!
//! Stores opened with a password go through `p12-keystore`, which checks the
//! MAC and decrypts every bag. Without a password the MAC is not verified:
//! only plaintext certificate bags marked as trusted are read, and encrypted
//! safes are skipped.

use der::asn1::{BmpString, ContextSpecific, ObjectIdentifier, OctetString};
use der::{Decode, Encode};
use p12_keystore::error::Error as Pkcs12Error;
use p12_keystore::{KeyStore, KeyStoreEntry};
use pkcs12::authenticated_safe::AuthenticatedSafe;
use pkcs12::cert_type::CertBag;
use pkcs12::pfx::Pfx;
use pkcs12::safe_bag::{SafeBag, SafeContents};
use rustls::pki_types::CertificateDer;
use zeroize::Zeroizing;

use super::{PrivateKeyEntry, StoreEntry};
use crate::tls::certificate;

const ID_DATA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.7.1");
const ID_ENCRYPTED_DATA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.7.6");
const FRIENDLY_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.20");
const X509_CERTIFICATE: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.22.1");
const ORACLE_TRUSTED_KEY_USAGE: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("2.16.840.1.113894.746875.1.1");

/// Decodes a PKCS#12 container.
///
/// # Errors
///
/// Returns the underlying `p12_keystore` error; use [`is_integrity_failure`]
/// to tell a wrong password apart from malformed data.
pub fn decode(data: &[u8], password: Option<&str>) -> Result<Vec<(String, StoreEntry)>, Pkcs12Error> {
    match password {
        Some(password) => decode_protected(data, password),
        None => decode_unprotected(data),
    }
}

fn decode_protected(data: &[u8], password: &str) -> Result<Vec<(String, StoreEntry)>, Pkcs12Error> {
    let keystore = KeyStore::from_pkcs12(data, password)?;

    let mut entries = Vec::with_capacity(keystore.entries_count());
    for (alias, entry) in keystore.entries() {
        match entry {
            KeyStoreEntry::Certificate(certificate) => {
                let der = CertificateDer::from(certificate.as_der().to_vec());
                entries.push((alias.clone(), StoreEntry::TrustedCertificate(der)));
            }
            KeyStoreEntry::PrivateKeyChain(chain) => {
                let key = Zeroizing::new(chain.key().to_vec());
                let certificates = chain
                    .chain()
                    .iter()
                    .map(|certificate| CertificateDer::from(certificate.as_der().to_vec()))
                    .collect();
                entries.push((
                    alias.clone(),
                    StoreEntry::PrivateKey(PrivateKeyEntry::new(key, certificates)),
                ));
            }
            KeyStoreEntry::Secret(_) => {
                tracing::debug!(alias = %alias, "ignoring PKCS#12 secret key entry");
            }
        }
    }

    Ok(entries)
}

/// Reads the trusted certificates of a store without verifying its MAC.
fn decode_unprotected(data: &[u8]) -> Result<Vec<(String, StoreEntry)>, Pkcs12Error> {
    let pfx = Pfx::from_der(data)?;
    if pfx.auth_safe.content_type != ID_DATA {
        return Err(Pkcs12Error::UnsupportedContentType);
    }
    if pfx.mac_data.is_some() {
        tracing::debug!("no password given, PKCS#12 MAC not verified");
    }

    let content = OctetString::from_der(&pfx.auth_safe.content.to_der()?)?;
    let safes = AuthenticatedSafe::from_der(content.as_bytes())?;

    let mut entries = Vec::new();
    for safe in safes {
        match safe.content_type {
            ID_DATA => {
                let bags = OctetString::from_der(&safe.content.to_der()?)?;
                for bag in SafeContents::from_der(bags.as_bytes())? {
                    if let Some(entry) = trusted_certificate(&bag)? {
                        entries.push(entry);
                    }
                }
            }
            ID_ENCRYPTED_DATA => {
                tracing::warn!("skipping encrypted PKCS#12 safe, a password is needed to read it");
            }
            _ => return Err(Pkcs12Error::UnsupportedContentType),
        }
    }

    Ok(entries)
}

fn trusted_certificate(bag: &SafeBag) -> Result<Option<(String, StoreEntry)>, Pkcs12Error> {
    if bag.bag_id != pkcs12::PKCS_12_CERT_BAG_OID {
        tracing::debug!(bag = %bag.bag_id, "skipping PKCS#12 bag without a password");
        return Ok(None);
    }
    if attribute(bag, ORACLE_TRUSTED_KEY_USAGE).is_none() {
        return Ok(None);
    }

    let cert_bag: ContextSpecific<CertBag> = ContextSpecific::from_der(&bag.bag_value)?;
    if cert_bag.value.cert_id != X509_CERTIFICATE {
        return Err(Pkcs12Error::UnsupportedCertificateType);
    }

    let der = CertificateDer::from(cert_bag.value.cert_value.as_bytes().to_vec());
    let alias = attribute(bag, FRIENDLY_NAME)
        .and_then(|value| BmpString::from_der(&value).ok())
        .map_or_else(|| certificate::describe(&der), |name| name.to_string());

    Ok(Some((alias, StoreEntry::TrustedCertificate(der))))
}

/// DER of the first value of the bag attribute `oid`.
fn attribute(bag: &SafeBag, oid: ObjectIdentifier) -> Option<Vec<u8>> {
    bag.bag_attributes
        .as_ref()?
        .iter()
        .find(|attribute| attribute.oid == oid)
        .and_then(|attribute| attribute.values.iter().next())
        .and_then(|value| value.to_der().ok())
}

/// True when decoding failed because the MAC or a decryption step rejected
/// the password, rather than because the data is not PKCS#12.
#[must_use]
pub fn is_integrity_failure(error: &Pkcs12Error) -> bool {
    matches!(
        error,
        Pkcs12Error::MacError(_) | Pkcs12Error::UnpadError | Pkcs12Error::Pkcs5Error(_)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const SERVER: &[u8] = include_bytes!("../../tests/resources/testServer/serverKeyStore.p12");
    const TRUST_STORE: &[u8] = include_bytes!("../../tests/resources/testCA/testCATrustStore.p12");
    const SERVER_JKS: &[u8] = include_bytes!("../../tests/resources/testServer/serverKeyStore.jks");
    const MAC_TRUST_STORE: &[u8] = include_bytes!("../../tests/resources/testCA/testCATrustStoreMac.p12");
    const ENCRYPTED_TRUST_STORE: &[u8] =
        include_bytes!("../../tests/resources/testCA/testCATrustStoreEncrypted.p12");
    const CA_DER: &[u8] = include_bytes!("../../tests/resources/testCA/testCA.der");

    #[test]
    fn decodes_key_entry_with_chain() {
        let entries = decode(SERVER, Some("serverStore")).unwrap();

        assert_eq!(entries.len(), 1);
        let (alias, StoreEntry::PrivateKey(key)) = &entries[0] else {
            panic!("expected a private key entry");
        };
        assert_eq!(alias, "server");
        assert_eq!(key.chain().len(), 2);
    }

    #[test]
    fn wrong_password_is_an_integrity_failure() {
        let err = decode(SERVER, Some("a")).unwrap_err();
        assert!(is_integrity_failure(&err), "{err:?}");
    }

    #[test]
    fn jks_data_is_not_an_integrity_failure() {
        let err = decode(SERVER_JKS, Some("serverStore")).unwrap_err();
        assert!(!is_integrity_failure(&err), "{err:?}");
    }

    #[test]
    fn unprotected_trust_store_opens_without_password() {
        let entries = decode(TRUST_STORE, None).unwrap();

        assert_eq!(entries.len(), 1);
        assert!(matches!(entries[0].1, StoreEntry::TrustedCertificate(_)));
    }

    #[test]
    fn mac_is_not_checked_without_password() {
        let entries = decode(MAC_TRUST_STORE, None).unwrap();

        assert_eq!(entries.len(), 1);
        let (alias, StoreEntry::TrustedCertificate(der)) = &entries[0] else {
            panic!("expected a trusted certificate entry");
        };
        assert_eq!(alias, "testca");
        assert_eq!(der.as_ref(), CA_DER);
    }

    #[test]
    fn mac_is_checked_with_password() {
        assert_eq!(decode(MAC_TRUST_STORE, Some("caStore")).unwrap().len(), 1);

        let err = decode(MAC_TRUST_STORE, Some("a")).unwrap_err();
        assert!(is_integrity_failure(&err), "{err:?}");
    }

    #[test]
    fn encrypted_safes_are_skipped_without_password() {
        assert!(decode(ENCRYPTED_TRUST_STORE, None).unwrap().is_empty());
        // the key bag needs a password and the certificates sit in an encrypted safe
        assert!(decode(SERVER, None).unwrap().is_empty());
    }

    #[test]
    fn jks_data_without_password_is_malformed() {
        let err = decode(SERVER_JKS, None).unwrap_err();
        assert!(!is_integrity_failure(&err), "{err:?}");
    }
}
