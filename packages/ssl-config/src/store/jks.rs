//! Java KeyStore (JKS) container codec
//!
//! Layout, all integers big-endian:
//!
//! ```text
//! magic u32 = 0xFEEDFEED | version u32 (1 or 2) | count u32
//! count x entry:
//!   tag u32 | alias utf | timestamp i64 | ...
//!   tag 1 (private key): protected key blob | chain count u32 | chain x certificate
//!   tag 2 (trusted certificate): certificate
//! certificate: [version 2: type utf] | length u32 | DER bytes
//! SHA-1(password as UTF-16BE || "Mighty Aphrodite" || everything above)
//! ```
//!
//! `utf` is a u16 length followed by that many bytes of (modified) UTF-8.

use der::asn1::{ObjectIdentifier, OctetString};
use der::{Decode, Reader, SliceReader};
use ring::digest;
use rustls::pki_types::CertificateDer;
use spki::AlgorithmIdentifierOwned;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use super::{PrivateKeyEntry, StoreEntry};

const MAGIC: u32 = 0xFEED_FEED;
const DIGEST_LEN: usize = 20;
const SALT_LEN: usize = 20;
const INTEGRITY_WHITENER: &[u8] = b"Mighty Aphrodite";
const X509: &str = "X.509";

const TAG_PRIVATE_KEY: u32 = 1;
const TAG_TRUSTED_CERTIFICATE: u32 = 2;

/// Sun's proprietary key protection algorithm.
const KEY_PROTECTOR_OID: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.4.1.42.2.17.1.1");

/// Failures decoding a JKS container
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum JksError {
    #[error("Invalid keystore format: expected magic 0xfeedfeed, found {0:#010x}")]
    InvalidMagic(u32),

    #[error("unsupported keystore version {0}")]
    UnsupportedVersion(u32),

    #[error("keystore data ends unexpectedly")]
    Truncated,

    #[error("unrecognized keystore entry tag {0}")]
    UnknownEntryTag(u32),

    #[error("unsupported certificate type {0}")]
    UnsupportedCertificateType(String),

    #[error("alias is not valid modified UTF-8")]
    InvalidAlias,

    #[error("{0} unexpected bytes after the last keystore entry")]
    TrailingData(usize),

    #[error("Keystore was tampered with, or password was incorrect")]
    IntegrityCheckFailed,

    #[error("Cannot recover key for alias {0}")]
    UnrecoverableKey(String),

    #[error("unsupported key protection algorithm {0}")]
    UnsupportedKeyProtection(ObjectIdentifier),

    #[error("malformed protected key")]
    MalformedKey(#[from] der::Error),
}

impl JksError {
    /// True when the failure means the password is wrong or the data was
    /// modified, as opposed to the data not being a JKS store at all.
    #[must_use]
    pub fn is_integrity_failure(&self) -> bool {
        matches!(
            self,
            JksError::IntegrityCheckFailed | JksError::UnrecoverableKey(_)
        )
    }
}

/// Decodes a JKS container.
///
/// With a password, the integrity digest is verified before anything else and
/// private keys are recovered. Without one, the digest is not checked and
/// private key entries are skipped, since they cannot be recovered.
///
/// # Errors
///
/// Returns `JksError` if the data is not a JKS store, is truncated, fails its
/// integrity check, or holds a key that cannot be recovered with `password`.
pub fn decode(data: &[u8], password: Option<&str>) -> Result<Vec<(String, StoreEntry)>, JksError> {
    let magic = Cursor::new(data).read_u32()?;
    if magic != MAGIC {
        return Err(JksError::InvalidMagic(magic));
    }

    let body_len = data
        .len()
        .checked_sub(DIGEST_LEN)
        .ok_or(JksError::Truncated)?;
    let (body, stored_digest) = data.split_at(body_len);

    let password = password.map(password_bytes);
    if let Some(ref password) = password {
        verify_integrity(body, stored_digest, password)?;
    }

    let mut cursor = Cursor::new(body);
    cursor.read_u32()?;
    let version = cursor.read_u32()?;
    if version != 1 && version != 2 {
        return Err(JksError::UnsupportedVersion(version));
    }

    let count = cursor.read_u32()?;
    let mut entries = Vec::new();

    for _ in 0..count {
        let tag = cursor.read_u32()?;
        let alias = cursor.read_utf()?;
        // creation timestamp, unused
        cursor.read_bytes(8)?;

        match tag {
            TAG_PRIVATE_KEY => {
                let protected = cursor.read_blob()?;
                let chain_len = cursor.read_u32()?;
                let mut chain = Vec::new();
                for _ in 0..chain_len {
                    chain.push(cursor.read_certificate(version)?);
                }

                match password {
                    Some(ref password) => {
                        let key = recover_key(&alias, protected, password)?;
                        entries.push((alias, StoreEntry::PrivateKey(PrivateKeyEntry::new(key, chain))));
                    }
                    None => {
                        tracing::debug!(alias = %alias, "skipping JKS private key entry, no password supplied");
                    }
                }
            }
            TAG_TRUSTED_CERTIFICATE => {
                let certificate = cursor.read_certificate(version)?;
                entries.push((alias, StoreEntry::TrustedCertificate(certificate)));
            }
            other => return Err(JksError::UnknownEntryTag(other)),
        }
    }

    if cursor.remaining() != 0 {
        return Err(JksError::TrailingData(cursor.remaining()));
    }

    Ok(entries)
}

fn password_bytes(password: &str) -> Zeroizing<Vec<u8>> {
    Zeroizing::new(password.encode_utf16().flat_map(u16::to_be_bytes).collect())
}

fn sha1(parts: &[&[u8]]) -> digest::Digest {
    let mut context = digest::Context::new(&digest::SHA1_FOR_LEGACY_USE_ONLY);
    for part in parts {
        context.update(part);
    }
    context.finish()
}

fn verify_integrity(body: &[u8], stored: &[u8], password: &[u8]) -> Result<(), JksError> {
    let computed = sha1(&[password, INTEGRITY_WHITENER, body]);
    if bool::from(computed.as_ref().ct_eq(stored)) {
        Ok(())
    } else {
        Err(JksError::IntegrityCheckFailed)
    }
}

/// Undoes Sun's key protector: the payload is `salt || key xor stream ||
/// SHA-1(password || key)`, with the stream built from chained SHA-1 blocks
/// seeded by the salt.
fn recover_key(alias: &str, protected: &[u8], password: &[u8]) -> Result<Zeroizing<Vec<u8>>, JksError> {
    let mut reader = SliceReader::new(protected)?;
    let (algorithm, payload) = reader.sequence(|seq| {
        let algorithm = AlgorithmIdentifierOwned::decode(seq)?;
        let payload = OctetString::decode(seq)?;
        Ok((algorithm, payload))
    })?;
    reader.finish(())?;

    if algorithm.oid != KEY_PROTECTOR_OID {
        return Err(JksError::UnsupportedKeyProtection(algorithm.oid));
    }

    let payload = payload.as_bytes();
    if payload.len() < SALT_LEN + DIGEST_LEN {
        return Err(JksError::UnrecoverableKey(alias.to_string()));
    }
    let (salt, rest) = payload.split_at(SALT_LEN);
    let (encrypted, check) = rest.split_at(rest.len() - DIGEST_LEN);

    let mut key = Zeroizing::new(Vec::with_capacity(encrypted.len()));
    let mut block = salt.to_vec();
    for chunk in encrypted.chunks(DIGEST_LEN) {
        block = sha1(&[password, block.as_slice()]).as_ref().to_vec();
        key.extend(chunk.iter().zip(&block).map(|(c, k)| c ^ k));
    }

    let computed = sha1(&[password, key.as_slice()]);
    if bool::from(computed.as_ref().ct_eq(check)) {
        Ok(key)
    } else {
        Err(JksError::UnrecoverableKey(alias.to_string()))
    }
}

/// Bounds-checked big-endian reader over the store body.
struct Cursor<'a> {
    data: &'a [u8],
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    fn remaining(&self) -> usize {
        self.data.len()
    }

    fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], JksError> {
        if self.data.len() < len {
            return Err(JksError::Truncated);
        }
        let (head, tail) = self.data.split_at(len);
        self.data = tail;
        Ok(head)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], JksError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    fn read_u16(&mut self) -> Result<u16, JksError> {
        self.read_array().map(u16::from_be_bytes)
    }

    fn read_u32(&mut self) -> Result<u32, JksError> {
        self.read_array().map(u32::from_be_bytes)
    }

    fn read_utf(&mut self) -> Result<String, JksError> {
        let len = usize::from(self.read_u16()?);
        let bytes = self.read_bytes(len)?;
        decode_modified_utf8(bytes).ok_or(JksError::InvalidAlias)
    }

    fn read_blob(&mut self) -> Result<&'a [u8], JksError> {
        let len = usize::try_from(self.read_u32()?).map_err(|_| JksError::Truncated)?;
        self.read_bytes(len)
    }

    fn read_certificate(&mut self, version: u32) -> Result<CertificateDer<'static>, JksError> {
        if version == 2 {
            let certificate_type = self.read_utf()?;
            if certificate_type != X509 {
                return Err(JksError::UnsupportedCertificateType(certificate_type));
            }
        }
        Ok(CertificateDer::from(self.read_blob()?.to_vec()))
    }
}

/// Decodes Java's modified UTF-8: NUL as `C0 80` and supplementary
/// characters as two encoded surrogates.
fn decode_modified_utf8(bytes: &[u8]) -> Option<String> {
    let mut units = Vec::with_capacity(bytes.len());
    let mut iter = bytes.iter().copied();
    let continuation = |byte: Option<u8>| byte.filter(|b| b & 0xC0 == 0x80).map(|b| u16::from(b & 0x3F));

    while let Some(first) = iter.next() {
        let unit = match first {
            0x00..=0x7F => u16::from(first),
            0xC0..=0xDF => (u16::from(first & 0x1F) << 6) | continuation(iter.next())?,
            0xE0..=0xEF => {
                let high = continuation(iter.next())?;
                let low = continuation(iter.next())?;
                (u16::from(first & 0x0F) << 12) | (high << 6) | low
            }
            _ => return None,
        };
        units.push(unit);
    }

    String::from_utf16(&units).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRUST_STORE: &[u8] = include_bytes!("../../tests/resources/testCA/testCATrustStore.jks");
    const MULTIPLE: &[u8] = include_bytes!("../../tests/resources/multiple/multiple.jks");
    const SERVER_P12: &[u8] = include_bytes!("../../tests/resources/testServer/serverKeyStore.p12");
    const CA_DER: &[u8] = include_bytes!("../../tests/resources/testCA/testCA.der");

    #[test]
    fn decodes_trust_store_without_password() {
        let entries = decode(TRUST_STORE, None).unwrap();

        assert_eq!(entries.len(), 1);
        let (alias, entry) = &entries[0];
        assert_eq!(alias, "testca");
        match entry {
            StoreEntry::TrustedCertificate(der) => assert_eq!(der.as_ref(), CA_DER),
            StoreEntry::PrivateKey(_) => panic!("expected a trusted certificate"),
        }
    }

    #[test]
    fn verifies_trust_store_digest_with_password() {
        assert_eq!(decode(TRUST_STORE, Some("caStore")).unwrap().len(), 1);

        let err = decode(TRUST_STORE, Some("wrong")).unwrap_err();
        assert!(matches!(err, JksError::IntegrityCheckFailed));
        assert!(err.is_integrity_failure());
    }

    #[test]
    fn recovers_every_private_key() {
        let entries = decode(MULTIPLE, Some("multiple")).unwrap();

        let aliases: Vec<_> = entries.iter().map(|(alias, _)| alias.as_str()).collect();
        assert_eq!(aliases, ["client", "server"]);

        for (_, entry) in &entries {
            let StoreEntry::PrivateKey(key) = entry else {
                panic!("expected private key entries");
            };
            // PKCS#8 PrivateKeyInfo is a DER SEQUENCE
            assert_eq!(key.key()[0], 0x30);
            assert_eq!(key.chain().len(), 2);
        }
    }

    #[test]
    fn skips_private_keys_without_password() {
        assert!(decode(MULTIPLE, None).unwrap().is_empty());
    }

    #[test]
    fn rejects_other_container_formats() {
        let err = decode(SERVER_P12, None).unwrap_err();
        assert!(matches!(err, JksError::InvalidMagic(_)));
        assert!(!err.is_integrity_failure());
        assert!(err.to_string().contains("Invalid keystore format"));
    }

    #[test]
    fn detects_truncation() {
        let truncated = &TRUST_STORE[..40];
        assert!(matches!(decode(truncated, None), Err(JksError::Truncated)));
        assert!(matches!(decode(&TRUST_STORE[..3], None), Err(JksError::Truncated)));
    }

    #[test]
    fn detects_tampering() {
        let mut tampered = TRUST_STORE.to_vec();
        let index = tampered.len() - DIGEST_LEN - 1;
        tampered[index] ^= 0xff;

        let err = decode(&tampered, Some("caStore")).unwrap_err();
        assert!(matches!(err, JksError::IntegrityCheckFailed));
    }

    #[test]
    fn aliases_use_java_modified_utf8() {
        let read = |encoded: &[u8]| {
            let mut data = u16::try_from(encoded.len()).unwrap().to_be_bytes().to_vec();
            data.extend_from_slice(encoded);
            Cursor::new(&data).read_utf()
        };

        assert_eq!(read(b"client").unwrap(), "client");
        assert_eq!(read("clé".as_bytes()).unwrap(), "clé");
        assert_eq!(read(&[b'a', 0xC0, 0x80, b'b']).unwrap(), "a\0b");
        assert_eq!(read(&[0xED, 0xA0, 0xBD, 0xED, 0xB8, 0x80]).unwrap(), "\u{1F600}");
        assert!(matches!(read(&[0xF0, 0x9F, 0x98, 0x80]), Err(JksError::InvalidAlias)));
        assert!(matches!(read(&[0xED, 0xA0, 0xBD]), Err(JksError::InvalidAlias)));
    }

    #[test]
    fn key_with_wrong_password_is_unrecoverable() {
        let protected = {
            // re-run the recovery directly so the integrity digest does not
            // short-circuit the check
            let mut cursor = Cursor::new(&MULTIPLE[..MULTIPLE.len() - DIGEST_LEN]);
            cursor.read_bytes(16).unwrap();
            cursor.read_utf().unwrap();
            cursor.read_bytes(8).unwrap();
            cursor.read_blob().unwrap().to_vec()
        };

        let err = recover_key("client", &protected, &password_bytes("nope")).unwrap_err();
        assert!(matches!(err, JksError::UnrecoverableKey(ref alias) if alias == "client"));
        assert!(recover_key("client", &protected, &password_bytes("multiple")).is_ok());
    }
}
