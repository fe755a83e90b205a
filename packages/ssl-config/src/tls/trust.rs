//! Trust anchor resolution

use rustls::pki_types::CertificateDer;

use super::certificate;
use crate::store::StoreHandle;

/// The certificates a client accepts as roots when verifying a server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrustAnchors {
    certificates: Vec<CertificateDer<'static>>,
}

impl TrustAnchors {
    #[must_use]
    pub fn len(&self) -> usize {
        self.certificates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.certificates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CertificateDer<'static>> {
        self.certificates.iter()
    }

    /// True if a certificate with exactly these DER bytes is an anchor.
    #[must_use]
    pub fn contains(&self, der: &[u8]) -> bool {
        self.certificates.iter().any(|c| c.as_ref() == der)
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<CertificateDer<'static>> {
        self.certificates
    }
}

impl IntoIterator for TrustAnchors {
    type Item = CertificateDer<'static>;
    type IntoIter = std::vec::IntoIter<CertificateDer<'static>>;

    fn into_iter(self) -> Self::IntoIter {
        self.certificates.into_iter()
    }
}

/// Collects every trusted-certificate entry of `handle`. Certificates that
/// only appear in a private key's chain are not anchors.
pub fn resolve_trust(handle: &StoreHandle) -> TrustAnchors {
    let certificates: Vec<_> = handle
        .trusted_certificates()
        .map(|(alias, der)| {
            tracing::debug!(
                alias,
                subject = %certificate::describe(der),
                "trust anchor"
            );
            der.clone()
        })
        .collect();

    if certificates.is_empty() {
        tracing::warn!(
            path = %handle.path().display(),
            "trust store holds no trusted certificates, no server will be trusted"
        );
    }

    TrustAnchors { certificates }
}
