//! Minimal X.509 inspection for logging and diagnostics

use der::Decode;
use der::asn1::{Ia5StringRef, ObjectIdentifier, PrintableStringRef, Utf8StringRef};
use rustls::pki_types::CertificateDer;
use x509_cert::Certificate;
use x509_cert::name::Name;

/// commonName
const OID_CN: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.3");

/// Subject and issuer of a certificate, rendered as RFC 4514 strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateSummary {
    pub subject: String,
    pub issuer: String,
    pub common_name: Option<String>,
}

impl CertificateSummary {
    /// True when subject and issuer are the same name.
    #[must_use]
    pub fn is_self_issued(&self) -> bool {
        self.subject == self.issuer
    }
}

/// Parses just enough of `der` to describe it.
///
/// # Errors
///
/// Returns the DER error if the bytes are not an X.509 certificate.
pub fn summarize(der: &CertificateDer<'_>) -> Result<CertificateSummary, der::Error> {
    let certificate = Certificate::from_der(der.as_ref())?;
    let tbs = &certificate.tbs_certificate;

    Ok(CertificateSummary {
        subject: tbs.subject.to_string(),
        issuer: tbs.issuer.to_string(),
        common_name: common_name(&tbs.subject),
    })
}

fn common_name(name: &Name) -> Option<String> {
    name.0
        .iter()
        .flat_map(|rdn| rdn.0.iter())
        .filter(|atv| atv.oid == OID_CN)
        .find_map(|atv| {
            if let Ok(value) = Utf8StringRef::try_from(&atv.value) {
                Some(value.to_string())
            } else if let Ok(value) = PrintableStringRef::try_from(&atv.value) {
                Some(value.to_string())
            } else {
                Ia5StringRef::try_from(&atv.value).ok().map(|value| value.to_string())
            }
        })
}

/// Subject for log fields; never fails.
pub(crate) fn describe(der: &CertificateDer<'_>) -> String {
    match summarize(der) {
        Ok(summary) => summary.subject,
        Err(e) => format!("<unparsable certificate: {e}>"),
    }
}
