//! Signing certificate model, parsing, and leaf checks.
//!
//! Only the leaf certificate is examined: its validity window and its
//! subject alternative name. No chain is walked.

use crate::clock::Clock;
use crate::VerificationError;
use chrono::{DateTime, Utc};
use std::net::{Ipv4Addr, Ipv6Addr};
use x509_parser::extensions::GeneralName;

/// Public key carried by a certificate, as a DER SubjectPublicKeyInfo.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKeyMaterial {
    spki_der: Vec<u8>,
}

impl PublicKeyMaterial {
    /// Wrap DER-encoded SubjectPublicKeyInfo bytes.
    pub fn from_spki_der(spki_der: Vec<u8>) -> Self {
        Self { spki_der }
    }

    /// The DER SubjectPublicKeyInfo.
    pub fn spki_der(&self) -> &[u8] {
        &self.spki_der
    }
}

impl std::fmt::Debug for PublicKeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PublicKeyMaterial({} bytes)", self.spki_der.len())
    }
}

/// The leaf certificate fields verification reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    /// Start of the validity window.
    pub not_before: DateTime<Utc>,
    /// End of the validity window.
    pub not_after: DateTime<Utc>,
    /// Subject alternative names, OpenSSL style: `DNS:a, DNS:b`.
    pub subject_alternative_name: String,
    /// Subject public key.
    pub public_key: PublicKeyMaterial,
}

/// Turns fetched certificate bytes into a [`Certificate`].
pub trait CertificateParser: Send + Sync {
    /// Parse the leaf certificate out of `bytes`.
    ///
    /// # Errors
    /// * `CertificateParseFailed` - Bytes are not a usable certificate
    fn parse(&self, bytes: &[u8]) -> Result<Certificate, VerificationError>;
}

/// `x509-parser` backed parser.
///
/// Accepts a PEM chain (the first block is the leaf) or a single DER
/// certificate.
#[derive(Debug, Clone, Copy, Default)]
pub struct X509CertificateParser;

impl CertificateParser for X509CertificateParser {
    fn parse(&self, bytes: &[u8]) -> Result<Certificate, VerificationError> {
        let der = if is_pem(bytes) {
            let (_, pem) = x509_parser::pem::parse_x509_pem(bytes)
                .map_err(|e| parse_failed(format!("invalid PEM: {}", e)))?;
            pem.contents
        } else {
            bytes.to_vec()
        };

        let (_, cert) = x509_parser::parse_x509_certificate(&der)
            .map_err(|e| parse_failed(format!("invalid X.509: {}", e)))?;

        let validity = cert.validity();
        let not_before = DateTime::from_timestamp(validity.not_before.timestamp(), 0)
            .ok_or_else(|| parse_failed("notBefore out of range"))?;
        let not_after = DateTime::from_timestamp(validity.not_after.timestamp(), 0)
            .ok_or_else(|| parse_failed("notAfter out of range"))?;

        let subject_alternative_name = match cert.subject_alternative_name() {
            Ok(Some(san)) => format_general_names(&san.value.general_names),
            Ok(None) => String::new(),
            Err(e) => return Err(parse_failed(format!("invalid subjectAltName: {}", e))),
        };

        Ok(Certificate {
            not_before,
            not_after,
            subject_alternative_name,
            public_key: PublicKeyMaterial::from_spki_der(cert.public_key().raw.to_vec()),
        })
    }
}

fn is_pem(bytes: &[u8]) -> bool {
    bytes.windows(10).any(|w| w == b"-----BEGIN")
}

fn parse_failed(msg: impl Into<String>) -> VerificationError {
    VerificationError::CertificateParseFailed(msg.into())
}

fn format_general_names(names: &[GeneralName<'_>]) -> String {
    names
        .iter()
        .filter_map(|name| match name {
            GeneralName::DNSName(dns) => Some(format!("DNS:{}", dns)),
            GeneralName::RFC822Name(email) => Some(format!("email:{}", email)),
            GeneralName::URI(uri) => Some(format!("URI:{}", uri)),
            GeneralName::IPAddress(ip) => format_ip(ip).map(|ip| format!("IP Address:{}", ip)),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_ip(bytes: &[u8]) -> Option<String> {
    match bytes.len() {
        4 => <[u8; 4]>::try_from(bytes).ok().map(|b| Ipv4Addr::from(b).to_string()),
        16 => <[u8; 16]>::try_from(bytes).ok().map(|b| Ipv6Addr::from(b).to_string()),
        _ => None,
    }
}

/// Check the certificate is currently valid.
///
/// # Errors
/// * `CertificateExpiredOrNotYetValid` - Now is outside `[not_before, not_after]`
pub fn check_validity_window<C: Clock + ?Sized>(
    certificate: &Certificate,
    clock: &C,
) -> Result<(), VerificationError> {
    let now = clock.now_utc();
    if now < certificate.not_before || now > certificate.not_after {
        return Err(VerificationError::CertificateExpiredOrNotYetValid);
    }
    Ok(())
}

/// Check the certificate is bound to the expected signing identity.
///
/// # Errors
/// * `CertificateIdentityMismatch` - SAN differs from `expected`
pub fn check_identity(certificate: &Certificate, expected: &str) -> Result<(), VerificationError> {
    if certificate.subject_alternative_name != expected {
        return Err(VerificationError::CertificateIdentityMismatch {
            found: certificate.subject_alternative_name.clone(),
        });
    }
    Ok(())
}
