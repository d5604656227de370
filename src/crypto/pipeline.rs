//! Certificate trust and signature checks.
//!
//! Given the fetched certificate bytes:
//! 1. Parse the leaf certificate
//! 2. Check its validity window
//! 3. Check its subject alternative name
//! 4. Verify the signature over the signed message
//!
//! Steps 1-3 are [`trusted_certificate`], step 4 is [`check_signature`].
//! Callers run them in that order and build the signed message in between,
//! so no work is spent on a certificate that is already untrusted.

use crate::clock::Clock;
use crate::crypto::{
    certificate::{check_identity, check_validity_window, Certificate, CertificateParser},
    digest::DigestAlgorithm,
    verify::{decode_signature, SignatureVerifier},
};
use crate::VerificationError;

/// Parse the certificate and check it may sign for `certificate_identity`.
///
/// # Returns
/// * `Ok(certificate)` - Certificate is trusted
/// * `Err(CertificateParseFailed)` - Bytes are not a certificate
/// * `Err(CertificateExpiredOrNotYetValid)` - Outside validity window
/// * `Err(CertificateIdentityMismatch)` - Wrong SAN
pub fn trusted_certificate(
    certificate_bytes: &[u8],
    certificate_identity: &str,
    parser: &dyn CertificateParser,
    clock: &dyn Clock,
) -> Result<Certificate, VerificationError> {
    let certificate = parser.parse(certificate_bytes)?;
    check_validity_window(&certificate, clock)?;
    check_identity(&certificate, certificate_identity)?;
    Ok(certificate)
}

/// Verify a base64 signature over `message` with the certificate's key.
///
/// # Errors
/// * `InvalidSignature` - Bad base64 or signature mismatch
pub fn check_signature(
    certificate: &Certificate,
    signature_b64: &str,
    message: &[u8],
    digest_algorithm: DigestAlgorithm,
    verifier: &dyn SignatureVerifier,
) -> Result<(), VerificationError> {
    let signature = decode_signature(signature_b64)?;
    if !verifier.verify(&certificate.public_key, digest_algorithm, message, &signature) {
        return Err(VerificationError::InvalidSignature);
    }
    Ok(())
}
