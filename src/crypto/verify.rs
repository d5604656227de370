//! RSA PKCS#1 v1.5 signature verification.

use crate::crypto::certificate::PublicKeyMaterial;
use crate::crypto::digest::DigestAlgorithm;
use crate::VerificationError;
use base64::{engine::general_purpose::STANDARD, Engine};
use rsa::pkcs1v15::{Signature, VerifyingKey};
use rsa::pkcs8::DecodePublicKey;
use rsa::signature::Verifier;
use rsa::RsaPublicKey;
use sha1::Sha1;
use sha2::Sha256;

/// Checks a detached signature over a message.
pub trait SignatureVerifier: Send + Sync {
    /// Return `true` only if `signature` is valid for `message` under
    /// `public_key` with the given digest.
    fn verify(
        &self,
        public_key: &PublicKeyMaterial,
        digest: DigestAlgorithm,
        message: &[u8],
        signature: &[u8],
    ) -> bool;
}

/// RSA PKCS#1 v1.5 verifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct RsaSignatureVerifier;

impl SignatureVerifier for RsaSignatureVerifier {
    fn verify(
        &self,
        public_key: &PublicKeyMaterial,
        digest: DigestAlgorithm,
        message: &[u8],
        signature: &[u8],
    ) -> bool {
        let key = match RsaPublicKey::from_public_key_der(public_key.spki_der()) {
            Ok(key) => key,
            Err(e) => {
                tracing::debug!(error = %e, "certificate key is not an RSA public key");
                return false;
            }
        };

        let Ok(signature) = Signature::try_from(signature) else {
            return false;
        };

        let result = match digest {
            DigestAlgorithm::Sha1 => VerifyingKey::<Sha1>::new(key).verify(message, &signature),
            DigestAlgorithm::Sha256 => VerifyingKey::<Sha256>::new(key).verify(message, &signature),
        };

        result.is_ok()
    }
}

/// Decode a base64 signature.
///
/// Surrounding whitespace is ignored; anything else that is not standard
/// base64 counts as an invalid signature.
pub fn decode_signature(signature_b64: &str) -> Result<Vec<u8>, VerificationError> {
    STANDARD
        .decode(signature_b64.trim())
        .map_err(|_| VerificationError::InvalidSignature)
}
