//! Skillsentry error types.

use thiserror::Error;

/// Errors produced while retrieving certificate bytes.
///
/// `Clone` because a single fetch result is handed to every caller that
/// waited on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The request never produced a response (DNS, TLS, timeout, body read).
    #[error("certificate transport error: {0}")]
    Transport(String),

    /// The server answered with something other than 200 OK.
    #[error("invalid status code: {0}")]
    Status(u16),

    /// The fetch task ended without reporting a result.
    #[error("certificate fetch abandoned")]
    Abandoned,
}

/// Reasons a signed request is rejected.
///
/// Every variant is terminal at this layer. Use [`VerificationError::is_transient`]
/// to tell infrastructure trouble apart from a security rejection.
#[derive(Debug, Error)]
pub enum VerificationError {
    /// Configuration is invalid.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Body is missing `request` or a non-empty `request.type`.
    #[error("Invalid body: missing request type")]
    MalformedRequest,

    /// Application id is missing or not on the allow-list.
    #[error("Invalid session.application.applicationId")]
    UnauthorizedSender,

    /// Request timestamp is missing or outside the replay window.
    #[error("Invalid timestamp")]
    StaleOrFutureTimestamp,

    /// Certificate URL does not match the trusted pattern.
    #[error("Invalid SignatureCertChainUrl: {url}")]
    UntrustedCertificateSource {
        /// The rejected URL.
        url: String,
    },

    /// Certificate could not be retrieved.
    #[error("Certificate fetch failed: {0}")]
    CertificateFetchFailed(#[from] FetchError),

    /// Certificate bytes could not be parsed.
    #[error("Certificate parse failed: {0}")]
    CertificateParseFailed(String),

    /// Current time lies outside the certificate's validity window.
    #[error("Certificate expired or not yet valid")]
    CertificateExpiredOrNotYetValid,

    /// Certificate is not bound to the trusted signing identity.
    #[error("Certificate subject alternative name mismatch: {found}")]
    CertificateIdentityMismatch {
        /// The SAN value the certificate actually carries.
        found: String,
    },

    /// Signature does not verify over the request body.
    #[error("Invalid signature")]
    InvalidSignature,
}

impl VerificationError {
    /// Whether a retry of the whole request could succeed.
    ///
    /// Only certificate retrieval failures are transient; everything else
    /// means the request is not from the trusted sender.
    pub fn is_transient(&self) -> bool {
        matches!(self, VerificationError::CertificateFetchFailed(_))
    }
}
