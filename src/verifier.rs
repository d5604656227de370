//! Request Verifier - the main public API for Skillsentry.
//!
//! The `RequestVerifier` decides whether an inbound skill request really
//! comes from the platform:
//! - Local checks on the body (shape, sender, replay window)
//! - Certificate URL trust check
//! - Cached certificate retrieval
//! - Certificate and signature verification

use crate::cache::certs::CertificateCache;
use crate::client::http::{CertificateFetcher, HttpCertificateFetcher};
use crate::clock::{Clock, SystemClock};
use crate::config::VerifierConfig;
use crate::crypto::certificate::{CertificateParser, X509CertificateParser};
use crate::crypto::freshness::check_request_freshness;
use crate::crypto::pipeline::{check_signature, trusted_certificate};
use crate::crypto::signing::{CanonicalSerializer, CompactJsonSerializer};
use crate::crypto::verify::{RsaSignatureVerifier, SignatureVerifier};
use crate::policy::access::check_sender;
use crate::policy::source::TrustedSource;
use crate::protocol::models::RequestBody;
use crate::VerificationError;
use chrono::TimeDelta;
use std::borrow::Cow;
use std::sync::Arc;

/// Verifies signed skill requests.
///
/// Create one instance at startup and share it (it is `Send + Sync`); the
/// certificate cache inside is what makes repeated verification cheap.
pub struct RequestVerifier {
    config: VerifierConfig,
    trusted_source: TrustedSource,
    max_timestamp_skew: TimeDelta,
    clock: Arc<dyn Clock>,
    cache: CertificateCache,
    fetcher: Arc<dyn CertificateFetcher>,
    parser: Arc<dyn CertificateParser>,
    signature_verifier: Arc<dyn SignatureVerifier>,
    serializer: Arc<dyn CanonicalSerializer>,
}

impl RequestVerifier {
    /// Create a verifier with the default collaborators: HTTPS fetcher,
    /// X.509 parser, RSA verifier, compact JSON serializer, system clock.
    ///
    /// # Errors
    /// Returns an error if:
    /// - Configuration validation fails
    /// - HTTP client creation fails
    pub fn new(config: VerifierConfig) -> Result<Self, VerificationError> {
        Self::builder(config).build()
    }

    /// Start building a verifier with custom collaborators.
    pub fn builder(config: VerifierConfig) -> VerifierBuilder {
        VerifierBuilder {
            config,
            clock: None,
            fetcher: None,
            parser: None,
            signature_verifier: None,
            serializer: None,
        }
    }

    /// Verify a signed request.
    ///
    /// # Arguments
    /// * `source_url` - The `SignatureCertChainUrl` header
    /// * `signature_b64` - The `Signature` header (base64)
    /// * `body` - The parsed request body
    ///
    /// # Errors
    /// - `MalformedRequest` - Missing `request.type`
    /// - `UnauthorizedSender` - Application id missing or not allowed
    /// - `StaleOrFutureTimestamp` - Outside the replay window
    /// - `UntrustedCertificateSource` - Certificate URL not trusted
    /// - `CertificateFetchFailed` - Certificate could not be retrieved
    /// - `CertificateParseFailed` - Certificate unreadable
    /// - `CertificateExpiredOrNotYetValid` - Certificate outside validity
    /// - `CertificateIdentityMismatch` - Certificate not the platform's
    /// - `InvalidSignature` - Signature does not match the body
    pub async fn verify(
        &self,
        source_url: &str,
        signature_b64: &str,
        body: &RequestBody,
    ) -> Result<(), VerificationError> {
        self.run_pipeline(source_url, signature_b64, body, SignedMessage::Serialized)
            .await
    }

    /// Verify a request given its raw JSON body bytes.
    ///
    /// The signature is checked over `body` exactly as received; the parsed
    /// form is only used for the envelope checks.
    ///
    /// # Errors
    /// As [`RequestVerifier::verify`], plus `MalformedRequest` when `body`
    /// is not JSON.
    pub async fn verify_json(
        &self,
        source_url: &str,
        signature_b64: &str,
        body: &[u8],
    ) -> Result<(), VerificationError> {
        let parsed = RequestBody::from_slice(body)?;
        self.run_pipeline(source_url, signature_b64, &parsed, SignedMessage::Raw(body))
            .await
    }

    async fn run_pipeline(
        &self,
        source_url: &str,
        signature_b64: &str,
        body: &RequestBody,
        signed: SignedMessage<'_>,
    ) -> Result<(), VerificationError> {
        let envelope = body.envelope();

        // 1. Shape
        if envelope.request_type().is_none() {
            return Err(VerificationError::MalformedRequest);
        }

        // 2. Sender identity
        check_sender(envelope, self.config.application_id.as_ref())?;

        // 3. Replay window
        check_request_freshness(envelope, self.max_timestamp_skew, self.clock.as_ref())?;

        // 4. Certificate source; the normalized URL is the cache key
        let certificate_url = self.trusted_source.check(source_url)?;

        // 5. Certificate retrieval
        let certificate_bytes = self
            .cache
            .get_or_refresh(&certificate_url, &self.fetcher)
            .await?;

        // 6-8. Parse, validity window, identity
        let certificate = trusted_certificate(
            &certificate_bytes,
            &self.config.certificate_identity,
            self.parser.as_ref(),
            self.clock.as_ref(),
        )?;

        // 9. Signature
        let message = match signed {
            SignedMessage::Raw(bytes) => Cow::Borrowed(bytes),
            SignedMessage::Serialized => Cow::Owned(self.serializer.canonical_bytes(body)?),
        };
        check_signature(
            &certificate,
            signature_b64,
            &message,
            self.config.digest_algorithm,
            self.signature_verifier.as_ref(),
        )
    }

    /// The certificate cache.
    pub fn cache(&self) -> &CertificateCache {
        &self.cache
    }

    /// Get the current configuration.
    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }
}

/// Source of the bytes the signature covers.
enum SignedMessage<'a> {
    /// The body as received on the wire.
    Raw(&'a [u8]),
    /// The parsed body, re-serialized.
    Serialized,
}

impl std::fmt::Debug for RequestVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestVerifier")
            .field("config", &self.config)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

/// Builder for [`RequestVerifier`]. Unset collaborators get the defaults.
pub struct VerifierBuilder {
    config: VerifierConfig,
    clock: Option<Arc<dyn Clock>>,
    fetcher: Option<Arc<dyn CertificateFetcher>>,
    parser: Option<Arc<dyn CertificateParser>>,
    signature_verifier: Option<Arc<dyn SignatureVerifier>>,
    serializer: Option<Arc<dyn CanonicalSerializer>>,
}

impl VerifierBuilder {
    /// Time source for freshness, certificate validity and cache ageing.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Certificate fetcher.
    pub fn fetcher(mut self, fetcher: Arc<dyn CertificateFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Certificate parser.
    pub fn parser(mut self, parser: Arc<dyn CertificateParser>) -> Self {
        self.parser = Some(parser);
        self
    }

    /// Signature verification primitive.
    pub fn signature_verifier(mut self, verifier: Arc<dyn SignatureVerifier>) -> Self {
        self.signature_verifier = Some(verifier);
        self
    }

    /// Signed-message serializer.
    pub fn serializer(mut self, serializer: Arc<dyn CanonicalSerializer>) -> Self {
        self.serializer = Some(serializer);
        self
    }

    /// Validate the configuration and assemble the verifier.
    pub fn build(self) -> Result<RequestVerifier, VerificationError> {
        self.config.validate()?;

        let trusted_source = TrustedSource::new(&self.config.url_pattern)?;
        let max_timestamp_skew = TimeDelta::from_std(self.config.max_timestamp_skew)
            .map_err(|_| VerificationError::ConfigError("maxTimestampSkew out of range".to_string()))?;

        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let cache = CertificateCache::with_clock(&self.config.cache, Arc::clone(&clock))?;

        let fetcher: Arc<dyn CertificateFetcher> = match self.fetcher {
            Some(fetcher) => fetcher,
            None => Arc::new(HttpCertificateFetcher::new()?),
        };

        Ok(RequestVerifier {
            config: self.config,
            trusted_source,
            max_timestamp_skew,
            clock,
            cache,
            fetcher,
            parser: self.parser.unwrap_or_else(|| Arc::new(X509CertificateParser)),
            signature_verifier: self
                .signature_verifier
                .unwrap_or_else(|| Arc::new(RsaSignatureVerifier)),
            serializer: self
                .serializer
                .unwrap_or_else(|| Arc::new(CompactJsonSerializer)),
        })
    }
}
