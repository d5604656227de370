//! # Skillsentry
//!
//! **Signed voice-skill request verification for Rust.**
//!
//! The voice platform signs every webhook request it sends to a skill with
//! an X.509 certificate it publishes on a fixed HTTPS host. Skillsentry
//! checks that signature, the certificate behind it, and the request's own
//! claims before your handler ever sees the body.
//!
//! ## Features
//!
//! - **RSA PKCS#1 v1.5 signature verification** - SHA-1 by default, SHA-256 configurable
//! - **Certificate checks** - validity window and subject alternative name
//! - **Replay window** - requests older or newer than 150 seconds are rejected
//! - **Sender allow-list** - one application id or a set of them
//! - **Certificate cache** - LRU, stale-while-revalidate, one fetch per URL at a time
//! - **Fail-closed** - cheap local checks run first; nothing is fetched for a request
//!   that is already rejected
//!
//! ## Quickstart
//!
//! ```no_run
//! use skillsentry::{RequestVerifier, VerifierConfig};
//!
//! # async fn handle(cert_url: &str, signature: &str, raw_body: &[u8]) -> Result<(), skillsentry::VerificationError> {
//! let verifier = RequestVerifier::new(VerifierConfig::for_application(
//!     "amzn1.ask.skill.00000000-0000-0000-0000-000000000000",
//! ))?;
//!
//! match verifier.verify_json(cert_url, signature, raw_body).await {
//!     Ok(()) => { /* dispatch the request */ }
//!     Err(e) if e.is_transient() => { /* certificate host unreachable */ }
//!     Err(e) => eprintln!("rejected: {e}"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Threat Model
//!
//! Skillsentry protects against:
//! - **Forged requests** - bodies not signed by the platform's certificate are rejected
//! - **Certificate substitution** - certificates are only fetched from the trusted
//!   host and path, and must carry the platform's identity
//! - **Replay attacks** - captured requests expire after the replay window
//! - **Cross-skill delivery** - requests addressed to another application id are rejected
//!
//! Skillsentry does **not** validate the certificate chain up to a root CA; trust
//! rests on the HTTPS origin of the certificate and its identity.
//!
//! ## Configuration
//!
//! - `applicationId` - Accepted application id(s); omit to accept any sender
//! - `urlPattern` - Regular expression the certificate URL must match
//! - `cache` - `maxSize`, `maxAge`, `staleWhileRevalidate`
//! - `digestAlgorithm` - `sha1` or `sha256`
//!
//! See [`VerifierConfig`] for full documentation.

#![deny(missing_docs)]
#![doc(html_root_url = "https://docs.rs/skillsentry/0.1.0")]

// Core modules
pub mod clock;
pub mod config;
pub mod errors;

// Crypto layer
pub mod crypto;

// Protocol layer
pub mod protocol;

// Client layer
pub mod client;

// Cache layer
pub mod cache;

// Policy layer
pub mod policy;

// Verifier (main public API)
pub mod verifier;

// Re-exports for public API
pub use cache::certs::CertificateCache;
pub use client::http::{CertificateFetcher, FetchFuture, HttpCertificateFetcher};
pub use clock::{Clock, SystemClock};
pub use config::{CacheConfig, VerifierConfig};
pub use crypto::certificate::{Certificate, CertificateParser, PublicKeyMaterial};
pub use crypto::digest::DigestAlgorithm;
pub use crypto::signing::CanonicalSerializer;
pub use crypto::verify::SignatureVerifier;
pub use errors::{FetchError, VerificationError};
pub use policy::access::ApplicationIds;
pub use protocol::models::RequestBody;
pub use verifier::{RequestVerifier, VerifierBuilder};

#[cfg(any(test, feature = "test-seams"))]
pub use clock::MockClock;
