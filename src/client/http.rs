//! Reqwest-based certificate fetcher.
//!
//! Distinguishes transport failure from a non-200 answer; both surface as a
//! [`FetchError`]. No retries: the cache decides when to fetch again.

use crate::errors::FetchError;
use crate::VerificationError;
use reqwest::header::USER_AGENT;
use reqwest::{Client, StatusCode};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Certificate chains are a few KiB; anything far larger is not one.
pub const MAX_CERTIFICATE_BYTES: usize = 256 * 1024;

/// Boxed future returned by [`CertificateFetcher::fetch`].
pub type FetchFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<u8>, FetchError>> + Send + 'a>>;

/// Retrieves raw certificate bytes by URL.
///
/// Implementations must eventually resolve, either with bytes or with a
/// terminal error; the cache imposes no timeout of its own.
pub trait CertificateFetcher: Send + Sync {
    /// Fetch the resource at `url`.
    fn fetch<'a>(&'a self, url: &'a str) -> FetchFuture<'a>;
}

/// HTTPS certificate fetcher.
#[derive(Debug, Clone)]
pub struct HttpCertificateFetcher {
    client: Client,
    user_agent: String,
    timeout: Duration,
}

impl HttpCertificateFetcher {
    /// Create a fetcher with a 30 second timeout.
    pub fn new() -> Result<Self, VerificationError> {
        let timeout = Duration::from_secs(30);
        Ok(Self {
            client: build_client(timeout)?,
            user_agent: build_user_agent(),
            timeout,
        })
    }

    /// Set request timeout.
    pub fn try_with_timeout(mut self, timeout: Duration) -> Result<Self, VerificationError> {
        self.client = build_client(timeout)?;
        self.timeout = timeout;
        Ok(self)
    }

    /// Configured request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl CertificateFetcher for HttpCertificateFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> FetchFuture<'a> {
        Box::pin(async move {
            let response = self
                .client
                .get(url)
                .header(USER_AGENT, &self.user_agent)
                .send()
                .await
                .map_err(|e| FetchError::Transport(format!("Request failed: {}", e)))?;

            let status = response.status();
            if status != StatusCode::OK {
                return Err(FetchError::Status(status.as_u16()));
            }

            if response
                .content_length()
                .is_some_and(|len| len > MAX_CERTIFICATE_BYTES as u64)
            {
                return Err(FetchError::Transport("Certificate too large".to_string()));
            }

            let body = response
                .bytes()
                .await
                .map_err(|e| FetchError::Transport(format!("Failed to read body: {}", e)))?;

            if body.len() > MAX_CERTIFICATE_BYTES {
                return Err(FetchError::Transport("Certificate too large".to_string()));
            }

            Ok(body.to_vec())
        })
    }
}

fn build_client(timeout: Duration) -> Result<Client, VerificationError> {
    Client::builder()
        .timeout(timeout)
        .https_only(true)
        .build()
        .map_err(|e| VerificationError::ConfigError(format!("Failed to build HTTP client: {}", e)))
}

/// Build the User-Agent string.
///
/// Format: `skillsentry/<version>`
pub fn build_user_agent() -> String {
    format!("skillsentry/{}", env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_user_agent() {
        let ua = build_user_agent();
        assert_eq!(ua, format!("skillsentry/{}", env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn test_fetcher_creation() {
        let fetcher = HttpCertificateFetcher::new().unwrap();
        assert_eq!(fetcher.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_custom_timeout() {
        let fetcher = HttpCertificateFetcher::new()
            .unwrap()
            .try_with_timeout(Duration::from_secs(5))
            .unwrap();
        assert_eq!(fetcher.timeout(), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_plain_http_is_refused() {
        let fetcher = HttpCertificateFetcher::new().unwrap();
        let result = fetcher.fetch("http://127.0.0.1:9/cert.pem").await;
        assert!(matches!(result, Err(FetchError::Transport(_))));
    }
}
