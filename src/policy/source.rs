//! Certificate source URL trust check.
//!
//! The URL is normalized before matching: scheme and host are lowercased,
//! the default port is dropped and `.`/`..` path segments are resolved. A
//! URL such as `https://s3.amazonaws.com/echo.api/../evil.pem` therefore
//! resolves to `/evil.pem` and fails the pattern.

use crate::VerificationError;
use regex::Regex;
use reqwest::Url;

/// Compiled trusted-source pattern.
#[derive(Debug, Clone)]
pub struct TrustedSource {
    pattern: Regex,
}

impl TrustedSource {
    /// Compile a trusted-source pattern.
    pub fn new(pattern: &str) -> Result<Self, VerificationError> {
        let pattern = Regex::new(pattern)
            .map_err(|e| VerificationError::ConfigError(format!("Invalid urlPattern: {}", e)))?;
        Ok(Self { pattern })
    }

    /// Normalize `url` and check it against the pattern.
    ///
    /// Returns the normalized URL, which is what gets cached and fetched.
    ///
    /// # Errors
    /// * `UntrustedCertificateSource` - URL does not parse or does not match
    pub fn check(&self, url: &str) -> Result<String, VerificationError> {
        let untrusted = || VerificationError::UntrustedCertificateSource {
            url: url.to_string(),
        };

        let normalized = Url::parse(url.trim()).map_err(|_| untrusted())?;
        let normalized = String::from(normalized);

        if !self.pattern.is_match(&normalized) {
            return Err(untrusted());
        }

        Ok(normalized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_URL_PATTERN;

    fn default_source() -> TrustedSource {
        TrustedSource::new(DEFAULT_URL_PATTERN).unwrap()
    }

    fn assert_untrusted(url: &str) {
        let result = default_source().check(url);
        assert!(
            matches!(result, Err(VerificationError::UntrustedCertificateSource { .. })),
            "{} should be untrusted",
            url
        );
    }

    #[test]
    fn accepts_platform_urls() {
        let source = default_source();
        for url in [
            "https://s3.amazonaws.com/echo.api/echo-api-cert.pem",
            "https://s3.amazonaws.com:443/echo.api/echo-api-cert.pem",
            "https://S3.AMAZONAWS.COM/echo.api/echo-api-cert.pem",
            "https://s3.amazonaws.com/echo.api/../echo.api/echo-api-cert.pem",
        ] {
            assert!(source.check(url).is_ok(), "{} should be trusted", url);
        }
    }

    #[test]
    fn normalizes_before_returning() {
        let normalized = default_source()
            .check("HTTPS://s3.amazonaws.com:443/echo.api/./cert.pem")
            .unwrap();
        assert_eq!(normalized, "https://s3.amazonaws.com/echo.api/cert.pem");
    }

    #[test]
    fn rejects_wrong_scheme() {
        assert_untrusted("http://s3.amazonaws.com/echo.api/echo-api-cert.pem");
    }

    #[test]
    fn rejects_wrong_host() {
        assert_untrusted("https://notamazon.com/echo.api/echo-api-cert.pem");
        assert_untrusted("https://s3.amazonaws.com.evil.net/echo.api/cert.pem");
    }

    #[test]
    fn rejects_wrong_port() {
        assert_untrusted("https://s3.amazonaws.com:563/echo.api/echo-api-cert.pem");
    }

    #[test]
    fn rejects_wrong_path() {
        assert_untrusted("https://s3.amazonaws.com/EcHo.aPi/echo-api-cert.pem");
        assert_untrusted("https://s3.amazonaws.com/invalid.path/echo-api-cert.pem");
        assert_untrusted("https://s3.amazonaws.com/echo.api/../invalid.path/cert.pem");
    }

    #[test]
    fn rejects_garbage() {
        assert_untrusted("");
        assert_untrusted("not a url");
    }

    #[test]
    fn invalid_pattern_is_config_error() {
        let result = TrustedSource::new("(");
        assert!(matches!(result, Err(VerificationError::ConfigError(_))));
    }
}
