//! Skillsentry configuration.
//!
//! [`VerifierConfig`] is built once at startup, validated, and then shared
//! read-only by the verifier and its certificate cache. It deserializes from
//! a partial JSON document: any key left out keeps its default, including
//! the nested `cache` keys.

use crate::crypto::digest::DigestAlgorithm;
use crate::policy::access::ApplicationIds;
use crate::VerificationError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Certificate URLs must live under this host and path prefix.
pub const DEFAULT_URL_PATTERN: &str = r"^https://s3\.amazonaws\.com(:443)?/echo\.api/";

/// SAN value the platform's signing certificate carries.
pub const DEFAULT_CERTIFICATE_IDENTITY: &str = "DNS:echo-api.amazon.com";

/// Maximum distance between request timestamp and local time (150 seconds).
pub const DEFAULT_MAX_TIMESTAMP_SKEW: Duration = Duration::from_secs(150);

/// Freshness policy for the certificate cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CacheConfig {
    /// Maximum number of certificate URLs retained.
    pub max_size: usize,

    /// How long a fetched certificate is served without revalidation.
    #[serde(with = "seconds")]
    pub max_age: Duration,

    /// Extra time after `max_age` during which the stale certificate is
    /// still served while a refresh runs in the background.
    #[serde(with = "seconds")]
    pub stale_while_revalidate: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: 100,
            max_age: Duration::from_secs(600),
            stale_while_revalidate: Duration::from_secs(86400),
        }
    }
}

/// Configuration for request verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VerifierConfig {
    /// Regular expression the (normalized) certificate URL must match.
    pub url_pattern: String,

    /// Accepted application id(s). `None` disables the sender check.
    #[serde(alias = "allowedSenderIds", skip_serializing_if = "Option::is_none")]
    pub application_id: Option<ApplicationIds>,

    /// Certificate cache policy.
    pub cache: CacheConfig,

    /// Subject alternative name the signing certificate must carry,
    /// in `DNS:<host>` form.
    pub certificate_identity: String,

    /// Digest used by the sender when signing the body.
    pub digest_algorithm: DigestAlgorithm,

    /// Replay window, applied in both directions around local time.
    #[serde(with = "seconds")]
    pub max_timestamp_skew: Duration,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            url_pattern: DEFAULT_URL_PATTERN.to_string(),
            application_id: None,
            cache: CacheConfig::default(),
            certificate_identity: DEFAULT_CERTIFICATE_IDENTITY.to_string(),
            digest_algorithm: DigestAlgorithm::default(),
            max_timestamp_skew: DEFAULT_MAX_TIMESTAMP_SKEW,
        }
    }
}

impl VerifierConfig {
    /// Default configuration restricted to the given application id(s).
    pub fn for_application(ids: impl Into<ApplicationIds>) -> Self {
        Self {
            application_id: Some(ids.into()),
            ..Self::default()
        }
    }

    /// Parse a (possibly partial) JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self, VerificationError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| VerificationError::ConfigError(format!("Invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration for obvious errors.
    pub fn validate(&self) -> Result<(), VerificationError> {
        if self.cache.max_size == 0 {
            return Err(VerificationError::ConfigError(
                "cache.maxSize must be at least 1".to_string(),
            ));
        }
        if self.certificate_identity.is_empty() {
            return Err(VerificationError::ConfigError(
                "certificateIdentity cannot be empty".to_string(),
            ));
        }
        if chrono::Duration::from_std(self.max_timestamp_skew).is_err() {
            return Err(VerificationError::ConfigError(format!(
                "maxTimestampSkew out of range: {:?}",
                self.max_timestamp_skew
            )));
        }
        if let Some(ids) = &self.application_id {
            if ids.is_empty() {
                return Err(VerificationError::ConfigError(
                    "applicationId cannot be an empty list".to_string(),
                ));
            }
        }
        regex::Regex::new(&self.url_pattern).map_err(|e| {
            VerificationError::ConfigError(format!("Invalid urlPattern: {}", e))
        })?;
        Ok(())
    }
}

/// Durations expressed as whole seconds on the wire.
mod seconds {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_platform_values() {
        let config = VerifierConfig::default();
        assert_eq!(config.cache.max_size, 100);
        assert_eq!(config.cache.max_age, Duration::from_secs(600));
        assert_eq!(config.cache.stale_while_revalidate, Duration::from_secs(86400));
        assert_eq!(config.max_timestamp_skew, Duration::from_secs(150));
        assert_eq!(config.certificate_identity, "DNS:echo-api.amazon.com");
        assert_eq!(config.digest_algorithm, DigestAlgorithm::Sha1);
        assert!(config.application_id.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_merges_over_defaults() {
        let config = VerifierConfig::from_json(
            r#"{"applicationId": "amzn1.ask.skill.one", "cache": {"maxAge": 60}}"#,
        )
        .unwrap();

        assert_eq!(config.cache.max_age, Duration::from_secs(60));
        assert_eq!(config.cache.max_size, 100);
        assert_eq!(config.cache.stale_while_revalidate, Duration::from_secs(86400));
        assert_eq!(config.url_pattern, DEFAULT_URL_PATTERN);
        assert_eq!(
            config.application_id,
            Some(ApplicationIds::Single("amzn1.ask.skill.one".to_string()))
        );
    }

    #[test]
    fn allowed_sender_ids_alias_accepts_lists() {
        let config =
            VerifierConfig::from_json(r#"{"allowedSenderIds": ["a", "b"]}"#).unwrap();
        assert_eq!(
            config.application_id,
            Some(ApplicationIds::Many(vec!["a".to_string(), "b".to_string()]))
        );
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        let result = VerifierConfig::from_json(r#"{"urlPattern": "^https://(unclosed"}"#);
        assert!(matches!(result, Err(VerificationError::ConfigError(_))));
    }

    #[test]
    fn zero_cache_size_is_rejected() {
        let mut config = VerifierConfig::default();
        config.cache.max_size = 0;
        assert!(matches!(
            config.validate(),
            Err(VerificationError::ConfigError(_))
        ));
    }

    #[test]
    fn empty_application_list_is_rejected() {
        let config = VerifierConfig::for_application(Vec::<String>::new());
        assert!(matches!(
            config.validate(),
            Err(VerificationError::ConfigError(_))
        ));
    }

    #[test]
    fn malformed_json_is_config_error() {
        let result = VerifierConfig::from_json(r#"{"cache": {"maxSize": "lots"}}"#);
        assert!(matches!(result, Err(VerificationError::ConfigError(_))));
    }
}
