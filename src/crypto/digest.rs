//! Digest algorithms accepted for request signatures.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Digest the sender applies before signing the body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    /// SHA-1, what the platform signs with.
    #[default]
    Sha1,
    /// SHA-256.
    Sha256,
}

impl DigestAlgorithm {
    /// Algorithm name as it appears in configuration.
    pub fn name(&self) -> &'static str {
        match self {
            DigestAlgorithm::Sha1 => "sha1",
            DigestAlgorithm::Sha256 => "sha256",
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_sha1() {
        assert_eq!(DigestAlgorithm::default(), DigestAlgorithm::Sha1);
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_string(&DigestAlgorithm::Sha256).unwrap(), r#""sha256""#);
        let parsed: DigestAlgorithm = serde_json::from_str(r#""sha1""#).unwrap();
        assert_eq!(parsed, DigestAlgorithm::Sha1);
    }

    #[test]
    fn test_unknown_name_rejected() {
        assert!(serde_json::from_str::<DigestAlgorithm>(r#""md5""#).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(DigestAlgorithm::Sha256.to_string(), "sha256");
    }
}
