//! Signed message construction.
//!
//! The sender signs the JSON body exactly as serialized. Verification
//! re-serializes the parsed body, so the serializer must reproduce the
//! sender's bytes: compact form, original key order, no trailing newline.

use crate::protocol::models::RequestBody;
use crate::VerificationError;

/// Produces the exact bytes the signature covers.
pub trait CanonicalSerializer: Send + Sync {
    /// Serialize `body` into the signed message.
    fn canonical_bytes(&self, body: &RequestBody) -> Result<Vec<u8>, VerificationError>;
}

/// Compact JSON, keys in document order.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompactJsonSerializer;

impl CanonicalSerializer for CompactJsonSerializer {
    fn canonical_bytes(&self, body: &RequestBody) -> Result<Vec<u8>, VerificationError> {
        // A JSON value always serializes; keep the error path typed anyway.
        serde_json::to_vec(body.value()).map_err(|_| VerificationError::MalformedRequest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_compact_no_whitespace() {
        let body = RequestBody::from_value(json!({"a": 1, "b": [1, 2]}));
        let bytes = CompactJsonSerializer.canonical_bytes(&body).unwrap();
        assert_eq!(bytes, br#"{"a":1,"b":[1,2]}"#);
    }

    #[test]
    fn test_key_order_preserved() {
        let body = RequestBody::from_slice(
            br#"{"version":"1.0","session":{"new":true},"request":{"type":"LaunchRequest"}}"#,
        )
        .unwrap();
        let bytes = CompactJsonSerializer.canonical_bytes(&body).unwrap();
        assert_eq!(
            bytes,
            br#"{"version":"1.0","session":{"new":true},"request":{"type":"LaunchRequest"}}"#
        );
    }

    #[test]
    fn test_no_trailing_newline() {
        let body = RequestBody::from_value(json!({"request": {"type": "LaunchRequest"}}));
        let bytes = CompactJsonSerializer.canonical_bytes(&body).unwrap();
        assert_ne!(bytes.last(), Some(&b'\n'));
    }

    #[test]
    fn test_string_escaping_is_stable() {
        let body = RequestBody::from_value(json!({"text": "quote \" and slash / and é"}));
        let bytes = CompactJsonSerializer.canonical_bytes(&body).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"{"text":"quote \" and slash / and é"}"#
        );
    }
}
