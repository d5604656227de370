//! Signed request body and the typed view of the fields verification reads.

use crate::VerificationError;
use serde_json::Value;

/// `request.timestamp` as sent on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestTimestamp {
    /// ISO 8601 / RFC 3339 text, e.g. `2025-01-15T12:00:00Z`.
    Text(String),
    /// Milliseconds since the Unix epoch.
    EpochMillis(i64),
}

/// `session.application`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Application {
    /// `applicationId`.
    pub application_id: Option<String>,
}

/// `session`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    /// `application`.
    pub application: Option<Application>,
}

/// `request`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestInfo {
    /// `type`, e.g. `LaunchRequest` or `IntentRequest`.
    pub request_type: Option<String>,
    /// `timestamp`.
    pub timestamp: Option<RequestTimestamp>,
}

/// The fields of a request body that verification depends on.
///
/// Every path is optional. A field with the wrong JSON type counts as
/// absent, so a hostile body can only ever produce a typed rejection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestEnvelope {
    /// `session`.
    pub session: Option<Session>,
    /// `request`.
    pub request: Option<RequestInfo>,
}

impl RequestEnvelope {
    /// Extract the typed view from a JSON value.
    pub fn from_value(value: &Value) -> Self {
        let session = value.get("session").filter(|s| s.is_object()).map(|s| Session {
            application: s
                .get("application")
                .filter(|a| a.is_object())
                .map(|a| Application {
                    application_id: a
                        .get("applicationId")
                        .and_then(Value::as_str)
                        .map(String::from),
                }),
        });

        let request = value.get("request").filter(|r| r.is_object()).map(|r| RequestInfo {
            request_type: r.get("type").and_then(Value::as_str).map(String::from),
            timestamp: r.get("timestamp").and_then(|t| match t {
                Value::String(s) => Some(RequestTimestamp::Text(s.clone())),
                Value::Number(n) => n.as_i64().map(RequestTimestamp::EpochMillis),
                _ => None,
            }),
        });

        Self { session, request }
    }

    /// `request.type`, if present and non-empty.
    pub fn request_type(&self) -> Option<&str> {
        self.request
            .as_ref()
            .and_then(|r| r.request_type.as_deref())
            .filter(|t| !t.is_empty())
    }

    /// `session.application.applicationId`, if present and non-empty.
    pub fn application_id(&self) -> Option<&str> {
        self.session
            .as_ref()
            .and_then(|s| s.application.as_ref())
            .and_then(|a| a.application_id.as_deref())
            .filter(|id| !id.is_empty())
    }

    /// `request.timestamp`, if present.
    pub fn timestamp(&self) -> Option<&RequestTimestamp> {
        self.request.as_ref().and_then(|r| r.timestamp.as_ref())
    }
}

/// A parsed inbound request body.
///
/// Keeps the full JSON document (key order preserved, since it is
/// re-serialized for signature checking) next to its typed envelope.
#[derive(Debug, Clone)]
pub struct RequestBody {
    value: Value,
    envelope: RequestEnvelope,
}

impl RequestBody {
    /// Wrap an already-parsed JSON document.
    pub fn from_value(value: Value) -> Self {
        let envelope = RequestEnvelope::from_value(&value);
        Self { value, envelope }
    }

    /// Parse raw JSON bytes.
    ///
    /// # Errors
    /// * `MalformedRequest` - Bytes are not JSON
    pub fn from_slice(bytes: &[u8]) -> Result<Self, VerificationError> {
        let value: Value =
            serde_json::from_slice(bytes).map_err(|_| VerificationError::MalformedRequest)?;
        Ok(Self::from_value(value))
    }

    /// The full JSON document.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// The typed fields verification reads.
    pub fn envelope(&self) -> &RequestEnvelope {
        &self.envelope
    }
}

impl From<Value> for RequestBody {
    fn from(value: Value) -> Self {
        Self::from_value(value)
    }
}
