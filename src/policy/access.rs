//! Sender identity enforcement.
//!
//! A request names the skill it is addressed to in
//! `session.application.applicationId`. When the host configures one or more
//! application ids, only requests carrying one of them (exact string match)
//! are accepted.

use crate::protocol::models::RequestEnvelope;
use crate::VerificationError;
use serde::{Deserialize, Serialize};

/// One accepted application id, or a set of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ApplicationIds {
    /// A single accepted id.
    Single(String),
    /// Any of these ids is accepted.
    Many(Vec<String>),
}

impl ApplicationIds {
    /// Exact membership test.
    pub fn contains(&self, id: &str) -> bool {
        match self {
            ApplicationIds::Single(expected) => expected == id,
            ApplicationIds::Many(expected) => expected.iter().any(|e| e == id),
        }
    }

    /// True when no id could ever match.
    pub fn is_empty(&self) -> bool {
        match self {
            ApplicationIds::Single(_) => false,
            ApplicationIds::Many(ids) => ids.is_empty(),
        }
    }
}

impl From<&str> for ApplicationIds {
    fn from(id: &str) -> Self {
        ApplicationIds::Single(id.to_string())
    }
}

impl From<String> for ApplicationIds {
    fn from(id: String) -> Self {
        ApplicationIds::Single(id)
    }
}

impl From<Vec<String>> for ApplicationIds {
    fn from(ids: Vec<String>) -> Self {
        ApplicationIds::Many(ids)
    }
}

impl From<Vec<&str>> for ApplicationIds {
    fn from(ids: Vec<&str>) -> Self {
        ApplicationIds::Many(ids.into_iter().map(String::from).collect())
    }
}

/// Check the request's application id against the allow-list.
///
/// # Returns
/// * `Ok(())` - No allow-list configured, or the id is on it
/// * `Err(UnauthorizedSender)` - Id missing or not allowed
pub fn check_sender(
    envelope: &RequestEnvelope,
    allowed: Option<&ApplicationIds>,
) -> Result<(), VerificationError> {
    let Some(allowed) = allowed else {
        return Ok(());
    };

    let application_id = envelope
        .application_id()
        .ok_or(VerificationError::UnauthorizedSender)?;

    if !allowed.contains(application_id) {
        return Err(VerificationError::UnauthorizedSender);
    }

    Ok(())
}
