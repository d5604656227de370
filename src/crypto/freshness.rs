//! Request freshness enforcement (replay attack prevention).
//!
//! Assumes the verifying host's clock is NTP-synchronized.

use crate::clock::Clock;
use crate::protocol::models::{RequestEnvelope, RequestTimestamp};
use crate::VerificationError;
use chrono::{DateTime, TimeDelta, Utc};

/// Parse `request.timestamp` into UTC.
///
/// Text must be RFC 3339; numbers are Unix epoch milliseconds.
pub fn parse_request_timestamp(timestamp: &RequestTimestamp) -> Option<DateTime<Utc>> {
    match timestamp {
        RequestTimestamp::Text(s) => DateTime::parse_from_rfc3339(s.trim())
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        RequestTimestamp::EpochMillis(ms) => DateTime::from_timestamp_millis(*ms),
    }
}

/// Check that a request timestamp is within `max_skew` of now, either side.
///
/// The boundary is inclusive: a request exactly `max_skew` old is accepted.
///
/// # Errors
/// * `StaleOrFutureTimestamp` - Timestamp too far in the past or future
pub fn check_freshness<C: Clock + ?Sized>(
    timestamp: DateTime<Utc>,
    max_skew: TimeDelta,
    clock: &C,
) -> Result<(), VerificationError> {
    let age = clock.now_utc() - timestamp;

    if age > max_skew || age < -max_skew {
        return Err(VerificationError::StaleOrFutureTimestamp);
    }

    Ok(())
}

/// Combined extract, parse and check freshness.
pub fn check_request_freshness<C: Clock + ?Sized>(
    envelope: &RequestEnvelope,
    max_skew: TimeDelta,
    clock: &C,
) -> Result<DateTime<Utc>, VerificationError> {
    let timestamp = envelope
        .timestamp()
        .and_then(parse_request_timestamp)
        .ok_or(VerificationError::StaleOrFutureTimestamp)?;
    check_freshness(timestamp, max_skew, clock)?;
    Ok(timestamp)
}
