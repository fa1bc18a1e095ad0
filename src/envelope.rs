//! Validation of the `{ "status": ..., "data": ... }` response envelope.

use serde_json::Value;

use crate::error::FailureKind;

/// The status value the service uses for a successful response.
pub const STATUS_OK: &str = "ok";

/// Checks the envelope status and returns the `data` payload on success.
///
/// A missing `status` is always [`FailureKind::MalformedEnvelope`]. Any other
/// status is a [`FailureKind::RemoteError`] carrying the `data` field as text,
/// whatever else the response contains. A success without `data` is
/// malformed.
pub fn open(body: &Value) -> Result<&Value, FailureKind> {
    let Some(status) = body.get("status") else {
        return Err(FailureKind::MalformedEnvelope("missing status".into()));
    };

    if status.as_str() != Some(STATUS_OK) {
        return Err(FailureKind::RemoteError(text_of(body.get("data"))));
    }

    body.get("data")
        .filter(|d| !d.is_null())
        .ok_or_else(|| FailureKind::MalformedEnvelope("missing data".into()))
}

/// Renders a JSON value the way it should appear in messages: strings
/// without quotes, everything else as compact JSON.
pub fn text_of(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
