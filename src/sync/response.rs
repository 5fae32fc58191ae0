//! Typed view of a remote response, decoded once at the transport boundary

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::sync::error::{SyncError, TransportError};

/// Remote response after decoding
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    /// Payload with content
    Success(Value),
    /// Not found, or a payload with nothing in it
    Empty,
    /// Transport failure or an error body
    Error(String),
}

impl ApiResponse {
    /// Decodes the outcome of a [`crate::sync::transport::Transport::fetch`] call.
    ///
    /// `NotFound` is absence, not failure, and decodes to [`ApiResponse::Empty`].
    pub fn decode(result: Result<Value, TransportError>) -> Self {
        match result {
            Ok(value) => Self::from_payload(value),
            Err(TransportError::NotFound(_)) => ApiResponse::Empty,
            Err(e) => ApiResponse::Error(e.to_string()),
        }
    }

    pub fn from_payload(value: Value) -> Self {
        if let Some(message) = error_message(&value) {
            return ApiResponse::Error(message);
        }

        let empty = match &value {
            Value::Null => true,
            Value::Object(map) => map.is_empty(),
            Value::Array(items) => items.is_empty(),
            Value::String(text) => text.is_empty(),
            _ => false,
        };

        if empty {
            ApiResponse::Empty
        } else {
            ApiResponse::Success(value)
        }
    }

    /// Payload if any; `Error` becomes a recoverable [`SyncError::Transport`]
    pub fn into_payload(self) -> Result<Option<Value>, SyncError> {
        match self {
            ApiResponse::Success(value) => Ok(Some(value)),
            ApiResponse::Empty => Ok(None),
            ApiResponse::Error(message) => Err(SyncError::Transport(message)),
        }
    }
}

/// Error bodies come as `{"message": "..."}` (1.0 API) or
/// `{"type": "error", "error": {"message": "..."}}` (2.0 API).
fn error_message(value: &Value) -> Option<String> {
    let map = value.as_object()?;

    if let Some(Value::String(message)) = map.get("message") {
        return Some(message.clone());
    }

    map.get("error")
        .and_then(|error| error.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Normalized value of a field; `Absent` is the cacheable "no data" sentinel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Resolved<T> {
    Found { value: T },
    Absent { message: String },
}

impl<T> Resolved<T> {
    pub fn found(value: T) -> Self {
        Resolved::Found { value }
    }

    pub fn absent(message: &str) -> Self {
        Resolved::Absent {
            message: message.to_string(),
        }
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Resolved::Found { value } => Some(value),
            Resolved::Absent { .. } => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Resolved::Found { value } => Some(value),
            Resolved::Absent { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(json!(null))]
    #[case(json!({}))]
    #[case(json!([]))]
    #[case(json!(""))]
    fn from_payload_treats_empty_values_as_empty(#[case] payload: Value) {
        assert_eq!(ApiResponse::from_payload(payload), ApiResponse::Empty);
    }

    #[rstest]
    #[case(json!({"message": "Repository not found"}), "Repository not found")]
    #[case(
        json!({"type": "error", "error": {"message": "Access denied"}}),
        "Access denied"
    )]
    fn from_payload_detects_error_bodies(#[case] payload: Value, #[case] expected: &str) {
        assert_eq!(
            ApiResponse::from_payload(payload),
            ApiResponse::Error(expected.to_string())
        );
    }

    #[test]
    fn from_payload_keeps_tag_named_message() {
        let payload = json!({"message": {"node": "abc123"}});
        assert_eq!(
            ApiResponse::from_payload(payload.clone()),
            ApiResponse::Success(payload)
        );
    }

    #[test]
    fn decode_maps_not_found_to_empty() {
        let result = Err(TransportError::NotFound("acme/widget".to_string()));
        assert_eq!(ApiResponse::decode(result), ApiResponse::Empty);
    }

    #[test]
    fn decode_maps_other_failures_to_error() {
        let result = Err(TransportError::RateLimited {
            retry_after_secs: Some(60),
        });
        assert!(matches!(ApiResponse::decode(result), ApiResponse::Error(_)));
    }

    #[test]
    fn into_payload_turns_error_into_transport_failure() {
        let result = ApiResponse::Error("boom".to_string()).into_payload();
        assert!(matches!(result, Err(SyncError::Transport(message)) if message == "boom"));
    }

    #[test]
    fn resolved_serializes_with_status_tag() {
        let found = serde_json::to_value(Resolved::found(vec!["1.0.0"])).unwrap();
        assert_eq!(found, json!({"status": "found", "value": ["1.0.0"]}));

        let absent =
            serde_json::to_value(Resolved::<Vec<String>>::absent("No tags found")).unwrap();
        assert_eq!(absent, json!({"status": "absent", "message": "No tags found"}));
    }
}
