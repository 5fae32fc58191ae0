//! Classification of resolver outcomes and payload shape checks
//!
//! Resolvers use the `require_*` helpers to check payload shape, and the sync
//! facade passes every resolver outcome through [`validate`] exactly once
//! before anything is cached.

use serde_json::{Map, Value};

use crate::sync::error::SyncError;

/// Outcome of validating a field response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Valid,
    /// Transient failure; nothing is cached and the next sync retries
    Recoverable(String),
    /// Response has the wrong shape or the package is misconfigured
    Fatal(String),
}

impl Verdict {
    pub fn is_failure(&self) -> bool {
        !matches!(self, Verdict::Valid)
    }
}

pub fn validate<T>(outcome: &Result<T, SyncError>) -> Verdict {
    match outcome {
        Ok(_) => Verdict::Valid,
        Err(e @ (SyncError::Transport(_) | SyncError::Cache(_))) => {
            Verdict::Recoverable(e.to_string())
        }
        Err(e) => Verdict::Fatal(e.to_string()),
    }
}

pub fn require_mapping(value: &Value) -> Result<&Map<String, Value>, SyncError> {
    value
        .as_object()
        .ok_or_else(|| {
            SyncError::MalformedResponse(format!("expected a mapping, got {}", kind(value)))
        })
}

/// File contents from the `src` endpoint arrive as `{"data": "<text>", ...}`
pub fn require_file_contents(value: &Value) -> Result<&str, SyncError> {
    require_mapping(value)?
        .get("data")
        .and_then(Value::as_str)
        .ok_or_else(|| SyncError::MalformedResponse("file payload has no data".to_string()))
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::error::CacheError;
    use serde_json::json;

    #[test]
    fn validate_accepts_ok_outcome() {
        let outcome: Result<u32, SyncError> = Ok(1);
        assert_eq!(validate(&outcome), Verdict::Valid);
        assert!(!validate(&outcome).is_failure());
    }

    #[test]
    fn validate_marks_transport_failures_recoverable() {
        let outcome: Result<u32, SyncError> = Err(SyncError::Transport("timeout".to_string()));
        assert!(matches!(validate(&outcome), Verdict::Recoverable(_)));
    }

    #[test]
    fn validate_marks_cache_failures_recoverable() {
        let outcome: Result<u32, SyncError> = Err(SyncError::Cache(CacheError::LockPoisoned));
        assert!(matches!(validate(&outcome), Verdict::Recoverable(_)));
    }

    #[test]
    fn validate_marks_shape_mismatch_fatal() {
        let outcome: Result<u32, SyncError> =
            Err(SyncError::MalformedResponse("expected a mapping".to_string()));
        let verdict = validate(&outcome);
        assert!(matches!(verdict, Verdict::Fatal(_)));
        assert!(verdict.is_failure());
    }

    #[test]
    fn require_mapping_rejects_sequence() {
        let err = require_mapping(&json!(["v1"])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Malformed response: expected a mapping, got a sequence"
        );
    }

    #[test]
    fn require_file_contents_reads_data() {
        let payload = json!({"node": "abc", "path": "CHANGES.md", "data": "# 1.0"});
        assert_eq!(require_file_contents(&payload).unwrap(), "# 1.0");
    }

    #[test]
    fn require_file_contents_rejects_missing_data() {
        assert!(matches!(
            require_file_contents(&json!({"node": "abc"})),
            Err(SyncError::MalformedResponse(_))
        ));
    }
}
