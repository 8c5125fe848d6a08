//! Uniform response envelopes
//!
//! Every outward-facing result is wrapped in one of these so callers can
//! always find the request's correlation id under `id`.

use serde::{Deserialize, Serialize};

pub const SUCCESS_MESSAGE: &str = "Success";

/// Body of a successful response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuccessEnvelope<T> {
    pub code: u16,
    pub message: String,
    pub data: T,
    pub id: String,
}

impl<T> SuccessEnvelope<T> {
    pub fn new(data: T, id: impl Into<String>) -> Self {
        Self {
            code: 200,
            message: SUCCESS_MESSAGE.to_string(),
            data,
            id: id.into(),
        }
    }
}

/// Body of a failed response
///
/// `error` and `stacktrace` are only filled in development mode and are
/// left out of the JSON entirely otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureEnvelope {
    pub code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stacktrace: Option<String>,
    pub id: String,
}

impl FailureEnvelope {
    pub fn new(code: u16, id: impl Into<String>) -> Self {
        Self {
            code,
            data: None,
            error: None,
            stacktrace: None,
            id: id.into(),
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn with_stacktrace(mut self, stacktrace: impl Into<String>) -> Self {
        let trace = stacktrace.into();
        if !trace.is_empty() {
            self.stacktrace = Some(trace);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_shape() {
        let env = SuccessEnvelope::new("true", "abc-123");
        let value = serde_json::to_value(&env).unwrap();
        assert_eq!(
            value,
            json!({"code": 200, "message": "Success", "data": "true", "id": "abc-123"})
        );
    }

    #[test]
    fn test_failure_omits_details() {
        let value = serde_json::to_value(FailureEnvelope::new(400, "abc")).unwrap();
        assert_eq!(value, json!({"code": 400, "id": "abc"}));

        let env = FailureEnvelope::new(500, "abc")
            .with_error("Directory connection failed: refused")
            .with_stacktrace("");
        let value = serde_json::to_value(&env).unwrap();
        assert_eq!(value["error"], "Directory connection failed: refused");
        assert!(value.get("stacktrace").is_none());
    }

    #[test]
    fn test_failure_parses_back() {
        let raw = r#"{"code":404,"error":"Not found: /x","stacktrace":"0: main","id":"c1"}"#;
        let env: FailureEnvelope = serde_json::from_str(raw).unwrap();
        assert_eq!(env.code, 404);
        assert_eq!(env.id, "c1");
        assert_eq!(env.stacktrace.as_deref(), Some("0: main"));
        assert!(env.data.is_none());
    }
}
