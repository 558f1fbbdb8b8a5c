//! RPC Request/Response Types
//!
//! Defines the JSON-RPC method parameters and results.

use notebook_core::domain::{ExecutionResult, ResultKind};
use serde::{Deserialize, Serialize};

/// notebook.execute.v1 - Run a `%<language> <code>` request
#[derive(Debug, Deserialize)]
pub struct ExecuteRequest {
    pub code: String,
    /// Number or numeric string; anything else runs without a session
    #[serde(default)]
    pub session_id: Option<serde_json::Value>,
}

impl ExecuteRequest {
    /// Raw session field as handed to the classifier
    pub fn session_field(&self) -> Option<String> {
        match self.session_id.as_ref()? {
            serde_json::Value::Number(n) => Some(n.to_string()),
            serde_json::Value::String(s) => Some(s.clone()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteResponse {
    pub kind: ResultKind,
    pub content: String,
}

impl From<ExecutionResult> for ExecuteResponse {
    fn from(result: ExecutionResult) -> Self {
        Self {
            kind: result.kind,
            content: result.content,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(params: serde_json::Value) -> ExecuteRequest {
        serde_json::from_value(params).unwrap()
    }

    #[test]
    fn test_session_field_accepts_numbers_and_strings() {
        let numeric = request(serde_json::json!({"code": "%python x=1", "session_id": 321}));
        assert_eq!(numeric.session_field().as_deref(), Some("321"));

        let text = request(serde_json::json!({"code": "%python x=1", "session_id": "12"}));
        assert_eq!(text.session_field().as_deref(), Some("12"));

        let absent = request(serde_json::json!({"code": "%python x=1"}));
        assert!(absent.session_field().is_none());

        let object = request(serde_json::json!({"code": "%python x=1", "session_id": {}}));
        assert!(object.session_field().is_none());
    }

    #[test]
    fn test_response_wire_shape() {
        let response = ExecuteResponse::from(ExecutionResult::ok("2"));
        assert_eq!(
            serde_json::to_value(response).unwrap(),
            serde_json::json!({"kind": "result", "content": "2"})
        );
    }
}
