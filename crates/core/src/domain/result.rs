// Execution Result Domain Model

use serde::{Deserialize, Serialize};

/// Two-valued outcome kind, serialized as "result" / "error"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultKind {
    Result,
    Error,
}

impl std::fmt::Display for ResultKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResultKind::Result => write!(f, "result"),
            ResultKind::Error => write!(f, "error"),
        }
    }
}

/// Returned to the caller for every call, never persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub kind: ResultKind,
    pub content: String,
}

impl ExecutionResult {
    pub fn ok(content: impl Into<String>) -> Self {
        Self {
            kind: ResultKind::Result,
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            kind: ResultKind::Error,
            content: content.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.kind == ResultKind::Result
    }

    pub fn is_error(&self) -> bool {
        self.kind == ResultKind::Error
    }
}
