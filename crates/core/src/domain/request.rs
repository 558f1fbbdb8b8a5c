// Interpretation Request Domain Model

use serde::{Deserialize, Serialize};

use crate::domain::error::{DomainError, Result};

/// Language key (e.g. "python"), unique per interpreter context
pub type LanguageName = String;

/// Caller-supplied numeric session identifier
pub type SessionId = i64;

/// Marker prefixed to the language name in raw input (`%python ...`)
pub const TAG_MARKER: char = '%';

/// Readiness of a request for interpretation (closed set)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    /// Stateless single-shot execution
    NoNeedForSession,
    /// Session requested but not known yet, one must be created
    NoSessionId,
    NoInterpreterFound,
    WrongSyntax,
    Good,
}

impl RequestStatus {
    /// Numeric status code, carried in log fields (never returned over RPC)
    pub fn code(&self) -> i32 {
        match self {
            RequestStatus::NoNeedForSession => -800,
            RequestStatus::NoSessionId => -850,
            RequestStatus::NoInterpreterFound => -900,
            RequestStatus::WrongSyntax => -950,
            RequestStatus::Good => -1000,
        }
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestStatus::NoNeedForSession => write!(f, "NO_NEED_FOR_SESSION"),
            RequestStatus::NoSessionId => write!(f, "NO_SESSION_ID"),
            RequestStatus::NoInterpreterFound => write!(f, "NO_INTERPRETER_FOUND"),
            RequestStatus::WrongSyntax => write!(f, "WRONG_SYNTAX"),
            RequestStatus::Good => write!(f, "GOOD"),
        }
    }
}

/// A parsed user request, valid for one request/response cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedRequest {
    pub language: LanguageName,
    /// Code body with the language tag stripped
    pub code: String,
    pub session_id: Option<SessionId>,
    pub status: RequestStatus,
}

impl ClassifiedRequest {
    pub fn new(
        language: impl Into<String>,
        code: impl Into<String>,
        session_id: Option<SessionId>,
        status: RequestStatus,
    ) -> Self {
        Self {
            language: language.into(),
            code: code.into(),
            session_id,
            status,
        }
    }

    pub fn is_new_session(&self) -> bool {
        self.status == RequestStatus::NoSessionId
    }

    pub fn needs_session(&self) -> bool {
        matches!(self.status, RequestStatus::Good | RequestStatus::NoSessionId)
    }

    /// Session created: NO_SESSION_ID -> GOOD
    pub fn promote_to_good(&mut self) -> Result<()> {
        if self.status != RequestStatus::NoSessionId {
            return Err(DomainError::InvalidStatusTransition {
                from: self.status.to_string(),
                to: RequestStatus::Good.to_string(),
            });
        }
        self.status = RequestStatus::Good;
        Ok(())
    }

    /// Lookup miss overrides any previous status
    pub fn mark_no_interpreter(&mut self) {
        self.status = RequestStatus::NoInterpreterFound;
    }

    /// Confirm a session-aware request against the context's sessions
    pub fn confirm_session(&mut self, session_known: bool) {
        if self.needs_session() {
            self.status = if session_known {
                RequestStatus::Good
            } else {
                RequestStatus::NoSessionId
            };
        }
    }
}
