// Session Domain Model

use serde::{Deserialize, Serialize};

use crate::domain::request::{LanguageName, SessionId};

/// Arena key: session ids are scoped by their owning context
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    pub context: LanguageName,
    pub id: SessionId,
}

impl SessionKey {
    pub fn new(context: impl Into<String>, id: SessionId) -> Self {
        Self {
            context: context.into(),
            id,
        }
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.context, self.id)
    }
}

/// Accumulated non-terminal code for one language, oldest fragment first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    /// Name of the owning interpreter context
    pub context: LanguageName,
    pub history: Vec<String>,
}

impl Session {
    /// Create an empty session bound to `context`
    pub fn new(id: SessionId, context: impl Into<String>) -> Self {
        Self {
            id,
            context: context.into(),
            history: Vec::new(),
        }
    }

    pub fn with_history(mut self, history: Vec<String>) -> Self {
        self.history = history;
        self
    }

    pub fn key(&self) -> SessionKey {
        SessionKey::new(self.context.clone(), self.id)
    }

    /// Append one accepted fragment (history is append-only)
    pub fn append(&mut self, fragment: impl Into<String>) {
        self.history.push(fragment.into());
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}
