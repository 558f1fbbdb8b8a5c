// Context & Session Repository Ports (Interface)

use crate::domain::{InterpreterContext, Session, SessionId};
use crate::error::Result;
use async_trait::async_trait;

/// Repository interface for interpreter contexts
#[async_trait]
pub trait ContextRepository: Send + Sync {
    /// Find the context registered for a language
    async fn find_by_language_name(&self, name: &str) -> Result<Option<InterpreterContext>>;

    /// Insert or update a context (keyed by name)
    async fn save(&self, context: &InterpreterContext) -> Result<()>;
}

/// Repository interface for the session arena
///
/// Sessions reference their context by name; a context's sessions are
/// resolved by filtering the arena on that name.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// All sessions owned by a context, ordered by id
    async fn find_by_context(&self, context: &str) -> Result<Vec<Session>>;

    /// One session of a context, with its history in order
    async fn find_session(&self, context: &str, id: SessionId) -> Result<Option<Session>>;

    /// Insert or update a session together with its full history
    async fn save(&self, session: &Session) -> Result<()>;
}

// ============================================================================
// In-memory implementation (tests, database-less runs)
// ============================================================================

pub mod memory {
    use super::*;
    use crate::domain::SessionKey;
    use std::collections::{BTreeMap, HashMap};
    use std::sync::{Mutex, PoisonError};

    /// In-memory context table and session arena
    #[derive(Default)]
    pub struct InMemoryStore {
        contexts: Mutex<HashMap<String, InterpreterContext>>,
        sessions: Mutex<BTreeMap<(String, i64), Session>>,
    }

    impl InMemoryStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Seed a context (builder-style)
        pub fn with_context(self, context: InterpreterContext) -> Self {
            self.contexts
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(context.name.clone(), context);
            self
        }

        /// Seed a session (builder-style)
        pub fn with_session(self, session: Session) -> Self {
            self.sessions
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert((session.context.clone(), session.id), session);
            self
        }

        /// Direct lookup by arena key
        pub fn session(&self, key: &SessionKey) -> Option<Session> {
            self.sessions
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .get(&(key.context.clone(), key.id))
                .cloned()
        }

        pub fn session_count(&self) -> usize {
            self.sessions
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .len()
        }
    }

    #[async_trait]
    impl ContextRepository for InMemoryStore {
        async fn find_by_language_name(&self, name: &str) -> Result<Option<InterpreterContext>> {
            Ok(self
                .contexts
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .get(name)
                .cloned())
        }

        async fn save(&self, context: &InterpreterContext) -> Result<()> {
            self.contexts
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(context.name.clone(), context.clone());
            Ok(())
        }
    }

    #[async_trait]
    impl SessionRepository for InMemoryStore {
        async fn find_by_context(&self, context: &str) -> Result<Vec<Session>> {
            Ok(self
                .sessions
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .values()
                .filter(|s| s.context == context)
                .cloned()
                .collect())
        }

        async fn find_session(&self, context: &str, id: SessionId) -> Result<Option<Session>> {
            Ok(self
                .find_by_context(context)
                .await?
                .into_iter()
                .find(|s| s.id == id))
        }

        async fn save(&self, session: &Session) -> Result<()> {
            self.sessions
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert((session.context.clone(), session.id), session.clone());
            Ok(())
        }
    }

}
