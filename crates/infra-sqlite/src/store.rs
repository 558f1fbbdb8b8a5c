// SQLite ContextRepository / SessionRepository Implementation

use async_trait::async_trait;
use sqlx::SqlitePool;
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::map_sqlx_error;
use notebook_core::domain::{InterpreterContext, Session, SessionId};
use notebook_core::error::Result;
use notebook_core::port::{ContextRepository, SessionRepository};

#[derive(sqlx::FromRow)]
struct ContextRow {
    name: String,
    executable_path: String,
}

impl From<ContextRow> for InterpreterContext {
    fn from(row: ContextRow) -> Self {
        InterpreterContext::new(row.name, row.executable_path)
    }
}

#[derive(sqlx::FromRow)]
struct HistoryRow {
    session_id: SessionId,
    fragment: String,
}

/// Contexts and the session arena in one SQLite database
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContextRepository for SqliteStore {
    async fn find_by_language_name(&self, name: &str) -> Result<Option<InterpreterContext>> {
        let row: Option<ContextRow> = sqlx::query_as(
            "SELECT name, executable_path FROM interpreter_contexts WHERE name = ?",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(InterpreterContext::from))
    }

    async fn save(&self, context: &InterpreterContext) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO interpreter_contexts (name, executable_path) VALUES (?, ?)
            ON CONFLICT(name) DO UPDATE SET executable_path = excluded.executable_path
            "#,
        )
        .bind(&context.name)
        .bind(context.executable_path.to_string_lossy().into_owned())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        debug!(context = %context.name, "Saved interpreter context");
        Ok(())
    }
}

#[async_trait]
impl SessionRepository for SqliteStore {
    async fn find_by_context(&self, context: &str) -> Result<Vec<Session>> {
        let ids: Vec<SessionId> =
            sqlx::query_scalar("SELECT id FROM sessions WHERE context_name = ? ORDER BY id")
                .bind(context)
                .fetch_all(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        let rows: Vec<HistoryRow> = sqlx::query_as(
            r#"
            SELECT session_id, fragment FROM session_history
            WHERE context_name = ?
            ORDER BY session_id, position
            "#,
        )
        .bind(context)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let mut sessions: BTreeMap<SessionId, Session> = ids
            .into_iter()
            .map(|id| (id, Session::new(id, context)))
            .collect();
        for row in rows {
            if let Some(session) = sessions.get_mut(&row.session_id) {
                session.append(row.fragment);
            }
        }

        Ok(sessions.into_values().collect())
    }

    async fn find_session(&self, context: &str, id: SessionId) -> Result<Option<Session>> {
        let exists: Option<SessionId> =
            sqlx::query_scalar("SELECT id FROM sessions WHERE context_name = ? AND id = ?")
                .bind(context)
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx_error)?;
        if exists.is_none() {
            return Ok(None);
        }

        let history: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT fragment FROM session_history
            WHERE context_name = ? AND session_id = ?
            ORDER BY position
            "#,
        )
        .bind(context)
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(Some(Session::new(id, context).with_history(history)))
    }

    async fn save(&self, session: &Session) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        sqlx::query(
            "INSERT INTO sessions (context_name, id) VALUES (?, ?) ON CONFLICT DO NOTHING",
        )
        .bind(&session.context)
        .bind(session.id)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        sqlx::query("DELETE FROM session_history WHERE context_name = ? AND session_id = ?")
            .bind(&session.context)
            .bind(session.id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        for (position, fragment) in session.history.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO session_history (context_name, session_id, position, fragment)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(&session.context)
            .bind(session.id)
            .bind(position as i64)
            .bind(fragment)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        }

        tx.commit().await.map_err(map_sqlx_error)?;

        debug!(session = %session.key(), fragments = session.history.len(), "Saved session");
        Ok(())
    }
}
