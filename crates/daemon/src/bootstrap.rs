//! Startup seeding of interpreter contexts

use tracing::info;

use notebook_core::domain::{InterpreterContext, Session, SessionId};
use notebook_core::port::{ContextRepository, SessionRepository};
use notebook_core::Result;

/// Save every context that is not registered yet; existing ones are left untouched
pub async fn seed_contexts(
    contexts: &dyn ContextRepository,
    wanted: &[InterpreterContext],
) -> Result<usize> {
    let mut created = 0;
    for context in wanted {
        if contexts.find_by_language_name(&context.name).await?.is_some() {
            continue;
        }
        info!(
            language = %context.name,
            path = %context.executable_path().display(),
            "Registering interpreter context"
        );
        contexts.save(context).await?;
        created += 1;
    }
    Ok(created)
}

/// Make sure `id` exists under `context`, without touching its history
pub async fn seed_session(
    sessions: &dyn SessionRepository,
    context: &str,
    id: SessionId,
) -> Result<bool> {
    if sessions.find_session(context, id).await?.is_some() {
        return Ok(false);
    }

    info!(context = %context, session_id = id, "Seeding default session");
    sessions.save(&Session::new(id, context)).await?;
    Ok(true)
}
