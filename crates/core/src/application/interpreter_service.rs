// Interpreter Service - classification and dispatch use cases

use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::application::classifier::RequestClassifier;
use crate::application::registry::HandlerRegistry;
use crate::application::session_lock::SessionLocks;
use crate::domain::{
    ClassifiedRequest, ExecutionResult, InterpreterContext, RequestStatus, Session, SessionId,
    SessionKey,
};
use crate::error::Result;
use crate::port::{ContextRepository, SessionRepository};

/// Dispatch orchestrator
///
/// Nothing escapes `dispatch`/`execute` as an error: every failure becomes
/// an `error` ExecutionResult.
pub struct InterpreterService {
    contexts: Arc<dyn ContextRepository>,
    sessions: Arc<dyn SessionRepository>,
    registry: Arc<HandlerRegistry>,
    classifier: RequestClassifier,
    session_locks: SessionLocks,
}

impl InterpreterService {
    pub fn new(
        contexts: Arc<dyn ContextRepository>,
        sessions: Arc<dyn SessionRepository>,
        registry: Arc<HandlerRegistry>,
        classifier: RequestClassifier,
    ) -> Self {
        Self {
            contexts,
            sessions,
            registry,
            classifier,
            session_locks: SessionLocks::new(),
        }
    }

    /// Pattern requests must match, as reported to callers
    pub fn request_pattern(&self) -> &str {
        self.classifier.pattern()
    }

    /// Classify `%<language> <body>` and confirm it against persisted state
    ///
    /// `None` when the input is rejected (pattern mismatch, no language or body).
    pub async fn classify_and_validate(
        &self,
        raw_code: &str,
        session_id: Option<&str>,
    ) -> Option<ClassifiedRequest> {
        info!("Validating user code");
        let mut request = self.classifier.classify(raw_code, session_id)?;

        let context = match self.contexts.find_by_language_name(&request.language).await {
            Ok(context) => context,
            Err(e) => {
                // Status left as parsed; dispatch reports the failure
                error!(language = %request.language, error = %e, "Context lookup failed during classification");
                return Some(request);
            }
        };

        let Some(context) = context else {
            warn!(language = %request.language, "Request has good syntax, but no interpreter was found for it");
            request.mark_no_interpreter();
            return Some(request);
        };

        if let Some(id) = request.session_id.filter(|_| request.needs_session()) {
            match self.find_session(&context, id).await {
                Ok(session) => request.confirm_session(session.is_some()),
                Err(e) => {
                    error!(language = %context.name, session_id = id, error = %e, "Session lookup failed during classification")
                }
            }
        }

        info!(
            language = %request.language,
            status = %request.status,
            code = request.status.code(),
            "Done parsing"
        );
        Some(request)
    }

    /// Run a classified request, creating its session and appending history as needed
    pub async fn dispatch(&self, request: &mut ClassifiedRequest) -> ExecutionResult {
        match self.try_dispatch(request).await {
            Ok(result) => result,
            Err(e) => {
                error!(language = %request.language, error = %e, "Dispatch failed");
                ExecutionResult::error(format!("Internal error: {}", e))
            }
        }
    }

    /// Classify then dispatch; the produced interface of the entry point
    pub async fn execute(&self, raw_code: &str, session_id: Option<&str>) -> ExecutionResult {
        match self.classify_and_validate(raw_code, session_id).await {
            Some(mut request) => self.dispatch(&mut request).await,
            None => ExecutionResult::error(format!(
                "Couldn't parse input code, check that it matches following regex : '{}'",
                self.request_pattern()
            )),
        }
    }

    async fn try_dispatch(&self, request: &mut ClassifiedRequest) -> Result<ExecutionResult> {
        let Some(context) = self
            .contexts
            .find_by_language_name(&request.language)
            .await?
        else {
            warn!(language = %request.language, "No interpreter context, nothing executed");
            request.mark_no_interpreter();
            return Ok(no_interpreter(&request.language));
        };

        match request.status {
            RequestStatus::NoNeedForSession => {
                warn!("No session is required for the request");
                Ok(self.interpret_stateless(request, &context).await)
            }
            RequestStatus::Good | RequestStatus::NoSessionId => match request.session_id {
                Some(id) => self.interpret_session_aware(request, &context, id).await,
                None => Ok(ExecutionResult::error(
                    "Request needs a session but carries no session id",
                )),
            },
            RequestStatus::NoInterpreterFound => Ok(no_interpreter(&request.language)),
            RequestStatus::WrongSyntax => Ok(ExecutionResult::error(format!(
                "Request for '{}' has wrong syntax",
                request.language
            ))),
        }
    }

    async fn interpret_stateless(
        &self,
        request: &ClassifiedRequest,
        context: &InterpreterContext,
    ) -> ExecutionResult {
        let Some(handler) = self.registry.resolve(context) else {
            return no_handler(&context.name);
        };
        let settings = self.registry.config_for(&context.name);
        handler.interpret(request, context, None, &settings).await.result
    }

    async fn interpret_session_aware(
        &self,
        request: &mut ClassifiedRequest,
        context: &InterpreterContext,
        id: SessionId,
    ) -> Result<ExecutionResult> {
        let key = SessionKey::new(context.name.clone(), id);
        let _guard = self.session_locks.acquire(key.clone()).await;

        let mut session = match self.find_session(context, id).await? {
            Some(session) => session,
            None => {
                info!(session = %key, "Request needs a new session, creating one");
                let session = Session::new(id, context.name.clone());
                self.sessions.save(&session).await?;
                session
            }
        };
        if request.is_new_session() {
            debug!("Marking the request as being ready for interpretation");
            request.promote_to_good()?;
        }

        let Some(handler) = self.registry.resolve(context) else {
            return Ok(no_handler(&context.name));
        };
        let settings = self.registry.config_for(&context.name);
        let outcome = handler
            .interpret(request, context, Some(&session), &settings)
            .await;

        // Only non-terminal code (clean run, no visible output) is replayed later
        if outcome.completed && outcome.result.content.is_empty() {
            info!(session = %key, "Saving interpreted code in session (non-terminal expression)");
            session.append(request.code.clone());
            self.sessions.save(&session).await?;
        } else {
            debug!(session = %key, "No need to save code in session (terminal expression)");
        }

        Ok(outcome.result)
    }

    async fn find_session(
        &self,
        context: &InterpreterContext,
        id: SessionId,
    ) -> Result<Option<Session>> {
        self.sessions.find_session(&context.name, id).await
    }
}

fn no_interpreter(language: &str) -> ExecutionResult {
    ExecutionResult::error(format!("No interpreter found for '{}'", language))
}

fn no_handler(language: &str) -> ExecutionResult {
    ExecutionResult::error(format!(
        "Interpreter '{}' is not available on this server",
        language
    ))
}
