// Python interpreter handler

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

use super::{
    build_code, ensure_executable, run_command_line, HandlerError, InterpreterHandler,
    Interpretation, LanguageSettings, QuoteStyle,
};
use crate::application::constants::DEFAULT_SEPARATOR;
use crate::domain::{ClassifiedRequest, InterpreterContext, Session};
use crate::port::ProcessRunner;

/// Runs code through `<python> -c <code>`.
///
/// Tracebacks make the interpreter exit non-zero, so runtime errors in user
/// code come back as `error` results carrying the captured traceback.
pub struct PythonHandler {
    language: String,
    runner: Arc<dyn ProcessRunner>,
}

impl PythonHandler {
    pub fn new(
        context: &InterpreterContext,
        runner: Arc<dyn ProcessRunner>,
    ) -> Result<Self, HandlerError> {
        debug!(language = %context.name, "Initializing python handler");
        ensure_executable(context)?;
        Ok(Self {
            language: context.name.clone(),
            runner,
        })
    }

    /// HandlerFactory entry
    pub fn create(
        context: &InterpreterContext,
        runner: Arc<dyn ProcessRunner>,
    ) -> Result<Arc<dyn InterpreterHandler>, HandlerError> {
        Ok(Arc::new(Self::new(context, runner)?))
    }
}

#[async_trait]
impl InterpreterHandler for PythonHandler {
    fn language(&self) -> &str {
        &self.language
    }

    async fn interpret(
        &self,
        request: &ClassifiedRequest,
        context: &InterpreterContext,
        session: Option<&Session>,
        settings: &LanguageSettings,
    ) -> Interpretation {
        info!(language = %context.name, "Interpreting request");
        if session.is_none() {
            debug!("No session for the request, executing request code solo");
        }
        let separator = settings.separator_or(DEFAULT_SEPARATOR);
        let code = build_code(session, &request.code, separator, QuoteStyle::Normalize);
        run_command_line(self.runner.as_ref(), context, code, settings).await
    }
}
