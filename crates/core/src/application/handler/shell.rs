// POSIX shell interpreter handler

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

use super::{
    build_code, ensure_executable, run_command_line, HandlerError, InterpreterHandler,
    Interpretation, LanguageSettings, QuoteStyle,
};
use crate::domain::{ClassifiedRequest, InterpreterContext, Session};
use crate::port::ProcessRunner;

/// Shell scripts are line-oriented: history fragments go on separate lines
const SHELL_DEFAULT_SEPARATOR: &str = "\n";

/// Runs code through `<sh> -c <code>`.
///
/// The script's exit status decides the outcome: a non-zero status is an
/// `error` result that still carries whatever the script printed before.
///
/// Code is handed to the shell verbatim. The script is a single argv element,
/// so double quotes keep their shell meaning (`echo "$X"` expands `X`).
pub struct ShellHandler {
    language: String,
    runner: Arc<dyn ProcessRunner>,
}

impl ShellHandler {
    pub fn new(
        context: &InterpreterContext,
        runner: Arc<dyn ProcessRunner>,
    ) -> Result<Self, HandlerError> {
        debug!(language = %context.name, "Initializing shell handler");
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
impl InterpreterHandler for ShellHandler {
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
        info!(language = %context.name, with_session = session.is_some(), "Interpreting request");
        let separator = settings.separator_or(SHELL_DEFAULT_SEPARATOR);
        let code = build_code(session, &request.code, separator, QuoteStyle::Verbatim);
        run_command_line(self.runner.as_ref(), context, code, settings).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RequestStatus;
    use crate::port::process_runner::mocks::MockProcessRunner;

    #[tokio::test]
    async fn test_history_on_separate_lines() {
        let exe = tempfile::NamedTempFile::new().unwrap();
        let context = InterpreterContext::new("shell", exe.path());
        let runner = Arc::new(MockProcessRunner::new_success("1"));
        let handler = ShellHandler::new(&context, runner.clone()).unwrap();
        assert_eq!(handler.language(), "shell");

        let session = Session::new(1, "shell").with_history(vec!["X=1".to_string()]);
        let request = ClassifiedRequest::new("shell", "echo $X", Some(1), RequestStatus::Good);
        let outcome = handler
            .interpret(&request, &context, Some(&session), &LanguageSettings::default())
            .await;

        assert!(outcome.completed);
        assert_eq!(runner.last_args().unwrap()[1], "X=1\necho $X");
    }

    #[tokio::test]
    async fn test_double_quotes_reach_the_shell() {
        let exe = tempfile::NamedTempFile::new().unwrap();
        let context = InterpreterContext::new("shell", exe.path());
        let runner = Arc::new(MockProcessRunner::new_success(""));
        let handler = ShellHandler::new(&context, runner.clone()).unwrap();

        let request =
            ClassifiedRequest::new("shell", "echo \"$HOME\"", None, RequestStatus::NoNeedForSession);
        handler
            .interpret(&request, &context, None, &LanguageSettings::default())
            .await;

        assert_eq!(runner.last_args().unwrap()[1], "echo \"$HOME\"");
    }
}
