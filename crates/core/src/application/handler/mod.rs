// Interpreter Handlers - per-language execution policy

mod python;
mod shell;

pub use python::PythonHandler;
pub use shell::ShellHandler;

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::application::constants::{
    COMMAND_FLAG, DEFAULT_TIMEOUT_MS, EXECUTION_ERROR_PREFIX, INTERPRETER_PROPERTY_PREFIX,
    LAUNCH_ERROR_PREFIX, SEPARATOR_PROPERTY, TIMEOUT_PROPERTY,
};
use crate::domain::{ClassifiedRequest, ExecutionResult, InterpreterContext, Session};
use crate::port::{ExecutionError, ProcessRunner};

/// Handler construction errors
#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("Interpreter '{language}' has no executable at {}", path.display())]
    MissingExecutable { language: String, path: PathBuf },
}

/// Builds a handler for a context; registered in the HandlerRegistry by type name
pub type HandlerFactory =
    fn(&InterpreterContext, Arc<dyn ProcessRunner>) -> Result<Arc<dyn InterpreterHandler>, HandlerError>;

/// Outcome of one interpretation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpretation {
    /// True iff the process ran to a clean exit within its timeout
    pub completed: bool,
    pub result: ExecutionResult,
}

impl Interpretation {
    pub fn completed(result: ExecutionResult) -> Self {
        Self {
            completed: true,
            result,
        }
    }

    pub fn failed(result: ExecutionResult) -> Self {
        Self {
            completed: false,
            result,
        }
    }
}

/// Interpreter Handler trait
///
/// One instance per language is shared by every call, so implementations
/// keep no per-call state: the session and settings arrive as arguments.
#[async_trait]
pub trait InterpreterHandler: Send + Sync {
    /// Language this instance was constructed for
    fn language(&self) -> &str;

    /// Run the request's code (preceded by the session history, if any)
    async fn interpret(
        &self,
        request: &ClassifiedRequest,
        context: &InterpreterContext,
        session: Option<&Session>,
        settings: &LanguageSettings,
    ) -> Interpretation;
}

/// Language-scoped properties, keys kept in full (`interpreter.<lang>.<key>`)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LanguageSettings {
    language: String,
    properties: BTreeMap<String, String>,
}

impl LanguageSettings {
    pub fn new(language: impl Into<String>, properties: BTreeMap<String, String>) -> Self {
        Self {
            language: language.into(),
            properties,
        }
    }

    /// `interpreter.<language>.`
    pub fn prefix_for(language: &str) -> String {
        format!("{}.{}.", INTERPRETER_PROPERTY_PREFIX, language)
    }

    /// Lookup by full key
    pub fn get(&self, full_key: &str) -> Option<&str> {
        self.properties.get(full_key).map(String::as_str)
    }

    /// Lookup by key relative to this language's prefix
    pub fn property(&self, key: &str) -> Option<&str> {
        self.get(&format!("{}{}", Self::prefix_for(&self.language), key))
    }

    /// `interpreter.<lang>.timeout` in milliseconds, default 5000
    pub fn timeout(&self) -> Duration {
        let millis = match self.property(TIMEOUT_PROPERTY) {
            Some(raw) => raw.trim().parse::<u64>().unwrap_or_else(|e| {
                warn!(language = %self.language, value = %raw, error = %e, "Invalid timeout, using default");
                DEFAULT_TIMEOUT_MS
            }),
            None => DEFAULT_TIMEOUT_MS,
        };
        Duration::from_millis(millis)
    }

    /// `interpreter.<lang>.separator`, or `default` when unset
    pub fn separator_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.property(SEPARATOR_PROPERTY).unwrap_or(default)
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

/// Fails when the context's executable path does not exist
pub(crate) fn ensure_executable(context: &InterpreterContext) -> Result<(), HandlerError> {
    if context.has_executable() {
        debug!(language = %context.name, path = %context.executable_path.display(), "Interpreter executable found");
        Ok(())
    } else {
        Err(HandlerError::MissingExecutable {
            language: context.name.clone(),
            path: context.executable_path.clone(),
        })
    }
}

/// How a handler rewrites quotes before its code reaches the interpreter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteStyle {
    /// `"` becomes `'` (string literals keep their meaning in python)
    Normalize,
    /// Code is passed through untouched
    Verbatim,
}

impl QuoteStyle {
    pub fn apply(self, code: &str) -> String {
        match self {
            QuoteStyle::Normalize => normalize_quotes(code),
            QuoteStyle::Verbatim => code.to_string(),
        }
    }
}

/// `"` becomes `'` so fragments survive being passed as one quoted argument.
///
/// Known weakness: no other shell metacharacter is escaped.
pub fn normalize_quotes(code: &str) -> String {
    code.replace('"', "'")
}

/// History fragments followed by the new code, joined by `separator`
pub fn build_code(
    session: Option<&Session>,
    code: &str,
    separator: &str,
    quotes: QuoteStyle,
) -> String {
    match session {
        Some(session) => session
            .history
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(code))
            .map(|fragment| quotes.apply(fragment))
            .collect::<Vec<_>>()
            .join(separator),
        None => quotes.apply(code),
    }
}

/// Run `<executable> -c <code>` and map the outcome onto a result
pub(crate) async fn run_command_line(
    runner: &dyn ProcessRunner,
    context: &InterpreterContext,
    code: String,
    settings: &LanguageSettings,
) -> Interpretation {
    let timeout = settings.timeout();
    let args = vec![COMMAND_FLAG.to_string(), code];

    info!(
        language = %context.name,
        timeout_ms = timeout.as_millis() as u64,
        "Executing interpretation"
    );

    match runner.run(context.executable_path(), &args, timeout).await {
        Ok(output) if output.success() => {
            info!(language = %context.name, duration_ms = output.duration_ms, "Interpretation was executed successfully");
            Interpretation::completed(ExecutionResult::ok(output.output.trim()))
        }
        Ok(output) => {
            let detail = match output.exit_code {
                Some(code) => format!("process exited with status {}", code),
                None => "process was terminated by a signal".to_string(),
            };
            debug!(language = %context.name, detail = %detail, "Interpreter reported an error");
            let captured = output.output.trim();
            let content = if captured.is_empty() {
                format!("{}{}", EXECUTION_ERROR_PREFIX, detail)
            } else {
                format!("{}{}\n{}", EXECUTION_ERROR_PREFIX, detail, captured)
            };
            Interpretation::failed(ExecutionResult::error(content))
        }
        Err(ExecutionError::Timeout(ms)) => {
            warn!(language = %context.name, timeout_ms = ms, "Interpretation timed out");
            Interpretation::failed(ExecutionResult::error(format!(
                "{}process timed out after {}ms",
                EXECUTION_ERROR_PREFIX, ms
            )))
        }
        Err(e) => {
            warn!(language = %context.name, error = %e, "Interpreter process could not be run");
            Interpretation::failed(ExecutionResult::error(format!("{}{}", LAUNCH_ERROR_PREFIX, e)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(pairs: &[(&str, &str)]) -> LanguageSettings {
        LanguageSettings::new(
            "python",
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_build_code_without_session() {
        assert_eq!(
            build_code(None, "print(\"hi\")", "|", QuoteStyle::Normalize),
            "print('hi')"
        );
    }

    #[test]
    fn test_build_code_with_history() {
        let session = Session::new(1, "python").with_history(vec![
            "a = \"x\"".to_string(),
            "b = 2".to_string(),
        ]);
        assert_eq!(
            build_code(Some(&session), "print(a, b)", "\n", QuoteStyle::Normalize),
            "a = 'x'\nb = 2\nprint(a, b)"
        );
        assert_eq!(
            build_code(Some(&Session::new(2, "python")), "print(1)", "|", QuoteStyle::Normalize),
            "print(1)"
        );
    }

    #[test]
    fn test_verbatim_keeps_double_quotes() {
        let session = Session::new(1, "shell").with_history(vec!["X=\"a b\"".to_string()]);
        assert_eq!(
            build_code(Some(&session), "echo \"$X\"", "\n", QuoteStyle::Verbatim),
            "X=\"a b\"\necho \"$X\""
        );
        assert_eq!(
            build_code(None, "echo \"$HOME\"", "\n", QuoteStyle::Verbatim),
            "echo \"$HOME\""
        );
    }

    #[test]
    fn test_settings_defaults() {
        let empty = settings(&[]);
        assert_eq!(empty.timeout(), Duration::from_millis(DEFAULT_TIMEOUT_MS));
        assert_eq!(empty.separator_or("|"), "|");
    }

    #[test]
    fn test_settings_read_full_keys() {
        let s = settings(&[
            ("interpreter.python.timeout", "250"),
            ("interpreter.python.separator", ";"),
        ]);
        assert_eq!(s.timeout(), Duration::from_millis(250));
        assert_eq!(s.separator_or("|"), ";");
        assert_eq!(s.get("interpreter.python.timeout"), Some("250"));
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn test_invalid_timeout_falls_back() {
        let s = settings(&[("interpreter.python.timeout", "soon")]);
        assert_eq!(s.timeout(), Duration::from_millis(DEFAULT_TIMEOUT_MS));
    }
}
