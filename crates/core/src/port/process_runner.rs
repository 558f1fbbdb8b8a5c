// Process Runner Port
// Abstraction for running one interpreter process with a wall-clock limit

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Captured outcome of a process that ran to exit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
    /// Stdout and stderr merged in arrival order (best effort)
    pub output: String,
    pub duration_ms: i64,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Execution errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    #[error("Spawn failed: {0}")]
    SpawnFailed(String),

    #[error("Process timeout after {0}ms")]
    Timeout(i64),

    #[error("IO error: {0}")]
    IoError(String),
}

/// Process Runner trait
///
/// Implementations:
/// - SubprocessRunner: spawns an external process (infra-system)
/// - MockProcessRunner: scripted responses with a call counter (tests)
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run `program` with `args` and capture its combined output
    ///
    /// # Errors
    /// - ExecutionError::SpawnFailed if the process cannot be started
    /// - ExecutionError::Timeout if it is still running after `timeout`
    ///   (it has been killed and reaped by then)
    /// - ExecutionError::IoError if reading its output fails
    async fn run(
        &self,
        program: &Path,
        args: &[String],
        timeout: Duration,
    ) -> Result<ProcessOutput, ExecutionError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex, PoisonError};

    type Responder = dyn Fn(&[String]) -> Result<ProcessOutput, ExecutionError> + Send + Sync;

    /// Mock Process Runner for testing
    ///
    /// Records every invocation so tests can assert that no process was
    /// started (spy) or inspect the code that would have run.
    pub struct MockProcessRunner {
        responder: Box<Responder>,
        calls: Arc<Mutex<Vec<Vec<String>>>>,
    }

    impl MockProcessRunner {
        pub fn with_responder<F>(responder: F) -> Self
        where
            F: Fn(&[String]) -> Result<ProcessOutput, ExecutionError> + Send + Sync + 'static,
        {
            Self {
                responder: Box::new(responder),
                calls: Arc::new(Mutex::new(Vec::new())),
            }
        }

        /// Always exit 0 with `output`
        pub fn new_success(output: impl Into<String>) -> Self {
            let output = output.into();
            Self::with_responder(move |_| Ok(exited(0, output.clone())))
        }

        /// Always exit with `code` and `output`
        pub fn new_exit(code: i32, output: impl Into<String>) -> Self {
            let output = output.into();
            Self::with_responder(move |_| Ok(exited(code, output.clone())))
        }

        pub fn new_fail(message: impl Into<String>) -> Self {
            let message = message.into();
            Self::with_responder(move |_| Err(ExecutionError::SpawnFailed(message.clone())))
        }

        pub fn new_timeout(ms: i64) -> Self {
            Self::with_responder(move |_| Err(ExecutionError::Timeout(ms)))
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
        }

        /// Arguments of the most recent call
        pub fn last_args(&self) -> Option<Vec<String>> {
            self.calls
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .last()
                .cloned()
        }
    }

    /// Build a ProcessOutput for a clean exit with `code`
    pub fn exited(code: i32, output: impl Into<String>) -> ProcessOutput {
        ProcessOutput {
            exit_code: Some(code),
            output: output.into(),
            duration_ms: 1,
        }
    }

    #[async_trait]
    impl ProcessRunner for MockProcessRunner {
        async fn run(
            &self,
            _program: &Path,
            args: &[String],
            _timeout: Duration,
        ) -> Result<ProcessOutput, ExecutionError> {
            self.calls
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(args.to_vec());
            (self.responder)(args)
        }
    }
}
