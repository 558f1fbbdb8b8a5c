// Subprocess runner implementation
// reason: async-trait, tokio for async process management
use async_trait::async_trait;
use std::io;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tracing::{debug, info, warn};

use notebook_core::port::{ExecutionError, ProcessOutput, ProcessRunner};

/// Environment variables passed through to interpreters by default
pub const DEFAULT_ENV_ALLOWLIST: &[&str] = &["PATH", "HOME", "USER", "LANG", "LC_ALL", "TMPDIR"];

const READ_CHUNK_BYTES: usize = 4096;

/// Subprocess runner
/// Spawns one isolated child per call with environment allowlisting
pub struct SubprocessRunner {
    env_allowlist: Vec<String>,
}

impl Default for SubprocessRunner {
    fn default() -> Self {
        Self::new(DEFAULT_ENV_ALLOWLIST.iter().map(|s| s.to_string()).collect())
    }
}

impl SubprocessRunner {
    /// Create a new subprocess runner
    ///
    /// # Arguments
    /// * `env_allowlist` - Variables copied from the server's environment;
    ///   everything else is cleared
    pub fn new(env_allowlist: Vec<String>) -> Self {
        Self { env_allowlist }
    }

    /// Allowlisted variables present in the current environment
    fn filtered_env(&self) -> Vec<(String, String)> {
        self.env_allowlist
            .iter()
            .filter_map(|key| std::env::var(key).ok().map(|value| (key.clone(), value)))
            .collect()
    }

    fn spawn(&self, program: &Path, args: &[String]) -> Result<Child, ExecutionError> {
        let mut command = Command::new(program);
        command
            .args(args)
            .env_clear()
            .envs(self.filtered_env())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Own process group so a timeout kill reaches grandchildren too
        #[cfg(unix)]
        {
            command.process_group(0);
        }

        command
            .spawn()
            .map_err(|e| ExecutionError::SpawnFailed(format!("{}: {}", program.display(), e)))
    }

    /// Read both pipes to EOF, then reap the child
    async fn wait_with_merged_output(child: &mut Child) -> io::Result<(Vec<u8>, ExitStatus)> {
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let output = read_merged(stdout, stderr).await?;
        let status = child.wait().await?;
        Ok((output, status))
    }

    /// Kill the whole process group with SIGKILL, then the child itself
    async fn kill_tree(child: &mut Child) {
        #[cfg(unix)]
        {
            use nix::sys::signal::{killpg, Signal};
            use nix::unistd::Pid;

            if let Some(pid) = child.id() {
                if let Err(e) = killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
                    debug!(pid = %pid, error = %e, "killpg failed, group already gone");
                }
            }
        }

        // Reaps the child; errors only when it already exited
        if let Err(e) = child.kill().await {
            debug!(error = %e, "Child already exited");
        }
    }
}

/// Interleave stdout and stderr in arrival order
async fn read_merged(
    mut stdout: Option<ChildStdout>,
    mut stderr: Option<ChildStderr>,
) -> io::Result<Vec<u8>> {
    let mut merged = Vec::new();
    let mut out_buf = [0u8; READ_CHUNK_BYTES];
    let mut err_buf = [0u8; READ_CHUNK_BYTES];

    while stdout.is_some() || stderr.is_some() {
        tokio::select! {
            read = read_chunk(&mut stdout, &mut out_buf), if stdout.is_some() => {
                match read? {
                    0 => stdout = None,
                    n => merged.extend_from_slice(&out_buf[..n]),
                }
            }
            read = read_chunk(&mut stderr, &mut err_buf), if stderr.is_some() => {
                match read? {
                    0 => stderr = None,
                    n => merged.extend_from_slice(&err_buf[..n]),
                }
            }
        }
    }

    Ok(merged)
}

async fn read_chunk<R: AsyncRead + Unpin>(
    reader: &mut Option<R>,
    buf: &mut [u8],
) -> io::Result<usize> {
    match reader {
        Some(reader) => reader.read(buf).await,
        None => Ok(0),
    }
}

#[async_trait]
impl ProcessRunner for SubprocessRunner {
    async fn run(
        &self,
        program: &Path,
        args: &[String],
        timeout: Duration,
    ) -> Result<ProcessOutput, ExecutionError> {
        let timeout_ms = timeout.as_millis() as i64;
        info!(
            program = %program.display(),
            timeout_ms = %timeout_ms,
            "Starting subprocess execution"
        );

        let start = Instant::now();
        let mut child = self.spawn(program, args)?;

        let waited =
            tokio::time::timeout(timeout, Self::wait_with_merged_output(&mut child)).await;

        match waited {
            Ok(Ok((output, status))) => {
                let duration_ms = start.elapsed().as_millis() as i64;
                info!(
                    program = %program.display(),
                    duration_ms = %duration_ms,
                    exit_code = ?status.code(),
                    "Subprocess execution completed"
                );
                Ok(ProcessOutput {
                    exit_code: status.code(),
                    output: String::from_utf8_lossy(&output).into_owned(),
                    duration_ms,
                })
            }
            Ok(Err(e)) => {
                Self::kill_tree(&mut child).await;
                Err(ExecutionError::IoError(e.to_string()))
            }
            Err(_) => {
                warn!(
                    program = %program.display(),
                    timeout_ms = %timeout_ms,
                    "Subprocess exceeded its time limit, killing process group"
                );
                Self::kill_tree(&mut child).await;
                Err(ExecutionError::Timeout(timeout_ms))
            }
        }
    }
}
