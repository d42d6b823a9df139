//! External command runner.

use std::io;
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{debug, warn};
use tuple_ui_core::CommandRequest;

use crate::error::{ExecError, ExecResult};

/// Deadline applied when a request does not carry its own.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Captured outcome of one finished process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    /// Exit code, or -1 when the process was ended by a signal
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

impl CommandResult {
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Launches external commands on the tokio runtime.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    default_timeout: Duration,
}

impl Default for CommandRunner {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl CommandRunner {
    #[must_use]
    pub fn new(default_timeout: Duration) -> Self {
        Self { default_timeout }
    }

    /// Run a request to completion, capturing stdout and stderr.
    ///
    /// The process is killed if the returned future is dropped.
    ///
    /// # Errors
    /// Returns [`ExecError::Launch`] if the executable cannot be started and
    /// [`ExecError::Timeout`] if it outlives its deadline, in which case it is
    /// killed and reaped before returning.
    pub async fn run(&self, request: &CommandRequest) -> ExecResult<CommandResult> {
        let program = request.program().display().to_string();
        let timeout = request.timeout().unwrap_or(self.default_timeout);
        let started = Instant::now();

        let mut child = Command::new(request.program())
            .args(request.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ExecError::Launch { program: program.clone(), source })?;

        debug!(%program, pid = ?child.id(), args = ?request.args(), "Process started");

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let finished = tokio::time::timeout(timeout, async {
            tokio::try_join!(child.wait(), read_pipe(stdout), read_pipe(stderr))
        })
        .await;

        let (status, stdout, stderr) = match finished {
            Ok(result) => result?,
            Err(_) => {
                warn!(%program, ?timeout, "Command timed out, terminating");
                if let Err(e) = child.kill().await {
                    warn!(%program, error = %e, "Failed to kill timed-out process");
                }
                return Err(ExecError::Timeout { program, timeout });
            }
        };

        let result = CommandResult {
            exit_code: status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
            duration: started.elapsed(),
        };

        debug!(
            %program,
            exit_code = result.exit_code,
            elapsed_ms = result.duration.as_millis(),
            "Process finished"
        );
        Ok(result)
    }
}

async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<R>) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buf).await?;
    }
    Ok(buf)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn sh(script: &str) -> CommandRequest {
        CommandRequest::new("sh", vec!["-c".into(), script.into()])
    }

    #[tokio::test]
    async fn test_captures_stdout_and_stderr() {
        let runner = CommandRunner::default();
        let result = runner.run(&sh("echo hello; echo oops >&2")).await.unwrap();

        assert!(result.success());
        assert_eq!(result.stdout, "hello\n");
        assert_eq!(result.stderr, "oops\n");
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_a_result() {
        let runner = CommandRunner::default();
        let result = runner.run(&sh("echo 'not logged in' >&2; exit 3")).await.unwrap();

        assert!(!result.success());
        assert_eq!(result.exit_code, 3);
        assert_eq!(result.stderr, "not logged in\n");
    }

    #[tokio::test]
    async fn test_missing_executable_is_launch_error() {
        let runner = CommandRunner::default();
        let request = CommandRequest::new("/nonexistent/tuple-cli", vec!["status".into()]);

        assert_matches!(
            runner.run(&request).await,
            Err(ExecError::Launch { program, .. }) if program == "/nonexistent/tuple-cli"
        );
    }

    #[tokio::test]
    async fn test_timeout_kills_the_process() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("finished");
        let script = format!("sleep 2; touch {}", marker.display());
        let request = sh(&script).with_timeout(Duration::from_millis(100));

        let started = Instant::now();
        let outcome = CommandRunner::default().run(&request).await;

        assert_matches!(outcome, Err(ExecError::Timeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(2));

        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert!(!marker.exists(), "timed-out process kept running");
    }

    #[tokio::test]
    async fn test_request_timeout_overrides_default() {
        let runner = CommandRunner::new(Duration::from_millis(50));
        let request = sh("sleep 0.2; echo done").with_timeout(Duration::from_secs(5));

        let result = runner.run(&request).await.unwrap();
        assert_eq!(result.stdout, "done\n");
        assert!(result.duration >= Duration::from_millis(200));
    }
}
