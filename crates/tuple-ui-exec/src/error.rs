//! Execution error types.

use std::time::Duration;

use thiserror::Error;

/// Errors from launching or supervising an external command.
///
/// A non-zero exit is not an error: the CLI uses exit codes to report domain
/// failures, which arrive as a normal [`CommandResult`](crate::CommandResult).
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("Failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} timed out after {}s and was terminated", timeout.as_secs_f32())]
    Timeout { program: String, timeout: Duration },

    #[error("Another command is still running")]
    Busy,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for execution operations.
pub type ExecResult<T> = Result<T, ExecError>;
