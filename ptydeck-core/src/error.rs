use std::io;

use thiserror::Error;

/// Failures raised by a PTY backend.
///
/// The native backend reports its errors as `anyhow` values, so the messages
/// are captured as strings instead of being chained as sources.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to spawn '{shell}': {message}")]
    Spawn { shell: String, message: String },

    #[error("failed to write to pty: {0}")]
    Write(String),

    #[error("failed to resize pty: {0}")]
    Resize(String),

    #[error("failed to kill pty child: {0}")]
    Kill(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl ProcessError {
    pub fn spawn(shell: impl Into<String>, message: impl ToString) -> Self {
        Self::Spawn {
            shell: shell.into(),
            message: message.to_string(),
        }
    }
}
