//! PTY process abstraction.
//!
//! A backend spawns a shell attached to a pseudo-terminal and hands back a
//! [`PtyProcess`] for control plus a [`ProcessEvents`] stream carrying output
//! and the final exit notification.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use tokio::sync::mpsc;

use crate::error::ProcessError;

mod memory;
mod native;

pub use memory::{MemoryHandle, MemorySpawner};
pub use native::NativePtySpawner;

/// Terminal geometry in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PtySize {
    pub cols: u16,
    pub rows: u16,
}

impl PtySize {
    pub fn new(cols: u16, rows: u16) -> Self {
        Self { cols, rows }
    }
}

impl From<PtySize> for portable_pty::PtySize {
    fn from(size: PtySize) -> Self {
        Self {
            rows: size.rows,
            cols: size.cols,
            pixel_width: 0,
            pixel_height: 0,
        }
    }
}

/// Everything a backend needs to start a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnRequest {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub env: BTreeMap<String, String>,
    pub size: PtySize,
}

/// How a process ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitReason {
    Code(u32),
    Signal(String),
}

impl ExitReason {
    /// The line shown in the terminal once the process is gone.
    pub fn notice(&self) -> String {
        match self {
            Self::Code(code) => format!("\r\nProcess exited with code {code}\r\n"),
            Self::Signal(signal) => format!("\r\nProcess terminated with signal {signal}\r\n"),
        }
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Code(code) => write!(f, "code {code}"),
            Self::Signal(signal) => write!(f, "signal {signal}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessEvent {
    /// Decoded output, in the order the OS delivered it.
    Data(String),
    /// Sent once, after all output.
    Exit(ExitReason),
}

pub type ProcessEvents = mpsc::UnboundedReceiver<ProcessEvent>;

/// Control half of a running PTY process.
///
/// Methods take `&self` and synchronize internally, so a slow `write` never
/// holds up `kill` or `resize` on the same process.
pub trait PtyProcess: Send + Sync {
    fn write(&self, data: &[u8]) -> Result<(), ProcessError>;
    fn resize(&self, size: PtySize) -> Result<(), ProcessError>;
    fn kill(&self) -> Result<(), ProcessError>;
    fn pid(&self) -> Option<u32>;
}

pub struct SpawnedProcess {
    pub process: Box<dyn PtyProcess>,
    pub events: ProcessEvents,
}

impl fmt::Debug for SpawnedProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpawnedProcess")
            .field("pid", &self.process.pid())
            .finish_non_exhaustive()
    }
}

/// Starts PTY processes.
pub trait PtySpawner: Send + Sync {
    fn spawn(&self, request: SpawnRequest) -> Result<SpawnedProcess, ProcessError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_notice_names_code_or_signal() {
        assert_eq!(
            ExitReason::Code(0).notice(),
            "\r\nProcess exited with code 0\r\n"
        );
        let signal = ExitReason::Signal("SIGTERM".to_owned()).notice();
        assert!(signal.contains("terminated with signal SIGTERM"));
        assert!(!signal.contains("code"));
    }
}
