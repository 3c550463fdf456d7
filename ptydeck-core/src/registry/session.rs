use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::coalesce::OutputCoalescer;
use crate::process::{PtyProcess, PtySize};

/// One live shell. The process handle is never swapped; tearing a session
/// down removes the whole record.
pub(super) struct Session {
    pub(super) serial: u64,
    pub(super) shell: PathBuf,
    pub(super) working_dir: PathBuf,
    pub(super) process: Arc<dyn PtyProcess>,
    pub(super) output: OutputCoalescer,
    pub(super) size: PtySize,
    pub(super) pid: Option<u32>,
    pub(super) started_at: Instant,
}

impl Session {
    pub(super) fn matches(&self, serial: u64) -> bool {
        self.serial == serial
    }

    pub(super) fn info(&self, id: &str) -> SessionInfo {
        SessionInfo {
            id: id.to_owned(),
            shell: self.shell.clone(),
            working_dir: self.working_dir.clone(),
            pid: self.pid,
            size: self.size,
            uptime: self.started_at.elapsed(),
        }
    }
}

/// Snapshot of a live session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub id: String,
    pub shell: PathBuf,
    pub working_dir: PathBuf,
    pub pid: Option<u32>,
    pub size: PtySize,
    pub uptime: Duration,
}
