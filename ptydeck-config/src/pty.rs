use std::time::Duration;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

use crate::constants::defaults;

/// Registry-side PTY settings
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct PtyConfig {
    /// Columns of a freshly spawned session
    #[serde(default = "default_pty_cols")]
    pub default_cols: u16,

    /// Rows of a freshly spawned session
    #[serde(default = "default_pty_rows")]
    pub default_rows: u16,

    /// How long PTY output accumulates before it is forwarded as one message.
    /// Zero flushes on the next scheduler turn.
    #[serde(default = "default_coalesce_interval_ms")]
    pub coalesce_interval_ms: u64,

    /// Delay before `chcp 65001` / `cls` is sent to a freshly started `cmd.exe`
    #[serde(default = "default_legacy_init_delay_ms")]
    pub legacy_init_delay_ms: u64,
}

impl Default for PtyConfig {
    fn default() -> Self {
        Self {
            default_cols: default_pty_cols(),
            default_rows: default_pty_rows(),
            coalesce_interval_ms: default_coalesce_interval_ms(),
            legacy_init_delay_ms: default_legacy_init_delay_ms(),
        }
    }
}

impl PtyConfig {
    pub fn coalesce_interval(&self) -> Duration {
        Duration::from_millis(self.coalesce_interval_ms)
    }

    pub fn legacy_init_delay(&self) -> Duration {
        Duration::from_millis(self.legacy_init_delay_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_cols == 0 || self.default_rows == 0 {
            bail!(
                "pty geometry must be non-zero (got {}x{})",
                self.default_cols,
                self.default_rows
            );
        }
        Ok(())
    }
}

fn default_pty_cols() -> u16 {
    defaults::DEFAULT_PTY_COLS
}

fn default_pty_rows() -> u16 {
    defaults::DEFAULT_PTY_ROWS
}

fn default_coalesce_interval_ms() -> u64 {
    defaults::DEFAULT_COALESCE_INTERVAL_MS
}

fn default_legacy_init_delay_ms() -> u64 {
    defaults::DEFAULT_LEGACY_INIT_DELAY_MS
}
