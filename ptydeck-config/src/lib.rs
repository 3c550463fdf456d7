//! Configuration for ptydeck.
//!
//! Every section carries serde defaults so a partial (or empty) `ptydeck.toml`
//! still produces a complete [`PtydeckConfig`].

pub mod client;
pub mod constants;
pub mod debug;
pub mod loader;
pub mod pty;
pub mod shell;
pub mod terminals;

use serde::{Deserialize, Serialize};

pub use client::{ClientConfig, LineEnding, PasteConfig, ThemeMode};
pub use debug::{DebugConfig, TraceLevel, UnknownTraceLevel};
pub use loader::{ConfigLoader, ConfigSource};
pub use pty::PtyConfig;
pub use shell::ShellConfig;
pub use terminals::{TerminalSlot, default_terminal_slots};

/// Main configuration structure for ptydeck
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct PtydeckConfig {
    /// PTY geometry and output coalescing
    #[serde(default)]
    pub pty: PtyConfig,

    /// Shell selection and environment
    #[serde(default)]
    pub shell: ShellConfig,

    /// Display instance settings
    #[serde(default)]
    pub client: ClientConfig,

    /// Paste-to-terminal behaviour
    #[serde(default)]
    pub paste: PasteConfig,

    /// Terminal slots offered by hosts
    #[serde(default = "default_terminal_slots")]
    pub terminals: Vec<TerminalSlot>,

    /// Debug and tracing settings
    #[serde(default)]
    pub debug: DebugConfig,
}

impl Default for PtydeckConfig {
    fn default() -> Self {
        Self {
            pty: PtyConfig::default(),
            shell: ShellConfig::default(),
            client: ClientConfig::default(),
            paste: PasteConfig::default(),
            terminals: default_terminal_slots(),
            debug: DebugConfig::default(),
        }
    }
}
