/// Default values shared by the config structs and their serde fallbacks.
pub mod defaults {
    pub const DEFAULT_PTY_COLS: u16 = 80;
    pub const DEFAULT_PTY_ROWS: u16 = 30;
    /// Roughly one display frame; PTY output is batched at this cadence.
    pub const DEFAULT_COALESCE_INTERVAL_MS: u64 = 16;
    /// Delay before the legacy Windows command interpreter receives its init sequence.
    pub const DEFAULT_LEGACY_INIT_DELAY_MS: u64 = 200;

    pub const DEFAULT_SCROLLBACK_LINES: usize = 10_000;
    pub const DEFAULT_FIT_DELAY_MS: u64 = 50;
    pub const DEFAULT_FRAME_INTERVAL_MS: u64 = 16;
    pub const DEFAULT_FONT_FAMILY: &str = "\"Consolas\", \"Courier New\", monospace";
    pub const DEFAULT_FONT_SIZE: u16 = 14;

    pub const DEFAULT_PASTE_SUBMIT_DELAY_MS: u64 = 80;

    pub const DEFAULT_WINDOWS_LANG: &str = "en_US.UTF-8";
}

pub mod files {
    pub const CONFIG_FILE_NAME: &str = "ptydeck.toml";
    pub const CONFIG_DIR_NAME: &str = "ptydeck";
    pub const CONFIG_PATH_ENV_VAR: &str = "PTYDECK_CONFIG";
    pub const LOG_FILE_NAME: &str = "ptydeck.log";
}
