use std::time::Duration;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

use crate::constants::defaults;

/// Color scheme applied to every display surface
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Dark,
    Light,
}

impl ThemeMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dark => "dark",
            Self::Light => "light",
        }
    }
}

/// Display-side settings for terminal panes
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ClientConfig {
    /// Lines of history kept by each display's render state
    #[serde(default = "default_scrollback_lines")]
    pub scrollback_lines: usize,

    /// Delay between attaching a surface and measuring it
    #[serde(default = "default_fit_delay_ms")]
    pub fit_delay_ms: u64,

    /// Frame cadence used by hosts without a native redraw callback
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,

    #[serde(default)]
    pub theme: ThemeMode,

    #[serde(default = "default_font_family")]
    pub font_family: String,

    #[serde(default = "default_font_size")]
    pub font_size: u16,

    #[serde(default = "default_cursor_blink")]
    pub cursor_blink: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            scrollback_lines: default_scrollback_lines(),
            fit_delay_ms: default_fit_delay_ms(),
            frame_interval_ms: default_frame_interval_ms(),
            theme: ThemeMode::default(),
            font_family: default_font_family(),
            font_size: default_font_size(),
            cursor_blink: default_cursor_blink(),
        }
    }
}

impl ClientConfig {
    pub fn fit_delay(&self) -> Duration {
        Duration::from_millis(self.fit_delay_ms)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.frame_interval_ms == 0 {
            bail!("client.frame_interval_ms must be greater than zero");
        }
        if self.font_size == 0 {
            bail!("client.font_size must be greater than zero");
        }
        Ok(())
    }
}

/// Key sequence sent to submit a pasted block
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    #[default]
    Cr,
    Lf,
    Crlf,
}

impl LineEnding {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cr => "\r",
            Self::Lf => "\n",
            Self::Crlf => "\r\n",
        }
    }
}

/// Paste behaviour for text injected from outside the terminal
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct PasteConfig {
    /// Let the render state decide on bracketed-paste framing. When disabled
    /// every paste is wrapped in bracketed-paste markers unconditionally.
    #[serde(default = "default_native_paste")]
    pub native: bool,

    /// Send a line ending after the paste
    #[serde(default = "default_auto_submit")]
    pub auto_submit: bool,

    #[serde(default = "default_submit_delay_ms")]
    pub submit_delay_ms: u64,

    #[serde(default)]
    pub submit_key: LineEnding,
}

impl Default for PasteConfig {
    fn default() -> Self {
        Self {
            native: default_native_paste(),
            auto_submit: default_auto_submit(),
            submit_delay_ms: default_submit_delay_ms(),
            submit_key: LineEnding::default(),
        }
    }
}

impl PasteConfig {
    pub fn submit_delay(&self) -> Duration {
        Duration::from_millis(self.submit_delay_ms)
    }
}

fn default_scrollback_lines() -> usize {
    defaults::DEFAULT_SCROLLBACK_LINES
}

fn default_fit_delay_ms() -> u64 {
    defaults::DEFAULT_FIT_DELAY_MS
}

fn default_frame_interval_ms() -> u64 {
    defaults::DEFAULT_FRAME_INTERVAL_MS
}

fn default_font_family() -> String {
    defaults::DEFAULT_FONT_FAMILY.to_owned()
}

fn default_font_size() -> u16 {
    defaults::DEFAULT_FONT_SIZE
}

fn default_cursor_blink() -> bool {
    true
}

fn default_native_paste() -> bool {
    true
}

fn default_auto_submit() -> bool {
    true
}

fn default_submit_delay_ms() -> u64 {
    defaults::DEFAULT_PASTE_SUBMIT_DELAY_MS
}
