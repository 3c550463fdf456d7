//! Debug and tracing configuration

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Verbosity of the `ptydeck` tracing targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TraceLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl TraceLevel {
    /// Least to most verbose.
    pub const ALL: [Self; 5] = [
        Self::Error,
        Self::Warn,
        Self::Info,
        Self::Debug,
        Self::Trace,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }

    /// Accepted spellings, for CLI value lists and error messages.
    pub fn names() -> [&'static str; 5] {
        Self::ALL.map(Self::as_str)
    }

    /// `EnvFilter` directive enabling this level for every `ptydeck.*` target.
    pub fn filter_directive(self) -> String {
        format!("ptydeck={}", self.as_str())
    }
}

impl fmt::Display for TraceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTraceLevel(pub String);

impl fmt::Display for UnknownTraceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown trace level '{}' (expected one of: {})",
            self.0,
            TraceLevel::names().join(", ")
        )
    }
}

impl std::error::Error for UnknownTraceLevel {}

impl FromStr for TraceLevel {
    type Err = UnknownTraceLevel;

    /// Case-insensitive; `warning` is accepted for `warn`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        if value.eq_ignore_ascii_case("warning") {
            return Ok(Self::Warn);
        }
        Self::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(value))
            .ok_or_else(|| UnknownTraceLevel(value.to_owned()))
    }
}

// A typo in the config file falls back to the default level instead of
// rejecting the whole file; the CLI flag stays strict.
impl<'de> Deserialize<'de> for TraceLevel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(raw.parse().unwrap_or_default())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, Default)]
pub struct DebugConfig {
    #[serde(default)]
    pub trace_level: TraceLevel,

    /// Directory for the log file written by interactive sessions.
    /// Defaults to the platform data directory.
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}
