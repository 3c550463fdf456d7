use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::defaults;

/// Shell launch overrides
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ShellConfig {
    /// Preferred shell program (falls back to platform discovery when unset)
    #[serde(default)]
    pub program: Option<String>,

    /// Extra arguments appended after the shell-specific defaults
    #[serde(default)]
    pub args: Vec<String>,

    /// Extra environment variables layered over the inherited environment
    #[serde(default)]
    pub env: BTreeMap<String, String>,

    /// `LANG` exported to shells on Windows
    #[serde(default = "default_windows_lang")]
    pub windows_lang: String,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            program: None,
            args: Vec::new(),
            env: BTreeMap::new(),
            windows_lang: default_windows_lang(),
        }
    }
}

impl ShellConfig {
    /// The configured program, ignoring blank values.
    pub fn preferred_program(&self) -> Option<&str> {
        self.program
            .as_deref()
            .map(str::trim)
            .filter(|program| !program.is_empty())
    }
}

fn default_windows_lang() -> String {
    defaults::DEFAULT_WINDOWS_LANG.to_owned()
}
