use anyhow::{Context, Result, bail};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::constants::files;
use crate::PtydeckConfig;

impl PtydeckConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw).context("Failed to parse ptydeck configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&raw)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        self.pty.validate().context("Invalid pty configuration")?;
        self.client
            .validate()
            .context("Invalid client configuration")?;

        let mut seen = HashSet::new();
        for slot in &self.terminals {
            if slot.id.trim().is_empty() {
                bail!("terminal slot ids must not be empty");
            }
            if !seen.insert(slot.id.as_str()) {
                bail!("duplicate terminal slot id '{}'", slot.id);
            }
        }
        Ok(())
    }
}

/// Where the configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Defaults,
}

/// Resolves `ptydeck.toml` from an explicit path or a list of candidate locations.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    search_paths: Vec<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Candidates, in order: `$PTYDECK_CONFIG`, `./ptydeck.toml`,
    /// `<config dir>/ptydeck/ptydeck.toml`.
    pub fn new() -> Self {
        let mut search_paths = Vec::new();
        if let Some(path) = std::env::var_os(files::CONFIG_PATH_ENV_VAR) {
            if !path.is_empty() {
                search_paths.push(PathBuf::from(path));
            }
        }
        search_paths.push(PathBuf::from(files::CONFIG_FILE_NAME));
        if let Some(config_dir) = dirs::config_dir() {
            search_paths.push(
                config_dir
                    .join(files::CONFIG_DIR_NAME)
                    .join(files::CONFIG_FILE_NAME),
            );
        }
        Self { search_paths }
    }

    pub fn with_search_paths(search_paths: Vec<PathBuf>) -> Self {
        Self { search_paths }
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// An explicit path must exist; search paths are optional and defaults
    /// are used when none of them is present.
    pub fn load(&self, explicit: Option<&Path>) -> Result<(PtydeckConfig, ConfigSource)> {
        if let Some(path) = explicit {
            let config = PtydeckConfig::load_from_path(path)?;
            return Ok((config, ConfigSource::File(path.to_path_buf())));
        }

        for candidate in &self.search_paths {
            if candidate.is_file() {
                debug!(path = %candidate.display(), "loading ptydeck configuration");
                let config = PtydeckConfig::load_from_path(candidate)?;
                return Ok((config, ConfigSource::File(candidate.clone())));
            }
        }

        debug!("no ptydeck configuration file found; using defaults");
        Ok((PtydeckConfig::default(), ConfigSource::Defaults))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LineEnding, ThemeMode, TraceLevel};
    use assert_fs::prelude::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_file_yields_defaults() {
        let config = PtydeckConfig::from_toml_str("").expect("empty config parses");
        assert_eq!(config, PtydeckConfig::default());
        assert_eq!(config.pty.default_cols, 80);
        assert_eq!(config.pty.default_rows, 30);
        assert_eq!(config.pty.coalesce_interval_ms, 16);
        assert_eq!(config.terminals.len(), 3);
        assert_eq!(config.terminals[0].id, "TERMINAL_1");
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = PtydeckConfig::from_toml_str(
            r#"
            [pty]
            coalesce_interval_ms = 0

            [paste]
            submit_key = "crlf"
            auto_submit = false

            [client]
            theme = "light"

            [debug]
            trace_level = "verbose"
            "#,
        )
        .expect("config parses");

        assert_eq!(config.pty.coalesce_interval_ms, 0);
        assert_eq!(config.pty.default_cols, 80);
        assert_eq!(config.paste.submit_key, LineEnding::Crlf);
        assert!(!config.paste.auto_submit);
        assert_eq!(config.paste.submit_delay_ms, 80);
        assert_eq!(config.client.theme, ThemeMode::Light);
        assert_eq!(config.client.scrollback_lines, 10_000);
        assert_eq!(config.debug.trace_level, TraceLevel::Info);
    }

    #[test]
    fn rejects_zero_geometry() {
        let err = PtydeckConfig::from_toml_str("[pty]\ndefault_cols = 0\n")
            .expect_err("zero columns must be rejected");
        assert!(format!("{err:#}").contains("non-zero"));
    }

    #[test]
    fn rejects_duplicate_slots() {
        let err = PtydeckConfig::from_toml_str(
            r#"
            [[terminals]]
            id = "main"
            label = "Main"

            [[terminals]]
            id = "main"
            label = "Other"
            "#,
        )
        .expect_err("duplicate ids must be rejected");
        assert!(format!("{err:#}").contains("duplicate terminal slot id 'main'"));
    }

    #[test]
    fn loader_uses_first_existing_candidate() {
        let temp = assert_fs::TempDir::new().expect("temp dir");
        let missing = temp.child("missing.toml");
        let present = temp.child("ptydeck.toml");
        present
            .write_str("[shell]\nprogram = \"/usr/bin/fish\"\n")
            .expect("write config");

        let loader = ConfigLoader::with_search_paths(vec![
            missing.path().to_path_buf(),
            present.path().to_path_buf(),
        ]);
        let (config, source) = loader.load(None).expect("config loads");

        assert_eq!(config.shell.preferred_program(), Some("/usr/bin/fish"));
        assert_eq!(source, ConfigSource::File(present.path().to_path_buf()));
    }

    #[test]
    fn loader_falls_back_to_defaults() {
        let temp = assert_fs::TempDir::new().expect("temp dir");
        let missing = temp.child("nope.toml");
        let loader = ConfigLoader::with_search_paths(vec![missing.path().to_path_buf()]);
        let (config, source) = loader.load(None).expect("defaults load");
        assert_eq!(config, PtydeckConfig::default());
        assert_eq!(source, ConfigSource::Defaults);
    }

    #[test]
    fn explicit_path_must_exist() {
        let temp = assert_fs::TempDir::new().expect("temp dir");
        let loader = ConfigLoader::with_search_paths(Vec::new());
        let missing = temp.child("absent.toml");
        assert!(loader.load(Some(missing.path())).is_err());
    }
}
