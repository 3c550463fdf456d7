//! Default shell discovery and launch arguments.
//!
//! Probing goes through [`ShellProbe`] so the platform policy can be
//! exercised without touching the real environment.

use std::env;
use std::path::{Path, PathBuf};

use ptydeck_config::ShellConfig;

use crate::platform::HostPlatform;

const WINDOWS_KNOWN_SHELLS: &[&str] = &[
    r"C:\Program Files\PowerShell\7\pwsh.exe",
    r"C:\Program Files (x86)\PowerShell\7\pwsh.exe",
    r"C:\Windows\System32\WindowsPowerShell\v1.0\powershell.exe",
];
const WINDOWS_FALLBACK_SHELL: &str = r"C:\Windows\System32\cmd.exe";
const MACOS_FALLBACK_SHELL: &str = "/bin/zsh";
const UNIX_FALLBACK_SHELL: &str = "/bin/bash";

/// Read-only view of the host used while picking a shell.
pub trait ShellProbe: Send + Sync {
    fn var(&self, key: &str) -> Option<String>;
    fn which(&self, program: &str) -> Option<PathBuf>;
    fn exists(&self, path: &Path) -> bool;
    fn current_dir(&self) -> Option<PathBuf>;
}

/// Probe backed by the process environment, `PATH` lookup and the filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProbe;

impl ShellProbe for SystemProbe {
    fn var(&self, key: &str) -> Option<String> {
        env::var(key).ok()
    }

    fn which(&self, program: &str) -> Option<PathBuf> {
        which::which(program).ok()
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn current_dir(&self) -> Option<PathBuf> {
        env::current_dir().ok()
    }
}

/// Shell family, used for launch arguments and post-launch setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShellKind {
    PowerShell,
    Cmd,
    Posix,
}

impl ShellKind {
    /// Substring match on the lowercased path; `pwsh`/`powershell` wins over `cmd`.
    pub fn detect(shell: &Path) -> Self {
        let lowered = shell.to_string_lossy().to_lowercase();
        if lowered.contains("pwsh") || lowered.contains("powershell") {
            Self::PowerShell
        } else if lowered.contains("cmd") {
            Self::Cmd
        } else {
            Self::Posix
        }
    }

    /// Whether the shell needs the legacy codepage switch after launch.
    pub fn needs_legacy_init(self, platform: HostPlatform) -> bool {
        platform.is_windows() && matches!(self, Self::Cmd)
    }
}

/// Pick the interactive shell for `platform`. Never fails: every branch ends
/// in a hardcoded path, and a bad path surfaces later as a spawn failure.
pub fn resolve_default_shell(platform: HostPlatform, probe: &dyn ShellProbe) -> PathBuf {
    match platform {
        HostPlatform::Windows => resolve_windows_shell(probe),
        HostPlatform::MacOs => {
            env_shell(probe).unwrap_or_else(|| PathBuf::from(MACOS_FALLBACK_SHELL))
        }
        HostPlatform::Unix => {
            env_shell(probe).unwrap_or_else(|| PathBuf::from(UNIX_FALLBACK_SHELL))
        }
    }
}

/// A configured program overrides discovery.
pub fn resolve_shell(
    config: &ShellConfig,
    platform: HostPlatform,
    probe: &dyn ShellProbe,
) -> PathBuf {
    match config.preferred_program() {
        Some(program) => PathBuf::from(program),
        None => resolve_default_shell(platform, probe),
    }
}

fn env_shell(probe: &dyn ShellProbe) -> Option<PathBuf> {
    probe
        .var("SHELL")
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

fn resolve_windows_shell(probe: &dyn ShellProbe) -> PathBuf {
    for program in ["pwsh.exe", "powershell.exe"] {
        if let Some(path) = probe.which(program) {
            if probe.exists(&path) {
                return path;
            }
        }
    }

    for known in WINDOWS_KNOWN_SHELLS {
        let path = Path::new(known);
        if probe.exists(path) {
            return path.to_path_buf();
        }
    }

    probe
        .var("COMSPEC")
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(WINDOWS_FALLBACK_SHELL))
}

/// `-NoLogo` for PowerShell, followed by configured extras.
pub fn launch_args(kind: ShellKind, config: &ShellConfig) -> Vec<String> {
    let mut args = Vec::with_capacity(config.args.len() + 1);
    if kind == ShellKind::PowerShell {
        args.push("-NoLogo".to_owned());
    }
    args.extend(config.args.iter().cloned());
    args
}

/// `$HOME`, then `$USERPROFILE`, then the current directory.
pub fn resolve_working_dir(probe: &dyn ShellProbe) -> PathBuf {
    ["HOME", "USERPROFILE"]
        .into_iter()
        .filter_map(|key| probe.var(key))
        .find(|value| !value.is_empty())
        .map(PathBuf::from)
        .or_else(|| probe.current_dir())
        .unwrap_or_else(|| PathBuf::from("."))
}
