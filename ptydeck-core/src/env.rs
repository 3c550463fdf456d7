use std::collections::BTreeMap;
use std::env;

use ptydeck_config::ShellConfig;

use crate::platform::HostPlatform;

/// Environment for a new shell: the inherited process environment plus the
/// terminal capability variables and, on Windows, locale and PowerShell fixes.
///
/// Returns an independent copy; the calling process is never modified.
pub fn build_shell_environment(
    platform: HostPlatform,
    config: &ShellConfig,
) -> BTreeMap<String, String> {
    // Variables that are not valid UTF-8 are skipped.
    let inherited = env::vars_os().filter_map(|(key, value)| {
        Some((key.into_string().ok()?, value.into_string().ok()?))
    });
    build_shell_environment_from(inherited, platform, config)
}

pub fn build_shell_environment_from<I>(
    inherited: I,
    platform: HostPlatform,
    config: &ShellConfig,
) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut env: BTreeMap<String, String> = inherited.into_iter().collect();

    if platform.is_windows() {
        env.insert("LANG".to_owned(), config.windows_lang.clone());
        env.insert("CHCP".to_owned(), "65001".to_owned());
        env.entry("PSModulePath".to_owned()).or_default();
        env.insert("POWERSHELL_TELEMETRY_OPTOUT".to_owned(), "1".to_owned());
    }

    env.insert("TERM".to_owned(), "xterm-256color".to_owned());
    env.insert("COLORTERM".to_owned(), "truecolor".to_owned());

    for (key, value) in &config.env {
        env.insert(key.clone(), value.clone());
    }
    env
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn inherited() -> Vec<(String, String)> {
        vec![
            ("PATH".to_owned(), "/usr/bin".to_owned()),
            ("TERM".to_owned(), "dumb".to_owned()),
            ("PSModulePath".to_owned(), r"C:\Modules".to_owned()),
        ]
    }

    #[test]
    fn unix_adds_terminal_capabilities_only() {
        let env = build_shell_environment_from(
            inherited(),
            HostPlatform::Unix,
            &ShellConfig::default(),
        );
        assert_eq!(env.get("TERM").map(String::as_str), Some("xterm-256color"));
        assert_eq!(env.get("COLORTERM").map(String::as_str), Some("truecolor"));
        assert_eq!(env.get("PATH").map(String::as_str), Some("/usr/bin"));
        assert!(!env.contains_key("CHCP"));
        assert!(!env.contains_key("POWERSHELL_TELEMETRY_OPTOUT"));
    }

    #[test]
    fn windows_adds_locale_and_powershell_variables() {
        let config = ShellConfig {
            windows_lang: "ja_JP.UTF-8".to_owned(),
            ..ShellConfig::default()
        };
        let env = build_shell_environment_from(inherited(), HostPlatform::Windows, &config);
        assert_eq!(env.get("LANG").map(String::as_str), Some("ja_JP.UTF-8"));
        assert_eq!(env.get("CHCP").map(String::as_str), Some("65001"));
        assert_eq!(
            env.get("PSModulePath").map(String::as_str),
            Some(r"C:\Modules")
        );
        assert_eq!(
            env.get("POWERSHELL_TELEMETRY_OPTOUT").map(String::as_str),
            Some("1")
        );
    }

    #[test]
    fn windows_defaults_missing_module_path_to_empty() {
        let env = build_shell_environment_from(
            Vec::new(),
            HostPlatform::Windows,
            &ShellConfig::default(),
        );
        assert_eq!(env.get("PSModulePath").map(String::as_str), Some(""));
        assert_eq!(env.get("LANG").map(String::as_str), Some("en_US.UTF-8"));
    }

    #[test]
    fn configured_variables_are_layered_last() {
        let mut config = ShellConfig::default();
        config.env.insert("TERM".to_owned(), "xterm-kitty".to_owned());
        config.env.insert("EDITOR".to_owned(), "hx".to_owned());
        let env = build_shell_environment_from(inherited(), HostPlatform::Unix, &config);
        assert_eq!(env.get("TERM").map(String::as_str), Some("xterm-kitty"));
        assert_eq!(env.get("EDITOR").map(String::as_str), Some("hx"));
    }

    #[test]
    fn process_environment_is_not_modified() {
        let before: Vec<_> = env::vars_os().collect();
        let built = build_shell_environment(HostPlatform::current(), &ShellConfig::default());
        let after: Vec<_> = env::vars_os().collect();
        assert_eq!(before, after);
        assert_eq!(built.get("COLORTERM").map(String::as_str), Some("truecolor"));
    }
}
