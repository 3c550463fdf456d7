//! `ptydeck shell` and `ptydeck slots`: what a new session would look like.

use anyhow::Result;
use ptydeck_config::PtydeckConfig;
use ptydeck_core::HostPlatform;
use ptydeck_core::shell::{self, ShellKind, SystemProbe};
use serde_json::json;

pub fn print_shell(config: &PtydeckConfig, as_json: bool) -> Result<()> {
    let platform = HostPlatform::current();
    let program = shell::resolve_shell(&config.shell, platform, &SystemProbe);
    let kind = ShellKind::detect(&program);
    let args = shell::launch_args(kind, &config.shell);
    let cwd = shell::resolve_working_dir(&SystemProbe);

    if as_json {
        let report = json!({
            "program": program.display().to_string(),
            "kind": format!("{kind:?}"),
            "args": args,
            "cwd": cwd.display().to_string(),
            "cols": config.pty.default_cols,
            "rows": config.pty.default_rows,
            "legacy_init": kind.needs_legacy_init(platform),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("program: {}", program.display());
    println!("kind:    {kind:?}");
    if !args.is_empty() {
        println!("args:    {}", args.join(" "));
    }
    println!("cwd:     {}", cwd.display());
    println!("size:    {}x{}", config.pty.default_cols, config.pty.default_rows);
    Ok(())
}

pub fn print_slots(config: &PtydeckConfig) {
    for slot in &config.terminals {
        println!("{}\t{}", slot.id, slot.label);
    }
}
