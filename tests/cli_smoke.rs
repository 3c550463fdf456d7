use assert_cmd::Command;
use assert_fs::prelude::*;
use predicates::prelude::*;

fn ptydeck() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("ptydeck"));
    cmd.env_remove("PTYDECK_CONFIG").env_remove("RUST_LOG");
    cmd
}

#[test]
fn help_lists_subcommands() {
    ptydeck()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve").and(predicate::str::contains("attach")));
}

#[test]
fn shell_reports_resolved_program_as_json() {
    let output = ptydeck()
        .args(["shell", "--json"])
        .output()
        .expect("run ptydeck shell");
    assert!(output.status.success());

    let report: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("shell report is JSON");
    assert!(report["program"].as_str().is_some_and(|p| !p.is_empty()));
    assert_eq!(report["cols"], 80);
    assert_eq!(report["rows"], 30);
}

#[test]
fn slots_lists_default_terminals() {
    ptydeck()
        .arg("slots")
        .assert()
        .success()
        .stdout(predicate::str::contains("TERMINAL_1\tTerminal 1"))
        .stdout(predicate::str::contains("TERMINAL_3"));
}

#[test]
fn slots_follow_config_file() {
    let temp = assert_fs::TempDir::new().expect("temp dir");
    let config = temp.child("ptydeck.toml");
    config
        .write_str("[[terminals]]\nid = \"build\"\nlabel = \"Build\"\n")
        .expect("write config");

    ptydeck()
        .arg("--config")
        .arg(config.path())
        .arg("slots")
        .assert()
        .success()
        .stdout("build\tBuild\n");
}

#[test]
fn missing_config_file_fails() {
    ptydeck()
        .args(["--config", "/definitely/not/here/ptydeck.toml", "slots"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read config file"));
}

#[test]
fn serve_ignores_commands_for_unknown_sessions() {
    ptydeck()
        .arg("serve")
        .write_stdin("{\"type\":\"destroy\",\"id\":\"nope\"}\n\nnot json\n")
        .assert()
        .success()
        .stdout("");
}

#[test]
fn attach_refuses_piped_stdio() {
    let data_dir = assert_fs::TempDir::new().expect("temp dir");
    ptydeck()
        .env("XDG_DATA_HOME", data_dir.path())
        .arg("attach")
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("interactive terminal"));
}
