//! CLI Exit Codes - The Built Binary Against a Scratch Home
//!
//! Every failure, usage errors included, exits 1. Successful commands
//! and `--help` exit 0.

use std::process::{Command, Output};

fn dexbot(home: &std::path::Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_dexbot"))
        .arg("--home")
        .arg(home)
        .args(args)
        .env_remove("DEXBOT_HOME")
        .env_remove("DEXBOT_PRIVATE_KEY")
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

#[test]
fn test_missing_positional_exits_one() {
    let home = tempfile::tempdir().unwrap();
    let output = dexbot(home.path(), &["pm", "start", "onlyname"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("STRATEGY") || stderr.contains("strategy"), "{stderr}");
}

#[test]
fn test_unknown_subcommand_exits_one() {
    let home = tempfile::tempdir().unwrap();
    let output = dexbot(home.path(), &["pm", "launch"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_invalid_name_exits_one() {
    let home = tempfile::tempdir().unwrap();
    let output = dexbot(home.path(), &["pm", "start", "bad name", "grid", "--yes"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.starts_with("Error: "), "{stderr}");
}

#[test]
fn test_stop_unknown_name_exits_zero() {
    let home = tempfile::tempdir().unwrap();
    let output = dexbot(home.path(), &["pm", "stop", "ghost", "--yes"]);
    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn test_ps_when_piped_has_no_escape_codes() {
    let home = tempfile::tempdir().unwrap();
    let output = dexbot(home.path(), &["pm", "ps"]);

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), "No processes running");
}

#[test]
fn test_help_exits_zero() {
    let home = tempfile::tempdir().unwrap();
    let output = dexbot(home.path(), &["pm", "--help"]);
    assert_eq!(output.status.code(), Some(0));
}
