// Test module - relaxed lint rules
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(missing_docs)]

use std::process::Command;

fn assert_help_contains(args: &[&str], needle: &str) {
    let output = Command::new(env!("CARGO_BIN_EXE_termprobe"))
        .args(args)
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(needle), "missing help: {needle}\n{stdout}");
}

#[test]
fn top_level_help_mentions_subcommands() {
    assert_help_contains(&["--help"], "run");
    assert_help_contains(&["--help"], "list");
    assert_help_contains(&["--help"], "completions");
}

#[test]
fn run_help_mentions_delay_and_selection_flags() {
    assert_help_contains(&["run", "--help"], "--subject");
    assert_help_contains(&["run", "--help"], "--backend");
    assert_help_contains(&["run", "--help"], "--key-delay-ms");
    assert_help_contains(&["run", "--help"], "--operation-delay-ms");
    assert_help_contains(&["run", "--help"], "--close-delay-ms");
    assert_help_contains(&["run", "--help"], "--only");
    assert_help_contains(&["run", "--help"], "--keep-going");
    assert_help_contains(&["run", "--help"], "TERMPROBE_SUBJECT");
}

#[test]
fn run_without_subject_fails_with_config_error() {
    let output = Command::new(env!("CARGO_BIN_EXE_termprobe"))
        .args(["--color", "never", "run"])
        .env_remove("TERMPROBE_SUBJECT")
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("E_CONFIG"), "{stderr}");
}

#[test]
fn run_rejects_unknown_case_names() {
    let output = Command::new(env!("CARGO_BIN_EXE_termprobe"))
        .args([
            "--color",
            "never",
            "run",
            "--subject",
            "/bin/true",
            "--backend",
            "pty",
            "--only",
            "no_such_case",
        ])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no_such_case"), "{stderr}");
}
