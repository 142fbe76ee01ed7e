//! Tests for shell completion generation.
// Test module - relaxed lint rules
#![allow(clippy::expect_used)]

use std::process::Command;

fn termprobe_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_termprobe"))
}

#[test]
fn completions_generates_bash_output() {
    let output = termprobe_bin()
        .arg("completions")
        .arg("bash")
        .output()
        .expect("failed to execute");

    assert!(
        output.status.success(),
        "completions bash should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("_termprobe"));
    assert!(stdout.contains("complete"));
}

#[test]
fn completions_generates_zsh_and_fish_output() {
    for shell in ["zsh", "fish"] {
        let output = termprobe_bin()
            .arg("completions")
            .arg(shell)
            .output()
            .expect("failed to execute");
        assert!(output.status.success(), "completions {shell} failed");
        assert!(!output.stdout.is_empty(), "completions {shell} is empty");
    }
}

#[test]
fn completions_rejects_unknown_shell() {
    let output = termprobe_bin()
        .arg("completions")
        .arg("cmd.exe")
        .output()
        .expect("failed to execute");
    assert!(!output.status.success());
}
