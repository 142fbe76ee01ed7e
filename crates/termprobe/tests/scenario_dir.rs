// Test module - relaxed lint rules
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(missing_docs)]

//! Loading scenario files into a registry and running them.

mod common;

use std::fs;

use common::{entries, fake_env, fast_config, new_log, FakeDriver};
use termprobe::runner::{run_cases, NoopProgress};
use termprobe::Registry;

const TOUCH: &str = r#"
name: touch_file
root: touch_ops
keys: [":", "touch made.txt", "<enter>"]
expect:
  exists: [made.txt]
"#;

const RENAME: &str = r#"
name: rename_yaml
root: rename_yaml_ops
start_dir: dir1
dirs: [dir1]
files:
  - path: dir1/file1
    content: "one"
keys: ["<ctrl+r>", "<backspace>", "2", "<enter>"]
press_escape: false
close_delay_ms: 0
expect:
  exists: [dir1/file1]
  running: true
"#;

#[test]
fn load_dir_registers_yaml_files_in_name_order() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("b_touch.yaml"), TOUCH).unwrap();
    fs::write(dir.path().join("a_rename.yml"), RENAME).unwrap();
    fs::write(dir.path().join("notes.txt"), "not a scenario").unwrap();

    let mut registry = Registry::new();
    let names = registry.load_dir(dir.path()).unwrap();

    assert_eq!(names, vec!["rename_yaml", "touch_file"]);
    assert_eq!(registry.names(), vec!["rename_yaml", "touch_file"]);
}

#[test]
fn yaml_scenarios_extend_the_builtin_registry() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("touch.yaml"), TOUCH).unwrap();

    let mut registry = Registry::builtin();
    let before = registry.len();
    registry.load_dir(dir.path()).unwrap();

    assert_eq!(registry.len(), before + 1);
    assert_eq!(registry.names().last(), Some(&"touch_file"));
}

#[test]
fn invalid_scenario_file_names_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.yaml");
    fs::write(&path, "name: broken\nroot: b\nkeys: ['<ctrl+1>']\n").unwrap();

    let err = Registry::new().load_dir(dir.path()).unwrap_err();

    assert_eq!(err.code(), "E_SCENARIO");
    assert!(err.to_string().contains("broken.yaml"), "{err}");
}

#[test]
fn missing_directory_is_a_scenario_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Registry::new()
        .load_dir(&dir.path().join("nope"))
        .unwrap_err();
    assert_eq!(err.code(), "E_SCENARIO");
}

#[test]
fn loaded_scenarios_run_like_builtins() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("touch.yaml"), TOUCH).unwrap();
    fs::write(dir.path().join("rename.yaml"), RENAME).unwrap();
    let mut registry = Registry::new();
    registry.load_dir(dir.path()).unwrap();

    let log = new_log();
    let config = fast_config();
    let driver = FakeDriver::new(log.clone()).with_on_key(|key, dir| {
        if key.to_string() == "touch made.txt" {
            fs::write(dir.join("made.txt"), "").unwrap();
        }
    });
    let mut env = fake_env(driver, &config);

    let cases = registry.discover(&[]).unwrap();
    let summary = run_cases(&mut env, cases, true, &NoopProgress).unwrap();

    assert_eq!(summary.executed, 2);
    assert!(summary.all_passed(), "{summary:?}");
    let log = entries(&log);
    assert!(log.contains(&"key <ctrl+r>".to_string()));
    assert!(log.contains(&"text touch made.txt atomic=true".to_string()));
}
