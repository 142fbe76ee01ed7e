// Test module - relaxed lint rules
#![allow(clippy::indexing_slicing)]
#![allow(clippy::panic)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(missing_docs)]

//! Runner and lifecycle tests against an in-memory subject.

mod common;

use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use common::{entries, fake_env, fast_config, new_log, FakeDriver};
use termprobe::keys::{Key, CTRL_C, CTRL_D, CTRL_R, CTRL_V, ENTER, PASTE};
use termprobe::runner::{run_cases, CollectingProgress, NoopProgress, ProgressEvent};
use termprobe::{
    CaseStatus, Environment, GenericCase, HarnessError, HarnessResult, Registry, Runner, TestCase,
};

/// Fakes a file manager: Ctrl+D deletes `victim`, Ctrl+V copies
/// `file1.txt` to `file1(1).txt`, Ctrl+R renames `file1` to `file2`.
fn file_manager(key: &Key, dir: &Path) {
    if *key == CTRL_D {
        let _ = fs::remove_file(dir.join("victim.txt"));
    } else if *key == CTRL_V {
        let _ = fs::copy(dir.join("file1.txt"), dir.join("file1(1).txt"));
    } else if *key == CTRL_R {
        let _ = fs::rename(dir.join("file1"), dir.join("file2"));
    }
}

fn delete_case() -> GenericCase {
    GenericCase::builder("delete", "delete_ops")
        .with_file("victim.txt", "bye")
        .with_keys([CTRL_D, ENTER])
        .expect_absent(["victim.txt"])
        .build()
}

fn copy_case() -> GenericCase {
    GenericCase::builder("copy", "copy_ops")
        .with_start_dir("dir1")
        .with_dirs(["dir1", "dir2"])
        .with_file("dir1/file1.txt", "data")
        .with_keys([CTRL_C, CTRL_V])
        .expect_exists(["dir1/file1.txt", "dir1/file1(1).txt"])
        .build()
}

fn broken_case(name: &str) -> GenericCase {
    GenericCase::builder(name, name)
        .expect_exists(["never-created"])
        .build()
}

fn boxed(cases: Vec<GenericCase>) -> Vec<Box<dyn TestCase>> {
    cases
        .into_iter()
        .map(|case| Box::new(case) as Box<dyn TestCase>)
        .collect()
}

#[test]
fn passing_cases_are_counted() {
    let log = new_log();
    let config = fast_config();
    let mut env = fake_env(FakeDriver::new(log.clone()).with_on_key(file_manager), &config);

    let summary = run_cases(
        &mut env,
        boxed(vec![delete_case(), copy_case()]),
        true,
        &NoopProgress,
    )
    .unwrap();

    assert_eq!(summary.executed, 2);
    assert_eq!(summary.passed, 2);
    assert!(summary.all_passed());
    assert!(!summary.stopped_early);
    assert_eq!(summary.backend, "fake");
    assert!(env.sandbox().exists("copy_ops/dir1/file1(1).txt"));
    assert!(!env.sandbox().exists("delete_ops/victim.txt"));
}

#[test]
fn keys_are_sent_in_order_then_escape() {
    let log = new_log();
    let config = fast_config();
    let mut env = fake_env(FakeDriver::new(log.clone()).with_on_key(file_manager), &config);
    let root = env.sandbox().absolute("delete_ops");

    run_cases(&mut env, boxed(vec![delete_case()]), true, &NoopProgress).unwrap();

    assert_eq!(
        entries(&log),
        vec![
            format!("start  {}", root.display()),
            "key <ctrl+d>".to_string(),
            "key <enter>".to_string(),
            "key <esc>".to_string(),
        ]
    );
}

#[test]
fn text_keys_are_sent_atomically() {
    let log = new_log();
    let config = fast_config();
    let mut env = fake_env(FakeDriver::new(log.clone()), &config);
    let case = GenericCase::builder("command", "cmd_ops")
        .with_keys([Key::text(":"), Key::text("mkdir dir1"), ENTER])
        .build();

    run_cases(&mut env, boxed(vec![case]), true, &NoopProgress).unwrap();

    let log = entries(&log);
    assert_eq!(log[1], "text : atomic=true");
    assert_eq!(log[2], "text mkdir dir1 atomic=true");
}

#[test]
fn stop_on_fail_skips_remaining_cases() {
    let log = new_log();
    let config = fast_config();
    let mut env = fake_env(FakeDriver::new(log.clone()).with_on_key(file_manager), &config);

    let summary = run_cases(
        &mut env,
        boxed(vec![broken_case("broken"), delete_case()]),
        true,
        &NoopProgress,
    )
    .unwrap();

    assert_eq!(summary.executed, 1);
    assert_eq!(summary.passed, 0);
    assert_eq!(summary.selected, 2);
    assert!(summary.stopped_early);
    assert_eq!(summary.cases[0].status, CaseStatus::Failed);
    // The delete case never ran, so its fixture was never created.
    assert!(!env.sandbox().exists("delete_ops"));
}

#[test]
fn without_stop_on_fail_every_case_runs() {
    let log = new_log();
    let config = fast_config();
    let mut env = fake_env(FakeDriver::new(log.clone()).with_on_key(file_manager), &config);

    let summary = run_cases(
        &mut env,
        boxed(vec![broken_case("broken"), delete_case()]),
        false,
        &NoopProgress,
    )
    .unwrap();

    assert_eq!(summary.executed, 2);
    assert_eq!(summary.passed, 1);
    assert_eq!(summary.failed(), 1);
    assert!(!summary.all_passed());
    assert!(!summary.stopped_early);
}

#[test]
fn subject_dying_on_start_errors_the_case() {
    let log = new_log();
    let config = fast_config();
    let mut driver = FakeDriver::new(log.clone());
    driver.die_on_start = true;
    let mut env = fake_env(driver, &config);

    let summary = run_cases(
        &mut env,
        boxed(vec![delete_case(), copy_case()]),
        false,
        &NoopProgress,
    )
    .unwrap();

    assert_eq!(summary.executed, 2);
    assert_eq!(summary.passed, 0);
    assert_eq!(summary.cases[0].status, CaseStatus::Errored);
    let error = summary.cases[0].error.as_deref().unwrap();
    assert!(error.starts_with("E_SUBJECT_NOT_RUNNING"), "{error}");
    // No keys were sent to a dead subject.
    assert!(entries(&log).iter().all(|entry| entry.starts_with("start")));
}

#[test]
fn fatal_error_aborts_the_run() {
    let log = new_log();
    let config = fast_config();
    let mut driver = FakeDriver::new(log.clone());
    driver.fail_start = true;
    let mut env = fake_env(driver, &config);

    let err = run_cases(
        &mut env,
        boxed(vec![delete_case(), copy_case()]),
        false,
        &NoopProgress,
    )
    .unwrap_err();

    assert_eq!(err.code(), "E_LAUNCH");
    assert_eq!(entries(&log).len(), 1);
    env.cleanup();
    assert!(env.sandbox().is_disposed());
}

#[test]
fn unsupported_key_is_fatal_and_subject_is_closed() {
    let log = new_log();
    let config = fast_config();
    let mut env = fake_env(FakeDriver::new(log.clone()), &config);
    let case = GenericCase::builder("paste", "paste_ops")
        .with_keys([CTRL_C, PASTE])
        .build();

    let err = run_cases(&mut env, boxed(vec![case]), false, &NoopProgress).unwrap_err();

    assert_eq!(err.code(), "E_UNSUPPORTED_KEY");
    assert_eq!(entries(&log).last().map(String::as_str), Some("close"));
}

#[test]
fn subject_expected_running_is_closed_by_cleanup() {
    let log = new_log();
    let config = fast_config();
    let mut env = fake_env(FakeDriver::new(log.clone()), &config);
    let case = GenericCase::builder("empty_panel", "empty_panel_ops")
        .with_keys([CTRL_C, CTRL_D])
        .press_escape(false)
        .expect_running(true)
        .build();

    let summary = run_cases(&mut env, boxed(vec![case]), true, &NoopProgress).unwrap();

    assert!(summary.all_passed());
    let log = entries(&log);
    assert!(!log.iter().any(|entry| entry == "key <esc>"));
    assert_eq!(log.last().map(String::as_str), Some("close"));
}

#[test]
fn subject_left_running_fails_validation() {
    let log = new_log();
    let config = fast_config();
    let mut driver = FakeDriver::new(log.clone());
    driver.exit_on_escape = false;
    let mut env = fake_env(driver, &config);

    let summary = run_cases(&mut env, boxed(vec![delete_case()]), true, &NoopProgress).unwrap();

    assert_eq!(summary.cases[0].status, CaseStatus::Failed);
    assert_eq!(entries(&log).last().map(String::as_str), Some("close"));
}

#[test]
fn rename_and_sandbox_arguments_resolve_inside_the_case_root() {
    let log = new_log();
    let config = fast_config();
    let mut env = fake_env(FakeDriver::new(log.clone()).with_on_key(file_manager), &config);
    let case = GenericCase::builder("rename", "rename_ops")
        .with_start_dir("dir1")
        .with_dirs(["dir1"])
        .with_file("dir1/file1", "x")
        .with_arg("--chooser-file")
        .with_sandbox_arg("out.txt")
        .with_keys([CTRL_R, Key::text("2"), ENTER])
        .expect_exists(["dir1/file2"])
        .expect_absent(["dir1/file1"])
        .build();
    let chooser = env.sandbox().absolute("rename_ops/out.txt");
    let start_dir = env.sandbox().absolute("rename_ops/dir1");

    let summary = run_cases(&mut env, boxed(vec![case]), true, &NoopProgress).unwrap();

    assert!(summary.all_passed());
    assert_eq!(
        entries(&log)[0],
        format!(
            "start --chooser-file {} {}",
            chooser.display(),
            start_dir.display()
        )
    );
}

#[test]
fn fixtures_outside_the_sandbox_error_the_case() {
    let outside = tempfile::tempdir().unwrap();
    let target = outside.path().join("escaped.txt");
    let log = new_log();
    let config = fast_config();
    let mut env = fake_env(FakeDriver::new(log.clone()).with_on_key(file_manager), &config);
    let case = GenericCase::builder("escape", "escape_ops")
        .with_file(&target, "x")
        .build();

    let summary = run_cases(
        &mut env,
        boxed(vec![case, delete_case()]),
        false,
        &NoopProgress,
    )
    .unwrap();

    assert!(!target.exists());
    assert_eq!(summary.cases[0].status, CaseStatus::Errored);
    let error = summary.cases[0].error.as_deref().unwrap();
    assert!(error.starts_with("E_SANDBOX_PATH"), "{error}");
    // The subject was never started for the broken case.
    assert!(entries(&log)[0].ends_with("delete_ops"));
    assert_eq!(summary.cases[1].status, CaseStatus::Passed);
}

#[test]
fn content_check_against_missing_file_fails() {
    let config = fast_config();
    let mut env = fake_env(FakeDriver::new(new_log()), &config);
    let case = GenericCase::builder("chooser_missing", "chooser_missing_ops")
        .expect_content("never_written.txt", "")
        .build();

    let summary = run_cases(&mut env, boxed(vec![case]), true, &NoopProgress).unwrap();

    assert_eq!(summary.cases[0].status, CaseStatus::Failed);
    assert_eq!(summary.passed, 0);
}

#[test]
fn content_checks_compare_against_sandbox_paths() {
    let log = new_log();
    let config = fast_config();
    let chooser_target = Arc::new(Mutex::new(None));
    let target = chooser_target.clone();
    let driver = FakeDriver::new(log).with_on_key(move |key, dir| {
        if *key == Key::text("e") {
            let chosen = dir.join("file1.txt");
            let out = dir.parent().unwrap().join("dir2").join("chooser_file.txt");
            fs::write(&out, format!("{}\n", chosen.display())).unwrap();
            *target.lock().unwrap() = Some(out);
        }
    });
    let mut env = fake_env(driver, &config);
    let case = GenericCase::builder("chooser_file", "chooser_file_ops")
        .with_start_dir("dir1")
        .with_dirs(["dir1", "dir2"])
        .with_file("dir1/file1.txt", "x")
        .with_keys([Key::text("e")])
        .expect_content_path("dir2/chooser_file.txt", "dir1/file1.txt")
        .build();

    let summary = run_cases(&mut env, boxed(vec![case]), true, &NoopProgress).unwrap();

    assert!(summary.all_passed());
    assert!(chooser_target.lock().unwrap().is_some());
}

#[test]
fn progress_events_bracket_each_case() {
    let config = fast_config();
    let mut env = fake_env(FakeDriver::new(new_log()).with_on_key(file_manager), &config);
    let progress = CollectingProgress::new();

    run_cases(
        &mut env,
        boxed(vec![delete_case(), copy_case()]),
        true,
        &progress,
    )
    .unwrap();

    let events = progress.events();
    assert_eq!(events.len(), 6);
    assert!(matches!(
        events[0],
        ProgressEvent::RunStarted {
            total_cases: 2,
            backend: "fake",
            ..
        }
    ));
    assert!(matches!(&events[1], ProgressEvent::CaseStarted { index: 1, name } if name == "delete"));
    assert!(matches!(
        &events[2],
        ProgressEvent::CaseCompleted {
            status: CaseStatus::Passed,
            ..
        }
    ));
    assert!(matches!(&events[3], ProgressEvent::CaseStarted { index: 2, name } if name == "copy"));
    assert!(matches!(
        events[5],
        ProgressEvent::RunCompleted { success: true, .. }
    ));
}

/// Records the phases it goes through; can fail setup on demand.
struct PhaseRecorder {
    phases: Arc<Mutex<Vec<&'static str>>>,
    fail_setup: bool,
}

impl TestCase for PhaseRecorder {
    fn name(&self) -> &str {
        "recorder"
    }

    fn setup(&mut self, _env: &mut Environment) -> HarnessResult<()> {
        self.phases.lock().unwrap().push("setup");
        if self.fail_setup {
            return Err(HarnessError::io(
                "fixture",
                std::io::Error::other("disk full"),
            ));
        }
        Ok(())
    }

    fn execute(&mut self, _env: &mut Environment) -> HarnessResult<()> {
        self.phases.lock().unwrap().push("execute");
        Ok(())
    }

    fn validate(&mut self, _env: &mut Environment) -> bool {
        self.phases.lock().unwrap().push("validate");
        true
    }

    fn cleanup(&mut self, _env: &mut Environment) {
        self.phases.lock().unwrap().push("cleanup");
    }
}

#[test]
fn phases_run_in_order() {
    let phases = Arc::new(Mutex::new(Vec::new()));
    let config = fast_config();
    let mut env = fake_env(FakeDriver::new(new_log()), &config);
    let case = PhaseRecorder {
        phases: phases.clone(),
        fail_setup: false,
    };

    let cases: Vec<Box<dyn TestCase>> = vec![Box::new(case)];
    let summary = run_cases(&mut env, cases, true, &NoopProgress).unwrap();

    assert!(summary.all_passed());
    assert_eq!(
        *phases.lock().unwrap(),
        vec!["setup", "execute", "validate", "cleanup"]
    );
}

#[test]
fn cleanup_runs_when_setup_fails() {
    let phases = Arc::new(Mutex::new(Vec::new()));
    let config = fast_config();
    let mut env = fake_env(FakeDriver::new(new_log()), &config);
    let case = PhaseRecorder {
        phases: phases.clone(),
        fail_setup: true,
    };

    let cases: Vec<Box<dyn TestCase>> = vec![Box::new(case)];
    let summary = run_cases(&mut env, cases, true, &NoopProgress).unwrap();

    assert_eq!(summary.cases[0].status, CaseStatus::Errored);
    assert_eq!(*phases.lock().unwrap(), vec!["setup", "cleanup"]);
}

#[test]
fn unknown_selection_fails_before_anything_starts() {
    let mut config = fast_config();
    config.only = vec!["copy".to_string(), "teleport".to_string()];
    let runner = Runner::new(config, Registry::builtin());

    let err = runner.run(&NoopProgress).unwrap_err();

    assert_eq!(err.code(), "E_UNKNOWN_CASE");
}

#[test]
fn missing_subject_is_a_config_error() {
    let mut config = fast_config();
    config.subject = std::path::PathBuf::new();
    let runner = Runner::new(config, Registry::builtin());

    assert_eq!(runner.run(&NoopProgress).unwrap_err().code(), "E_CONFIG");
}
