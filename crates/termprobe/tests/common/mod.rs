// Shared helpers for the library integration tests.
#![allow(dead_code)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(missing_docs)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use termprobe::config::{Delays, HarnessConfig};
use termprobe::keys::{Key, ESC, PASTE};
use termprobe::{Environment, HarnessError, HarnessResult, Sandbox, SubjectDriver};

pub type CallLog = Arc<Mutex<Vec<String>>>;
pub type KeyAction = Box<dyn FnMut(&Key, &Path)>;

/// In-memory subject: records every call and runs `on_key` for each key so
/// tests can fake the subject's file side effects.
pub struct FakeDriver {
    log: CallLog,
    start_dir: Option<PathBuf>,
    running: bool,
    pub fail_start: bool,
    pub die_on_start: bool,
    pub exit_on_escape: bool,
    on_key: Option<KeyAction>,
}

impl FakeDriver {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            start_dir: None,
            running: false,
            fail_start: false,
            die_on_start: false,
            exit_on_escape: true,
            on_key: None,
        }
    }

    pub fn with_on_key(mut self, action: impl FnMut(&Key, &Path) + 'static) -> Self {
        self.on_key = Some(Box::new(action));
        self
    }

    fn record(&self, entry: String) {
        self.log.lock().unwrap().push(entry);
    }
}

impl SubjectDriver for FakeDriver {
    fn backend_name(&self) -> &'static str {
        "fake"
    }

    fn start(&mut self, start_dir: &Path, args: &[String]) -> HarnessResult<()> {
        self.record(format!("start {} {}", args.join(" "), start_dir.display()));
        if self.fail_start {
            return Err(HarnessError::launch("fake launch failure"));
        }
        self.start_dir = Some(start_dir.to_path_buf());
        self.running = !self.die_on_start;
        Ok(())
    }

    fn send_text(&mut self, text: &str, atomic: bool) -> HarnessResult<()> {
        self.record(format!("text {text} atomic={atomic}"));
        let key = Key::from(text);
        if let (Some(action), Some(dir)) = (self.on_key.as_mut(), self.start_dir.as_deref()) {
            action(&key, dir);
        }
        Ok(())
    }

    fn send_special(&mut self, key: &Key) -> HarnessResult<()> {
        if *key == PASTE {
            return Err(HarnessError::UnsupportedKey {
                key: key.to_string(),
                backend: "fake",
            });
        }
        self.record(format!("key {key}"));
        if *key == ESC && self.exit_on_escape {
            self.running = false;
        }
        if let (Some(action), Some(dir)) = (self.on_key.as_mut(), self.start_dir.as_deref()) {
            action(key, dir);
        }
        Ok(())
    }

    fn is_running(&mut self) -> bool {
        self.running
    }

    fn is_running_cached(&self) -> bool {
        self.running
    }

    fn close(&mut self) {
        if self.running {
            self.record("close".to_string());
            self.running = false;
        }
    }

    fn runtime_info(&self) -> String {
        format!("[fake running: {}]", self.running)
    }
}

/// Config with every delay zeroed so tests run instantly.
pub fn fast_config() -> HarnessConfig {
    let mut config = HarnessConfig::new("/opt/fake-subject");
    config.delays = Delays {
        key_ms: 0,
        char_ms: 0,
        operation_ms: 0,
        close_ms: 0,
    };
    config
}

pub fn new_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn entries(log: &CallLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

pub fn fake_env(driver: FakeDriver, config: &HarnessConfig) -> Environment {
    Environment::new(Box::new(driver), Sandbox::create().unwrap(), config.clone())
}
