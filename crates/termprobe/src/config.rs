//! Harness configuration.
//!
//! A [`HarnessConfig`] is built once at startup (defaults, then an optional
//! YAML/JSON file, then CLI/environment overrides) and passed by reference to
//! the environment and the runner. Nothing in the crate reads global state.

use crate::error::{HarnessError, HarnessResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Default per-key settle delay.
pub const DEFAULT_KEY_DELAY_MS: u64 = 50;
/// Default per-character delay for non-atomic text.
pub const DEFAULT_CHAR_DELAY_MS: u64 = 20;
/// Default wait after the last key before closing the subject.
pub const DEFAULT_OPERATION_DELAY_MS: u64 = 300;
/// Default wait after asking the subject to close.
pub const DEFAULT_CLOSE_DELAY_MS: u64 = 500;
/// Default bound on waiting for a launched session to appear.
pub const DEFAULT_LAUNCH_TIMEOUT_MS: u64 = 5_000;

/// Which automation backend drives the subject.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Pick by platform: tmux where available, a PTY on Windows.
    #[default]
    Auto,
    Tmux,
    Pty,
}

impl BackendKind {
    /// Resolve [`BackendKind::Auto`] to a concrete backend for this platform.
    pub fn resolve(self) -> Self {
        match self {
            Self::Auto => {
                if cfg!(windows) {
                    Self::Pty
                } else {
                    Self::Tmux
                }
            }
            concrete => concrete,
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Auto => "auto",
            Self::Tmux => "tmux",
            Self::Pty => "pty",
        };
        f.write_str(name)
    }
}

impl FromStr for BackendKind {
    type Err = HarnessError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "tmux" => Ok(Self::Tmux),
            "pty" => Ok(Self::Pty),
            other => Err(HarnessError::config(format!(
                "unknown backend '{other}' (expected auto, tmux or pty)"
            ))),
        }
    }
}

/// Fixed settle delays, in milliseconds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Delays {
    /// After each key of a case's input.
    pub key_ms: u64,
    /// Between characters when text is sent one character at a time.
    pub char_ms: u64,
    /// After the whole input batch, before closing the subject.
    pub operation_ms: u64,
    /// After sending Escape (or instead of it).
    pub close_ms: u64,
}

impl Default for Delays {
    fn default() -> Self {
        Self {
            key_ms: DEFAULT_KEY_DELAY_MS,
            char_ms: DEFAULT_CHAR_DELAY_MS,
            operation_ms: DEFAULT_OPERATION_DELAY_MS,
            close_ms: DEFAULT_CLOSE_DELAY_MS,
        }
    }
}

impl Delays {
    pub fn key(&self) -> Duration {
        Duration::from_millis(self.key_ms)
    }

    pub fn char(&self) -> Duration {
        Duration::from_millis(self.char_ms)
    }

    pub fn operation(&self) -> Duration {
        Duration::from_millis(self.operation_ms)
    }

    pub fn close(&self) -> Duration {
        Duration::from_millis(self.close_ms)
    }
}

/// Options for the tmux backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TmuxOptions {
    /// Dedicated server socket (`tmux -L`), so runs never touch the user's
    /// own tmux server.
    pub socket_name: String,
    pub session_name: String,
    pub start_delay_ms: u64,
    /// Keystroke sent and discarded right after launch, if any.
    pub prime_keystroke: Option<String>,
}

impl Default for TmuxOptions {
    fn default() -> Self {
        Self {
            socket_name: "termprobe".to_string(),
            session_name: "subject".to_string(),
            start_delay_ms: 100,
            prime_keystroke: None,
        }
    }
}

/// Options for the PTY backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PtyOptions {
    pub rows: u16,
    pub cols: u16,
    pub start_delay_ms: u64,
    /// Subjects driven through a bare PTY tend to drop the very first key, so
    /// one throwaway keystroke is sent after launch.
    pub prime_keystroke: Option<String>,
    /// Grace period between SIGTERM and SIGKILL on close.
    pub kill_grace_ms: u64,
}

impl Default for PtyOptions {
    fn default() -> Self {
        Self {
            rows: 24,
            cols: 80,
            start_delay_ms: 500,
            prime_keystroke: Some("x".to_string()),
            kill_grace_ms: 500,
        }
    }
}

/// Everything a run needs besides the test cases themselves.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
    /// Path to the subject executable.
    pub subject: PathBuf,
    pub backend: BackendKind,
    pub delays: Delays,
    pub launch_timeout_ms: u64,
    pub tmux: TmuxOptions,
    pub pty: PtyOptions,
    /// Stop at the first case that fails.
    pub stop_on_fail: bool,
    /// Run only these cases (all registered cases when empty).
    pub only: Vec<String>,
    /// Extra directory of YAML scenarios to register.
    pub scenarios_dir: Option<PathBuf>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            subject: PathBuf::new(),
            backend: BackendKind::Auto,
            delays: Delays::default(),
            launch_timeout_ms: DEFAULT_LAUNCH_TIMEOUT_MS,
            tmux: TmuxOptions::default(),
            pty: PtyOptions::default(),
            stop_on_fail: true,
            only: Vec::new(),
            scenarios_dir: None,
        }
    }
}

impl HarnessConfig {
    pub fn new(subject: impl Into<PathBuf>) -> Self {
        Self {
            subject: subject.into(),
            ..Self::default()
        }
    }

    /// Load a config file. `.json` files are parsed as JSON, anything else as
    /// YAML.
    ///
    /// # Errors
    /// `E_CONFIG` if the file cannot be read or parsed.
    pub fn load(path: &Path) -> HarnessResult<Self> {
        let data = fs::read_to_string(path).map_err(|err| {
            HarnessError::config(format!("failed to read {}: {err}", path.display()))
        })?;
        let parsed = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&data).map_err(|err| err.to_string())
        } else {
            serde_yml::from_str(&data).map_err(|err| err.to_string())
        };
        parsed.map_err(|err| {
            HarnessError::config(format!("failed to parse {}: {err}", path.display()))
        })
    }

    /// Check the settings that cannot be caught by the type system.
    ///
    /// # Errors
    /// `E_CONFIG` describing the first problem found.
    pub fn validate(&self) -> HarnessResult<()> {
        if self.subject.as_os_str().is_empty() {
            return Err(HarnessError::config(
                "no subject executable configured (use --subject or TERMPROBE_SUBJECT)",
            ));
        }
        if self.launch_timeout_ms == 0 {
            return Err(HarnessError::config("launch_timeout_ms must be positive"));
        }
        if self.pty.rows == 0 || self.pty.cols == 0 {
            return Err(HarnessError::config("pty rows and cols must be positive"));
        }
        if self.tmux.socket_name.is_empty() || self.tmux.session_name.is_empty() {
            return Err(HarnessError::config(
                "tmux socket_name and session_name must not be empty",
            ));
        }
        Ok(())
    }

    pub fn launch_timeout(&self) -> Duration {
        Duration::from_millis(self.launch_timeout_ms)
    }
}
