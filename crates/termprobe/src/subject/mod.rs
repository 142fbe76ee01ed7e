//! Subject process management.
//!
//! [`SubjectDriver`] is the only contract test cases may rely on. Two
//! backends implement it:
//!
//! - [`TmuxDriver`]: runs the subject inside a detached tmux session on a
//!   dedicated server socket and injects keys with `send-keys`.
//! - [`PtyDriver`]: spawns the subject on a pseudo-terminal and writes key
//!   bytes to the PTY master.
//!
//! [`create_driver`] is the single place that picks a backend. Nothing else in
//! the crate looks at which backend is active.
//!
//! # Launch contract
//!
//! The subject is invoked as `<path> [extra-args...] <start-directory>` with
//! its working directory set to the start directory.

mod pty;
mod tmux;

pub use pty::PtyDriver;
pub use tmux::{parse_tmux_version, TmuxDriver, TMUX_MIN_VERSION};

use crate::config::{BackendKind, HarnessConfig};
use crate::error::{HarnessError, HarnessResult};
use crate::keys::Key;
use std::path::{Path, PathBuf};

/// Drives one subject process at a time.
///
/// Implementations keep at most one live session. Calling [`start`] while a
/// session is live is a caller error.
///
/// [`start`]: SubjectDriver::start
pub trait SubjectDriver {
    /// Short backend name for logs and error messages.
    fn backend_name(&self) -> &'static str;

    /// Launch the subject rooted at `start_dir`. Returns once the subject is
    /// ready to receive input.
    ///
    /// # Errors
    /// `E_LAUNCH` if the subject cannot be spawned or its session does not
    /// come up within the launch timeout.
    fn start(&mut self, start_dir: &Path, args: &[String]) -> HarnessResult<()>;

    /// Type `text`. With `atomic` the whole string goes out in one backend
    /// operation, otherwise one character at a time with the per-character
    /// delay.
    ///
    /// # Errors
    /// `E_IO` if the backend rejects the input.
    fn send_text(&mut self, text: &str, atomic: bool) -> HarnessResult<()>;

    /// Send a non-text key: its ASCII code as one raw byte when it has one,
    /// otherwise by name.
    ///
    /// # Errors
    /// `E_UNSUPPORTED_KEY` when the key has no code and the backend has no
    /// named equivalent; `E_IO` if the backend rejects the input.
    fn send_special(&mut self, key: &Key) -> HarnessResult<()>;

    /// Send any key: text atomically, everything else through
    /// [`SubjectDriver::send_special`].
    ///
    /// # Errors
    /// See [`SubjectDriver::send_text`] and [`SubjectDriver::send_special`].
    fn send_key(&mut self, key: &Key) -> HarnessResult<()> {
        match key {
            Key::Text(text) => self.send_text(text, true),
            special => self.send_special(special),
        }
    }

    /// Authoritative liveness check. Refreshes the cached flag.
    fn is_running(&mut self) -> bool;

    /// Last known liveness, without asking the backend. Logging only.
    fn is_running_cached(&self) -> bool;

    /// Best-effort termination. No-op when nothing is running; failures are
    /// logged, never returned.
    fn close(&mut self);

    /// Human-readable state for diagnostics. Not meant to be parsed.
    fn runtime_info(&self) -> String;
}

/// Launch parameters and cached state of the current subject.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubjectSession {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub start_dir: PathBuf,
    pub running: bool,
}

impl SubjectSession {
    pub fn new(program: &Path, args: &[String], start_dir: &Path) -> Self {
        Self {
            program: program.to_path_buf(),
            args: args.to_vec(),
            start_dir: start_dir.to_path_buf(),
            running: false,
        }
    }

    /// Full argument vector: `<program> [args...] <start_dir>`.
    pub fn argv(&self) -> Vec<String> {
        let mut argv = Vec::with_capacity(self.args.len() + 2);
        argv.push(self.program.display().to_string());
        argv.extend(self.args.iter().cloned());
        argv.push(self.start_dir.display().to_string());
        argv
    }
}

/// Build the driver selected by `config`.
///
/// # Errors
/// `E_LAUNCH` or `E_CAPABILITY_VERSION` when the backend is unusable.
pub fn create_driver(config: &HarnessConfig) -> HarnessResult<Box<dyn SubjectDriver>> {
    let backend = config.backend.resolve();
    tracing::debug!(%backend, subject = %config.subject.display(), "creating subject driver");
    match backend {
        BackendKind::Tmux => Ok(Box::new(TmuxDriver::new(config)?)),
        BackendKind::Pty | BackendKind::Auto => Ok(Box::new(PtyDriver::new(config))),
    }
}

pub(crate) fn unsupported_key(key: &Key, backend: &'static str) -> HarnessError {
    HarnessError::UnsupportedKey {
        key: key.to_string(),
        backend,
    }
}
