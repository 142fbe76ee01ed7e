//! tmux-backed subject driver.
//!
//! The subject runs as the command of a detached session on a dedicated
//! server socket (`tmux -L <socket>`). Attach to a live run with:
//!
//! ```sh
//! tmux -L termprobe attach -t subject
//! ```

use super::{unsupported_key, SubjectDriver, SubjectSession};
use crate::config::{HarnessConfig, TmuxOptions};
use crate::error::{HarnessError, HarnessResult};
use crate::keys::{Key, NamedKey};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{Duration, Instant};

/// Oldest supported tmux. 3.0 introduced `send-keys -H`, which raw key
/// dispatch relies on.
pub const TMUX_MIN_VERSION: (u32, u32) = (3, 0);

const BACKEND: &str = "tmux";
const POLL_INTERVAL: Duration = Duration::from_millis(20);

pub struct TmuxDriver {
    subject: PathBuf,
    options: TmuxOptions,
    launch_timeout: Duration,
    char_delay: Duration,
    version: String,
    session: Option<SubjectSession>,
    pane: Option<String>,
}

impl TmuxDriver {
    /// Probe the installed tmux and prepare a driver. Does not start a server.
    ///
    /// # Errors
    /// - `E_LAUNCH`: tmux is not installed or `tmux -V` fails
    /// - `E_CAPABILITY_VERSION`: tmux is older than [`TMUX_MIN_VERSION`]
    pub fn new(config: &HarnessConfig) -> HarnessResult<Self> {
        let output = Command::new("tmux")
            .arg("-V")
            .output()
            .map_err(|err| HarnessError::launch(format!("tmux is not available: {err}")))?;
        if !output.status.success() {
            return Err(HarnessError::launch(format!(
                "tmux -V failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
        check_version(&version)?;
        tracing::debug!(%version, socket = %config.tmux.socket_name, "tmux driver ready");

        Ok(Self {
            subject: config.subject.clone(),
            options: config.tmux.clone(),
            launch_timeout: config.launch_timeout(),
            char_delay: config.delays.char(),
            version,
            session: None,
            pane: None,
        })
    }

    /// tmux on the dedicated socket, ignoring the user's `~/.tmux.conf`.
    fn tmux(&self) -> Command {
        let mut cmd = Command::new("tmux");
        cmd.args(["-f", "/dev/null", "-L"]).arg(&self.options.socket_name);
        cmd
    }

    fn run(&self, args: &[&str]) -> HarnessResult<Output> {
        tracing::trace!(?args, "tmux");
        self.tmux()
            .args(args)
            .output()
            .map_err(|err| HarnessError::io(format!("failed to run tmux {}", args.join(" ")), err))
    }

    fn run_checked(&self, args: &[&str]) -> HarnessResult<Output> {
        let output = self.run(args)?;
        if output.status.success() {
            Ok(output)
        } else {
            Err(HarnessError::io(
                format!("tmux {} failed", args.join(" ")),
                std::io::Error::other(String::from_utf8_lossy(&output.stderr).trim().to_string()),
            ))
        }
    }

    /// Exact-match session target.
    fn session_target(&self) -> String {
        format!("={}", self.options.session_name)
    }

    /// The subject's pane, or the active pane of the session's current
    /// window. A bare `=name` is not a valid pane target.
    fn pane_target(&self) -> String {
        self.pane
            .clone()
            .unwrap_or_else(|| format!("{}:", self.session_target()))
    }

    fn has_session(&self) -> bool {
        self.run(&["has-session", "-t", &self.session_target()])
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    fn wait_for_session(&self) -> bool {
        let deadline = Instant::now() + self.launch_timeout;
        loop {
            if self.has_session() {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }

    fn send_keys(&self, extra: &[&str]) -> HarnessResult<()> {
        let target = self.pane_target();
        let mut args = vec!["send-keys", "-t", target.as_str()];
        args.extend_from_slice(extra);
        self.run_checked(&args).map(|_| ())
    }

    fn send_raw_byte(&self, code: u8) -> HarnessResult<()> {
        let hex = format!("{code:02x}");
        self.send_keys(&["-H", &hex])
    }
}

impl SubjectDriver for TmuxDriver {
    fn backend_name(&self) -> &'static str {
        BACKEND
    }

    fn start(&mut self, start_dir: &Path, args: &[String]) -> HarnessResult<()> {
        if self.session.as_ref().is_some_and(|s| s.running) {
            tracing::warn!("start called while a subject session is live, closing it first");
            self.close();
        }
        if self.has_session() {
            tracing::debug!(session = %self.options.session_name, "killing stale session");
            let _ = self.run(&["kill-session", "-t", &self.session_target()]);
        }

        let mut session = SubjectSession::new(&self.subject, args, start_dir);
        let argv = session.argv();
        let start_dir_arg = start_dir.display().to_string();
        let mut cmd_args = vec![
            "new-session",
            "-d",
            "-P",
            "-F",
            "#{pane_id}",
            "-s",
            self.options.session_name.as_str(),
            "-c",
            start_dir_arg.as_str(),
            "--",
        ];
        cmd_args.extend(argv.iter().map(String::as_str));
        tracing::debug!(?argv, "starting subject in tmux");

        let output = self.run(&cmd_args).map_err(|err| HarnessError::launch(err.to_string()))?;
        if !output.status.success() {
            return Err(HarnessError::launch(format!(
                "tmux new-session failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        let pane = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if pane.is_empty() {
            let _ = self.run(&["kill-session", "-t", &self.session_target()]);
            return Err(HarnessError::launch("tmux new-session did not report a pane id"));
        }
        if !self.wait_for_session() {
            return Err(HarnessError::launch(format!(
                "tmux session '{}' did not come up within {}ms",
                self.options.session_name,
                self.launch_timeout.as_millis()
            )));
        }

        self.pane = Some(pane);
        session.running = true;
        self.session = Some(session);
        tracing::debug!(pane = ?self.pane, "subject session attached");

        std::thread::sleep(Duration::from_millis(self.options.start_delay_ms));
        if let Some(prime) = self.options.prime_keystroke.clone() {
            tracing::debug!(%prime, "sending priming keystroke");
            self.send_text(&prime, true)?;
        }
        Ok(())
    }

    fn send_text(&mut self, text: &str, atomic: bool) -> HarnessResult<()> {
        tracing::debug!(text, atomic, "sending text");
        if atomic {
            return self.send_keys(&["-l", "--", &literal_arg(text)]);
        }
        let mut buf = [0u8; 4];
        for ch in text.chars() {
            self.send_keys(&["-l", "--", &literal_arg(ch.encode_utf8(&mut buf))])?;
            std::thread::sleep(self.char_delay);
        }
        Ok(())
    }

    fn send_special(&mut self, key: &Key) -> HarnessResult<()> {
        tracing::debug!(%key, "sending key");
        if let Some(code) = key.ascii_code() {
            return self.send_raw_byte(code);
        }
        match key {
            Key::Named(named) => match tmux_key_name(*named) {
                Some(name) => self.send_keys(&[name]),
                None => Err(unsupported_key(key, BACKEND)),
            },
            _ => Err(unsupported_key(key, BACKEND)),
        }
    }

    fn is_running(&mut self) -> bool {
        let running = self.session.is_some() && self.has_session();
        if let Some(session) = self.session.as_mut() {
            session.running = running;
        }
        running
    }

    fn is_running_cached(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.running)
    }

    fn close(&mut self) {
        if !self.is_running() {
            return;
        }
        match self.run_checked(&["kill-session", "-t", &self.session_target()]) {
            Ok(_) => tracing::debug!(session = %self.options.session_name, "subject session killed"),
            Err(err) => tracing::warn!(error = %err, "failed to kill subject session"),
        }
        if let Some(session) = self.session.as_mut() {
            session.running = false;
        }
        self.pane = None;
    }

    fn runtime_info(&self) -> String {
        let sessions = self
            .run(&["list-sessions", "-F", "#{session_name}:#{pane_pid}"])
            .ok()
            .filter(|output| output.status.success())
            .map(|output| {
                String::from_utf8_lossy(&output.stdout)
                    .lines()
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_else(|| "no server".to_string());
        format!(
            "[{} socket: {}, sessions: [{}], pane: {}, running: {}]",
            self.version,
            self.options.socket_name,
            sessions,
            self.pane.as_deref().unwrap_or("-"),
            self.is_running_cached()
        )
    }
}

impl Drop for TmuxDriver {
    fn drop(&mut self) {
        self.close();
    }
}

/// Protect a literal `send-keys` argument from tmux's command parser, which
/// splits commands on an argument ending in `;`.
fn literal_arg(text: &str) -> String {
    match text.strip_suffix(';') {
        Some(head) => format!("{head}\\;"),
        None => text.to_string(),
    }
}

/// tmux `send-keys` name for keys without an ASCII code.
fn tmux_key_name(key: NamedKey) -> Option<&'static str> {
    match key.name() {
        name @ ("Up" | "Down" | "Left" | "Right") => Some(name),
        _ => None,
    }
}

/// Parse `tmux -V` output into `(major, minor)`.
///
/// Handles release (`tmux 3.3a`), release candidate (`tmux 3.4-rc`) and
/// development (`tmux next-3.5`, `tmux master`) builds. Development builds
/// without a number are treated as newer than any release.
pub fn parse_tmux_version(output: &str) -> Option<(u32, u32)> {
    let raw = output.split_whitespace().nth(1)?;
    if raw == "master" {
        return Some((u32::MAX, 0));
    }
    let raw = raw.strip_prefix("next-").unwrap_or(raw);
    let mut parts = raw.splitn(2, '.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts
        .next()
        .map(|rest| {
            rest.chars()
                .take_while(char::is_ascii_digit)
                .collect::<String>()
        })
        .and_then(|digits| digits.parse().ok())
        .unwrap_or(0);
    Some((major, minor))
}

fn check_version(output: &str) -> HarnessResult<()> {
    let required = format!("{}.{}", TMUX_MIN_VERSION.0, TMUX_MIN_VERSION.1);
    match parse_tmux_version(output) {
        Some(version) if version >= TMUX_MIN_VERSION => Ok(()),
        _ => Err(HarnessError::CapabilityVersion {
            capability: "tmux".to_string(),
            detected: output
                .split_whitespace()
                .nth(1)
                .unwrap_or(output)
                .to_string(),
            required,
        }),
    }
}
