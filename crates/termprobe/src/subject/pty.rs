//! PTY-backed subject driver.
//!
//! The subject is spawned directly on a pseudo-terminal. Key bytes are written
//! to the master side; output is drained on a background thread and discarded
//! so the subject never blocks on a full PTY buffer.

use super::{unsupported_key, SubjectDriver, SubjectSession};
use crate::config::{HarnessConfig, PtyOptions};
use crate::error::{HarnessError, HarnessResult};
use crate::keys::{Key, KEY_DOWN, KEY_LEFT, KEY_PASTE, KEY_RIGHT, KEY_UP};
#[cfg(unix)]
use nix::sys::signal::{killpg, Signal};
#[cfg(unix)]
use nix::unistd::Pid;
use portable_pty::{native_pty_system, Child, CommandBuilder, MasterPty, PtySize};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

const BACKEND: &str = "pty";
const POLL_INTERVAL: Duration = Duration::from_millis(10);
const KILL_WAIT: Duration = Duration::from_millis(200);

struct PtyProcess {
    session: SubjectSession,
    // Kept alive so the slave side stays open while the subject runs.
    _master: Box<dyn MasterPty + Send>,
    writer: Box<dyn Write + Send>,
    child: Box<dyn Child + Send + Sync>,
    output_bytes: Arc<AtomicU64>,
    started_at: Instant,
}

pub struct PtyDriver {
    subject: PathBuf,
    options: PtyOptions,
    char_delay: Duration,
    process: Option<PtyProcess>,
}

impl PtyDriver {
    pub fn new(config: &HarnessConfig) -> Self {
        Self {
            subject: config.subject.clone(),
            options: config.pty.clone(),
            char_delay: config.delays.char(),
            process: None,
        }
    }

    fn spawn(&self, start_dir: &Path, args: &[String]) -> HarnessResult<PtyProcess> {
        let pair = native_pty_system()
            .openpty(PtySize {
                rows: self.options.rows,
                cols: self.options.cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|err| HarnessError::launch(format!("failed to open pty: {err}")))?;

        let session = SubjectSession::new(&self.subject, args, start_dir);
        let mut cmd = CommandBuilder::new(&session.program);
        cmd.args(&session.args);
        cmd.arg(&session.start_dir);
        cmd.cwd(&session.start_dir);
        tracing::debug!(argv = ?session.argv(), "spawning subject on pty");

        let child = pair.slave.spawn_command(cmd).map_err(|err| {
            HarnessError::launch(format!(
                "failed to spawn {}: {err}",
                session.program.display()
            ))
        })?;
        drop(pair.slave);

        let reader = pair
            .master
            .try_clone_reader()
            .map_err(|err| HarnessError::launch(format!("failed to clone pty reader: {err}")))?;
        let writer = pair
            .master
            .take_writer()
            .map_err(|err| HarnessError::launch(format!("failed to take pty writer: {err}")))?;

        let output_bytes = Arc::new(AtomicU64::new(0));
        spawn_drain(reader, Arc::clone(&output_bytes))?;

        Ok(PtyProcess {
            session,
            _master: pair.master,
            writer,
            child,
            output_bytes,
            started_at: Instant::now(),
        })
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> HarnessResult<()> {
        let process = self.process.as_mut().ok_or_else(|| {
            HarnessError::io(
                "no subject process to write to",
                std::io::Error::from(std::io::ErrorKind::NotConnected),
            )
        })?;
        process
            .writer
            .write_all(bytes)
            .map_err(|err| HarnessError::io("failed to write to pty", err))?;
        process
            .writer
            .flush()
            .map_err(|err| HarnessError::io("failed to flush pty", err))
    }

    fn wait_for_exit(process: &mut PtyProcess, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            match process.child.try_wait() {
                Ok(Some(status)) => {
                    tracing::debug!(?status, "subject exited");
                    return true;
                }
                Ok(None) if Instant::now() < deadline => std::thread::sleep(POLL_INTERVAL),
                Ok(None) => return false,
                Err(err) => {
                    tracing::warn!(error = %err, "failed to poll subject");
                    return false;
                }
            }
        }
    }

    fn terminate(process: &mut PtyProcess, grace: Duration) {
        #[cfg(unix)]
        if let Some(pgid) = process
            .child
            .process_id()
            .and_then(|pid| i32::try_from(pid).ok())
            .map(Pid::from_raw)
        {
            signal_process_group(pgid, Signal::SIGTERM);
            if Self::wait_for_exit(process, grace) {
                return;
            }
            tracing::debug!("subject ignored SIGTERM, sending SIGKILL");
            signal_process_group(pgid, Signal::SIGKILL);
            if !Self::wait_for_exit(process, KILL_WAIT) {
                tracing::warn!("subject still alive after SIGKILL");
            }
            return;
        }

        if let Err(err) = process.child.kill() {
            tracing::warn!(error = %err, "failed to kill subject");
        }
        Self::wait_for_exit(process, grace);
    }
}

impl SubjectDriver for PtyDriver {
    fn backend_name(&self) -> &'static str {
        BACKEND
    }

    fn start(&mut self, start_dir: &Path, args: &[String]) -> HarnessResult<()> {
        if self.process.is_some() {
            tracing::warn!("start called while a subject is live, closing it first");
            self.close();
        }
        let mut process = self.spawn(start_dir, args)?;
        process.session.running = true;
        self.process = Some(process);

        std::thread::sleep(Duration::from_millis(self.options.start_delay_ms));
        if let Some(prime) = self.options.prime_keystroke.clone() {
            tracing::debug!(%prime, "sending priming keystroke");
            self.write_bytes(prime.as_bytes())?;
        }
        Ok(())
    }

    fn send_text(&mut self, text: &str, atomic: bool) -> HarnessResult<()> {
        tracing::debug!(text, atomic, "sending text");
        if atomic {
            return self.write_bytes(text.as_bytes());
        }
        let mut buf = [0u8; 4];
        for ch in text.chars() {
            self.write_bytes(ch.encode_utf8(&mut buf).as_bytes())?;
            std::thread::sleep(self.char_delay);
        }
        Ok(())
    }

    fn send_special(&mut self, key: &Key) -> HarnessResult<()> {
        tracing::debug!(%key, "sending key");
        if let Some(code) = key.ascii_code() {
            return self.write_bytes(&[code]);
        }
        let bytes = key_sequence(key).ok_or_else(|| unsupported_key(key, BACKEND))?;
        self.write_bytes(bytes)
    }

    fn is_running(&mut self) -> bool {
        let Some(process) = self.process.as_mut() else {
            return false;
        };
        let running = matches!(process.child.try_wait(), Ok(None));
        process.session.running = running;
        running
    }

    fn is_running_cached(&self) -> bool {
        self.process.as_ref().is_some_and(|p| p.session.running)
    }

    fn close(&mut self) {
        let Some(mut process) = self.process.take() else {
            return;
        };
        let _ = process.writer.flush();
        if matches!(process.child.try_wait(), Ok(None)) {
            Self::terminate(&mut process, Duration::from_millis(self.options.kill_grace_ms));
        }
        tracing::debug!(
            output_bytes = process.output_bytes.load(Ordering::Relaxed),
            "subject closed"
        );
    }

    fn runtime_info(&self) -> String {
        match &self.process {
            None => "[no subject process]".to_string(),
            Some(process) => format!(
                "[PID : {}, running: {}, uptime: {}ms, output bytes: {}, argv: {:?}]",
                process
                    .child
                    .process_id()
                    .map_or_else(|| "?".to_string(), |pid| pid.to_string()),
                process.session.running,
                process.started_at.elapsed().as_millis(),
                process.output_bytes.load(Ordering::Relaxed),
                process.session.argv()
            ),
        }
    }
}

impl Drop for PtyDriver {
    fn drop(&mut self) {
        self.close();
    }
}

fn spawn_drain(mut reader: Box<dyn Read + Send>, counter: Arc<AtomicU64>) -> HarnessResult<()> {
    std::thread::Builder::new()
        .name("termprobe-pty-drain".to_string())
        .spawn(move || {
            let mut buf = [0u8; 4096];
            loop {
                match reader.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(count) => {
                        counter.fetch_add(count as u64, Ordering::Relaxed);
                    }
                }
            }
        })
        .map(|_| ())
        .map_err(|err| HarnessError::io("failed to start pty drain thread", err))
}

/// Escape sequence for keys that have no single-byte code.
fn key_sequence(key: &Key) -> Option<&'static [u8]> {
    let Key::Named(named) = key else {
        return None;
    };
    match *named {
        KEY_UP => Some(b"\x1b[A"),
        KEY_DOWN => Some(b"\x1b[B"),
        KEY_RIGHT => Some(b"\x1b[C"),
        KEY_LEFT => Some(b"\x1b[D"),
        KEY_PASTE => Some(b"\x1b[200~\x1b[201~"),
        _ => None,
    }
}

#[cfg(unix)]
fn signal_process_group(pgid: Pid, signal: Signal) {
    match killpg(pgid, signal) {
        // Already gone.
        Ok(()) | Err(nix::errno::Errno::ESRCH) => {}
        Err(err) => tracing::warn!(error = %err, ?signal, "failed to signal subject"),
    }
}
