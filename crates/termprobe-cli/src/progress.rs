//! Verbose progress output using indicatif.

use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::sync::Mutex;
use termprobe::{CaseStatus, ProgressCallback, ProgressEvent};

/// Progress callback that shows a spinner per case on stderr.
pub struct VerboseProgress {
    spinner: Mutex<Option<ProgressBar>>,
    total_cases: Mutex<usize>,
}

impl VerboseProgress {
    pub fn new() -> Self {
        Self {
            spinner: Mutex::new(None),
            total_cases: Mutex::new(0),
        }
    }

    fn finish_spinner(&self) {
        if let Ok(mut spinner) = self.spinner.lock() {
            if let Some(pb) = spinner.take() {
                pb.finish_and_clear();
            }
        }
    }
}

impl ProgressCallback for VerboseProgress {
    fn on_progress(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::RunStarted {
                run_id,
                total_cases,
                backend,
            } => {
                if let Ok(mut total) = self.total_cases.lock() {
                    *total = *total_cases;
                }
                // stderr keeps stdout clean for --json
                let _ = writeln!(
                    std::io::stderr(),
                    "run started: {run_id} ({total_cases} cases, {backend} backend)"
                );
            }
            ProgressEvent::CaseStarted { index, name } => {
                let total = self.total_cases.lock().map(|g| *g).unwrap_or(0);
                let pb = ProgressBar::new_spinner();
                pb.set_style(
                    ProgressStyle::default_spinner()
                        .template("{spinner:.cyan} [{elapsed_precise}] {msg}")
                        .unwrap_or_else(|_| ProgressStyle::default_spinner()),
                );
                pb.set_message(format!("[{index}/{total}] {name}"));
                pb.enable_steady_tick(std::time::Duration::from_millis(100));

                if let Ok(mut spinner) = self.spinner.lock() {
                    *spinner = Some(pb);
                }
            }
            ProgressEvent::CaseCompleted {
                name,
                status,
                duration_ms,
            } => {
                self.finish_spinner();
                let status_icon = match status {
                    CaseStatus::Passed => "\x1b[32m✓\x1b[0m",
                    CaseStatus::Failed => "\x1b[31m✗\x1b[0m",
                    CaseStatus::Errored => "\x1b[31m!\x1b[0m",
                };
                let _ = writeln!(
                    std::io::stderr(),
                    "  {status_icon} {name} ({duration_ms}ms)"
                );
            }
            ProgressEvent::RunCompleted {
                run_id: _,
                success,
                duration_ms,
            } => {
                self.finish_spinner();
                let status_msg = if *success {
                    "\x1b[32mpassed\x1b[0m"
                } else {
                    "\x1b[31mfailed\x1b[0m"
                };
                let _ = writeln!(
                    std::io::stderr(),
                    "run {status_msg}: {duration_ms}ms total"
                );
            }
        }
    }
}
