//! Sequential execution of test cases.
//!
//! [`Runner::run`] builds one [`Environment`], drives every selected case
//! through its lifecycle in registration order and tears the environment
//! down exactly once, whatever happens. Case outcomes:
//!
//! - validation returned `true`: passed
//! - validation returned `false`: failed
//! - setup or execute raised a case-local error (`E_IO`, `E_SANDBOX_PATH`,
//!   `E_SUBJECT_NOT_RUNNING`): errored, counted as failed
//!
//! Any other error is fatal. The failing case is still cleaned up, the
//! environment is torn down, and the error is returned instead of a summary.

pub mod progress;

pub use progress::{CollectingProgress, NoopProgress, ProgressCallback, ProgressEvent};

use crate::case::{CaseLifecycle, Phase, TestCase};
use crate::config::HarnessConfig;
use crate::environment::Environment;
use crate::error::{HarnessError, HarnessResult};
use crate::model::{CaseOutcome, CaseStatus, RunId, RunSummary};
use crate::registry::Registry;
use std::time::{Duration, Instant};

pub struct Runner {
    config: HarnessConfig,
    registry: Registry,
}

impl Runner {
    pub fn new(config: HarnessConfig, registry: Registry) -> Self {
        Self { config, registry }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Run the selected cases against a fresh environment.
    ///
    /// # Errors
    /// `E_UNKNOWN_CASE` before anything starts; environment construction
    /// errors; and any fatal error raised by a case.
    pub fn run(&self, progress: &dyn ProgressCallback) -> HarnessResult<RunSummary> {
        self.config.validate()?;
        let cases = self.registry.discover(&self.config.only)?;
        let mut env = Environment::from_config(&self.config)?;
        let result = run_cases(&mut env, cases, self.config.stop_on_fail, progress);
        env.cleanup();
        result
    }
}

/// Drive `cases` in order against `env`. Does not tear `env` down.
///
/// # Errors
/// The first fatal error raised by a case, after that case was cleaned up.
pub fn run_cases(
    env: &mut Environment,
    cases: Vec<Box<dyn TestCase>>,
    stop_on_fail: bool,
    progress: &dyn ProgressCallback,
) -> HarnessResult<RunSummary> {
    let run_id = RunId::new();
    let backend = env.driver_ref().backend_name();
    let started = Instant::now();
    let total = cases.len();
    let mut summary = RunSummary::new(run_id, backend, total);
    tracing::info!(%run_id, backend, cases = total, "starting run");
    progress.on_progress(&ProgressEvent::RunStarted {
        run_id,
        total_cases: total,
        backend,
    });

    for (index, mut case) in cases.into_iter().enumerate() {
        progress.on_progress(&ProgressEvent::CaseStarted {
            index: index + 1,
            name: case.name().to_string(),
        });
        let outcome = run_case(env, case.as_mut())?;
        progress.on_progress(&ProgressEvent::CaseCompleted {
            name: outcome.name.clone(),
            status: outcome.status,
            duration_ms: outcome.duration_ms,
        });
        let passed = outcome.passed();
        summary.record(outcome);
        if !passed && stop_on_fail && index + 1 < total {
            tracing::warn!(skipped = total - index - 1, "stopping at first failure");
            summary.stopped_early = true;
            break;
        }
    }

    summary.duration_ms = millis(started.elapsed());
    tracing::info!(
        executed = summary.executed,
        passed = summary.passed,
        failed = summary.failed(),
        "run finished"
    );
    progress.on_progress(&ProgressEvent::RunCompleted {
        run_id,
        success: summary.all_passed(),
        duration_ms: summary.duration_ms,
    });
    Ok(summary)
}

/// One case through setup, execute, validate and cleanup.
fn run_case(env: &mut Environment, case: &mut dyn TestCase) -> HarnessResult<CaseOutcome> {
    let name = case.name().to_string();
    let started = Instant::now();
    let mut lifecycle = CaseLifecycle::new();
    tracing::info!(case = %name, "running");

    let prepared = case.setup(env).and_then(|()| {
        advance(&mut lifecycle, Phase::SetUp);
        case.execute(env)
    });

    let (status, error) = match prepared {
        Ok(()) => {
            advance(&mut lifecycle, Phase::Executed);
            let passed = case.validate(env);
            advance(&mut lifecycle, Phase::Validated);
            case.cleanup(env);
            advance(&mut lifecycle, Phase::CleanedUp);
            let status = if passed {
                CaseStatus::Passed
            } else {
                CaseStatus::Failed
            };
            (status, None)
        }
        Err(err) => {
            tracing::error!(
                case = %name,
                phase = %lifecycle.phase(),
                code = err.code(),
                error = %err,
                "case aborted\n{}",
                env.diagnostics()
            );
            lifecycle.abort();
            case.cleanup(env);
            if err.is_fatal() {
                return Err(err);
            }
            (CaseStatus::Errored, Some(describe(&err)))
        }
    };

    let duration_ms = millis(started.elapsed());
    match status {
        CaseStatus::Passed => tracing::info!(case = %name, duration_ms, "passed"),
        _ => tracing::error!(case = %name, duration_ms, ?status, "failed"),
    }
    Ok(CaseOutcome {
        name,
        status,
        duration_ms,
        error,
    })
}

fn advance(lifecycle: &mut CaseLifecycle, to: Phase) {
    if let Err(err) = lifecycle.advance(to) {
        tracing::error!(%err, "case lifecycle out of order");
    }
}

fn describe(err: &HarnessError) -> String {
    format!("{}: {err}", err.code())
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
