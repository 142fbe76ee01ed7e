//! Test case contract and lifecycle.
//!
//! Every case goes through four phases against the shared [`Environment`]:
//!
//! 1. `setup`: create fixtures in the sandbox.
//! 2. `execute`: launch the subject, send keys, let it close.
//! 3. `validate`: check the sandbox and subject liveness.
//! 4. `cleanup`: make sure the subject is gone.
//!
//! The runner tracks progress with a [`CaseLifecycle`], which only allows the
//! phases in that order. The one exception is the abort path: when setup or
//! execution fails, the case jumps straight to [`Phase::CleanedUp`] so cleanup
//! still runs.

mod generic;

pub use generic::{
    ContentCheck, ExpectedContent, FileFixture, GenericCase, GenericCaseBuilder, LaunchArg,
};

use crate::environment::Environment;
use crate::error::HarnessResult;
use std::fmt;
use thiserror::Error;

/// One end-to-end scenario.
pub trait TestCase {
    /// Unique name used for selection and reporting.
    fn name(&self) -> &str;

    /// Create the case's fixtures.
    fn setup(&mut self, env: &mut Environment) -> HarnessResult<()>;

    /// Drive the subject.
    fn execute(&mut self, env: &mut Environment) -> HarnessResult<()>;

    /// Check the outcome. Failures are logged, never returned as errors.
    fn validate(&mut self, env: &mut Environment) -> bool;

    /// Release per-case resources. Runs whatever happened before.
    fn cleanup(&mut self, env: &mut Environment);
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    #[default]
    Created,
    SetUp,
    Executed,
    Validated,
    CleanedUp,
}

impl Phase {
    /// Regular successor, `None` once cleaned up.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Created => Some(Self::SetUp),
            Self::SetUp => Some(Self::Executed),
            Self::Executed => Some(Self::Validated),
            Self::Validated => Some(Self::CleanedUp),
            Self::CleanedUp => None,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "created",
            Self::SetUp => "set-up",
            Self::Executed => "executed",
            Self::Validated => "validated",
            Self::CleanedUp => "cleaned-up",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("invalid phase transition {from} -> {to}")]
pub struct TransitionError {
    pub from: Phase,
    pub to: Phase,
}

/// Phase tracker for one case run.
#[derive(Debug, Default)]
pub struct CaseLifecycle {
    phase: Phase,
}

impl CaseLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Move to `to`, which must be the direct successor of the current phase.
    ///
    /// # Errors
    /// [`TransitionError`] for any other target.
    pub fn advance(&mut self, to: Phase) -> Result<(), TransitionError> {
        if self.phase.next() != Some(to) {
            return Err(TransitionError {
                from: self.phase,
                to,
            });
        }
        self.phase = to;
        Ok(())
    }

    /// Skip to [`Phase::CleanedUp`] from wherever the case is.
    pub fn abort(&mut self) {
        if self.phase != Phase::CleanedUp {
            tracing::debug!(from = %self.phase, "aborting case lifecycle");
        }
        self.phase = Phase::CleanedUp;
    }

    pub fn is_finished(&self) -> bool {
        self.phase == Phase::CleanedUp
    }
}
