use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(Uuid);

impl RunId {
    /// Create a new unique run ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    Passed,
    /// Validation found a mismatch.
    Failed,
    /// Setup or execution raised a case-local error.
    Errored,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CaseOutcome {
    pub name: String,
    pub status: CaseStatus,
    pub duration_ms: u64,
    /// Error code and message when the case errored.
    pub error: Option<String>,
}

impl CaseOutcome {
    pub fn passed(&self) -> bool {
        self.status == CaseStatus::Passed
    }
}

/// Aggregate result of one run.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunSummary {
    pub run_id: RunId,
    pub backend: String,
    /// Cases that reached execution (passed, failed or errored).
    pub executed: usize,
    pub passed: usize,
    /// Cases selected for the run, including the ones skipped by fail-fast.
    pub selected: usize,
    pub stopped_early: bool,
    pub duration_ms: u64,
    pub cases: Vec<CaseOutcome>,
}

impl RunSummary {
    pub fn new(run_id: RunId, backend: impl Into<String>, selected: usize) -> Self {
        Self {
            run_id,
            backend: backend.into(),
            executed: 0,
            passed: 0,
            selected,
            stopped_early: false,
            duration_ms: 0,
            cases: Vec::new(),
        }
    }

    pub fn record(&mut self, outcome: CaseOutcome) {
        self.executed += 1;
        if outcome.passed() {
            self.passed += 1;
        }
        self.cases.push(outcome);
    }

    pub fn failed(&self) -> usize {
        self.executed - self.passed
    }

    pub fn all_passed(&self) -> bool {
        self.passed == self.executed
    }
}
