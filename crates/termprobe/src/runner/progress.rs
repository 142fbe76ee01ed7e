//! Progress callback for reporting run progress.
//!
//! This module provides a trait for receiving progress events while the
//! runner works through the selected cases.

use crate::model::{CaseStatus, RunId};
use std::sync::Mutex;

/// Event emitted during a run for progress tracking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// Run has started.
    RunStarted {
        /// Unique run identifier.
        run_id: RunId,
        /// Number of selected cases.
        total_cases: usize,
        /// Backend driving the subject.
        backend: &'static str,
    },
    /// A case has started.
    CaseStarted {
        /// Current case index (1-based).
        index: usize,
        /// Case name.
        name: String,
    },
    /// A case has finished (cleanup included).
    CaseCompleted {
        /// Case name.
        name: String,
        /// Final status.
        status: CaseStatus,
        /// Duration in milliseconds.
        duration_ms: u64,
    },
    /// Run has completed.
    RunCompleted {
        /// Unique run identifier.
        run_id: RunId,
        /// Whether every executed case passed.
        success: bool,
        /// Total duration in milliseconds.
        duration_ms: u64,
    },
}

/// Trait for receiving progress events during execution.
///
/// Implementors can use this to display progress or collect events.
pub trait ProgressCallback {
    /// Called for each progress event.
    fn on_progress(&self, event: &ProgressEvent);
}

/// A no-op progress callback that discards all events.
pub struct NoopProgress;

impl ProgressCallback for NoopProgress {
    fn on_progress(&self, _event: &ProgressEvent) {}
}

/// A progress callback that records every event, mostly for tests.
#[derive(Default)]
pub struct CollectingProgress {
    events: Mutex<Vec<ProgressEvent>>,
}

impl CollectingProgress {
    /// Create a new collecting progress callback.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get collected events.
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl ProgressCallback for CollectingProgress {
    fn on_progress(&self, event: &ProgressEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
