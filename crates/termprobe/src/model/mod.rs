pub mod run;
pub mod scenario;

pub use run::{CaseOutcome, CaseStatus, RunId, RunSummary};
pub use scenario::{ArgSpec, ContentSpec, ExpectSpec, FileSpec, ScenarioSpec};
