//! termprobe: end-to-end harness for interactive terminal applications.
//!
//! The harness launches a subject program inside tmux or on a bare PTY,
//! rooted in a disposable sandbox directory, types keys at it with fixed
//! settle delays, and then asserts on what the subject left behind on disk
//! and on whether it is still running. Rendered output is never inspected.
//!
//! ```no_run
//! use termprobe::{HarnessConfig, NoopProgress, Registry, Runner};
//!
//! # fn example() -> termprobe::HarnessResult<()> {
//! let mut config = HarnessConfig::new("/usr/local/bin/spf");
//! config.only = vec!["copy".to_string(), "rename".to_string()];
//! let summary = Runner::new(config, Registry::builtin()).run(&NoopProgress)?;
//! assert!(summary.all_passed());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
// Public API types have docs; the rest is documented where it helps.
#![allow(missing_docs)]

pub mod case;
pub mod config;
pub mod environment;
pub mod error;
pub mod keys;
pub mod model;
pub mod registry;
pub mod runner;
pub mod sandbox;
pub mod scenarios;
pub mod subject;

pub use crate::case::{CaseLifecycle, GenericCase, Phase, TestCase};
pub use crate::config::{BackendKind, HarnessConfig};
pub use crate::environment::Environment;
pub use crate::error::{HarnessError, HarnessResult};
pub use crate::keys::Key;
pub use crate::model::{CaseOutcome, CaseStatus, RunId, RunSummary};
pub use crate::registry::Registry;
pub use crate::runner::{NoopProgress, ProgressCallback, ProgressEvent, Runner};
pub use crate::sandbox::Sandbox;
pub use crate::subject::{create_driver, SubjectDriver};
