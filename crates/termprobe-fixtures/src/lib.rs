//! Fixture subjects and test helpers for termprobe integration tests.
//!
//! The binaries in this crate are tiny terminal programs the harness can
//! drive end to end:
//!
//! - `termprobe-key-logger <dir>` appends every byte it receives to
//!   `<dir>/keys.log` and exits on a lone Escape.
//! - `termprobe-mini-fm [--chooser-file <path>] <dir>` is a single-panel file
//!   manager that understands the key bindings of the built-in scenarios.
//!
//! The library half holds the filesystem operations the file manager uses and
//! helpers for locating the binaries and writing config files from tests.
//!
//! # Example
//!
//! ```ignore
//! use termprobe_fixtures::{fixture_path, write_config};
//!
//! let Some(subject) = fixture_path(env!("CARGO_BIN_EXE_termprobe"), "termprobe-mini-fm") else {
//!     return;
//! };
//! let mut config = termprobe::HarnessConfig::new(subject);
//! config.backend = termprobe::BackendKind::Pty;
//! write_config(&dir.join("termprobe.yaml"), &config);
//! ```

pub mod fs_ops;
pub mod helpers;

pub use fs_ops::{copy_entry, move_entry, remove_entry, unique_destination};
pub use helpers::{fixture_path, write_config};
