//! Common test helper functions.

use std::fs;
use std::path::{Path, PathBuf};

use termprobe::HarnessConfig;

/// Locate a fixture binary built next to the harness binary.
///
/// Cargo only builds another package's binaries when the whole workspace is
/// built, so callers should skip their test when this returns `None`.
///
/// # Example
///
/// ```ignore
/// let logger = fixture_path(env!("CARGO_BIN_EXE_termprobe"), "termprobe-key-logger");
/// ```
pub fn fixture_path(harness_bin: &str, name: &str) -> Option<PathBuf> {
    let dir = Path::new(harness_bin).parent()?;
    let fixture = dir.join(format!("{name}{}", std::env::consts::EXE_SUFFIX));
    fixture.exists().then_some(fixture)
}

/// Write a harness config as YAML.
///
/// # Panics
///
/// Panics if serialization or file writing fails.
pub fn write_config(path: &Path, config: &HarnessConfig) {
    #[allow(clippy::expect_used)]
    let data = serde_yml::to_string(config).expect("failed to serialize config");

    #[allow(clippy::expect_used)]
    fs::write(path, data).expect("failed to write config file");
}
