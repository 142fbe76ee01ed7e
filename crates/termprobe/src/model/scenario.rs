use crate::error::{HarnessError, HarnessResult};
use crate::sandbox::is_contained;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Declarative scenario as stored in a YAML (or JSON) file.
///
/// All paths are relative to `root`, which is itself relative to the sandbox.
///
/// ```yaml
/// name: rename_notes
/// root: rename_notes
/// start_dir: dir1
/// dirs: [dir1]
/// files:
///   - path: dir1/notes.txt
///     content: hello
/// keys: ["<ctrl+r>", "<backspace>", "2", "<enter>"]
/// expect:
///   exists: [dir1/notes.tx2]
///   absent: [dir1/notes.txt]
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioSpec {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub root: PathBuf,
    #[serde(default)]
    pub start_dir: PathBuf,
    #[serde(default)]
    pub dirs: Vec<PathBuf>,
    #[serde(default)]
    pub files: Vec<FileSpec>,
    #[serde(default)]
    pub args: Vec<ArgSpec>,
    /// Key notations, see [`crate::keys`].
    #[serde(default)]
    pub keys: Vec<String>,
    #[serde(default)]
    pub expect: ExpectSpec,
    #[serde(default = "default_true")]
    pub press_escape: bool,
    #[serde(default)]
    pub close_delay_ms: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileSpec {
    pub path: PathBuf,
    #[serde(default)]
    pub content: String,
}

/// Extra launch argument: literal text, or a case path made absolute at launch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgSpec {
    Literal(String),
    SandboxPath { sandbox_path: PathBuf },
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExpectSpec {
    pub exists: Vec<PathBuf>,
    pub absent: Vec<PathBuf>,
    pub contents: Vec<ContentSpec>,
    /// Subject must still be running after execution instead of closed.
    pub running: bool,
}

/// Expected file content: exactly one of `text` or `sandbox_path`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContentSpec {
    pub path: PathBuf,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub sandbox_path: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}

impl ScenarioSpec {
    /// Read a scenario file. `.yaml`/`.yml` files are parsed as YAML,
    /// anything else as JSON.
    ///
    /// # Errors
    /// `E_SCENARIO` if the file cannot be read or parsed, or names a path
    /// that would leave the sandbox.
    pub fn load(path: &Path) -> HarnessResult<Self> {
        let scenario_error = |message: String| HarnessError::Scenario {
            path: path.to_path_buf(),
            message,
        };
        let data = fs::read_to_string(path)
            .map_err(|err| scenario_error(format!("failed to read: {err}")))?;
        let is_yaml = path
            .extension()
            .is_some_and(|ext| ext == "yaml" || ext == "yml");
        let spec: Self = if is_yaml {
            serde_yml::from_str(&data).map_err(|err| scenario_error(err.to_string()))?
        } else {
            serde_json::from_str(&data).map_err(|err| scenario_error(err.to_string()))?
        };
        if spec.name.trim().is_empty() {
            return Err(scenario_error("name must not be empty".to_string()));
        }
        if let Some(escaping) = spec.paths().find(|path| !is_contained(path)) {
            return Err(scenario_error(format!(
                "path {} must be relative and must not contain `..`",
                escaping.display()
            )));
        }
        Ok(spec)
    }

    /// Every sandbox path the scenario mentions.
    fn paths(&self) -> impl Iterator<Item = &Path> {
        let args = self.args.iter().filter_map(|arg| match arg {
            ArgSpec::Literal(_) => None,
            ArgSpec::SandboxPath { sandbox_path } => Some(sandbox_path.as_path()),
        });
        let contents = self.expect.contents.iter().flat_map(|check| {
            std::iter::once(check.path.as_path()).chain(check.sandbox_path.as_deref())
        });
        [self.root.as_path(), self.start_dir.as_path()]
            .into_iter()
            .chain(self.dirs.iter().map(PathBuf::as_path))
            .chain(self.files.iter().map(|file| file.path.as_path()))
            .chain(args)
            .chain(self.expect.exists.iter().map(PathBuf::as_path))
            .chain(self.expect.absent.iter().map(PathBuf::as_path))
            .chain(contents)
    }
}
