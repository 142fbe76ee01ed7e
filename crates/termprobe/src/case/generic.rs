//! Data-driven test case.
//!
//! A [`GenericCase`] is fully described by data: fixtures to create, keys to
//! send, and what the sandbox and subject must look like afterwards. All of
//! its paths are relative to the case root, a subtree of the sandbox that no
//! other case uses.

use super::TestCase;
use crate::environment::Environment;
use crate::error::{HarnessError, HarnessResult};
use crate::keys::{parse_keys, Key, ESC};
use crate::model::{ArgSpec, ScenarioSpec};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileFixture {
    pub path: PathBuf,
    pub content: String,
}

/// Extra argument passed to the subject before the start directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LaunchArg {
    Literal(String),
    /// Case-relative path, passed as an absolute path.
    SandboxPath(PathBuf),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExpectedContent {
    Text(String),
    /// The absolute path of a case-relative entry.
    SandboxPath(PathBuf),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentCheck {
    pub path: PathBuf,
    pub expected: ExpectedContent,
}

#[derive(Clone, Debug)]
pub struct GenericCase {
    name: String,
    root: PathBuf,
    start_dir: PathBuf,
    dirs: Vec<PathBuf>,
    files: Vec<FileFixture>,
    args: Vec<LaunchArg>,
    keys: Vec<Key>,
    expect_exists: Vec<PathBuf>,
    expect_absent: Vec<PathBuf>,
    expect_contents: Vec<ContentCheck>,
    expect_running: bool,
    press_escape: bool,
    close_delay: Option<Duration>,
}

impl GenericCase {
    /// Start describing a case named `name` rooted at `root` in the sandbox.
    pub fn builder(name: impl Into<String>, root: impl Into<PathBuf>) -> GenericCaseBuilder {
        GenericCaseBuilder {
            case: Self {
                name: name.into(),
                root: root.into(),
                start_dir: PathBuf::new(),
                dirs: Vec::new(),
                files: Vec::new(),
                args: Vec::new(),
                keys: Vec::new(),
                expect_exists: Vec::new(),
                expect_absent: Vec::new(),
                expect_contents: Vec::new(),
                expect_running: false,
                press_escape: true,
                close_delay: None,
            },
        }
    }

    /// Build a case from a loaded scenario file.
    ///
    /// # Errors
    /// `E_SCENARIO` for invalid key notations or content checks that do not
    /// name exactly one expected value.
    pub fn from_spec(spec: ScenarioSpec, source: &Path) -> HarnessResult<Self> {
        let scenario_error = |message: String| HarnessError::Scenario {
            path: source.to_path_buf(),
            message,
        };
        let keys = parse_keys(&spec.keys).map_err(|err| scenario_error(err.to_string()))?;

        let mut builder = Self::builder(spec.name, spec.root)
            .with_start_dir(spec.start_dir)
            .with_dirs(spec.dirs)
            .with_keys(keys)
            .expect_exists(spec.expect.exists)
            .expect_absent(spec.expect.absent)
            .expect_running(spec.expect.running)
            .press_escape(spec.press_escape);
        for file in spec.files {
            builder = builder.with_file(file.path, file.content);
        }
        for arg in spec.args {
            builder = match arg {
                ArgSpec::Literal(value) => builder.with_arg(value),
                ArgSpec::SandboxPath { sandbox_path } => builder.with_sandbox_arg(sandbox_path),
            };
        }
        for check in spec.expect.contents {
            builder = match (check.text, check.sandbox_path) {
                (Some(text), None) => builder.expect_content(check.path, text),
                (None, Some(target)) => builder.expect_content_path(check.path, target),
                _ => {
                    return Err(scenario_error(format!(
                        "content check for {} needs exactly one of `text` or `sandbox_path`",
                        check.path.display()
                    )))
                }
            };
        }
        if let Some(ms) = spec.close_delay_ms {
            builder = builder.with_close_delay(Duration::from_millis(ms));
        }
        Ok(builder.build())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    fn case_path(&self, relative: &Path) -> PathBuf {
        if relative.as_os_str().is_empty() {
            self.root.clone()
        } else {
            self.root.join(relative)
        }
    }

    fn launch_args(&self, env: &Environment) -> HarnessResult<Vec<String>> {
        self.args
            .iter()
            .map(|arg| match arg {
                LaunchArg::Literal(value) => Ok(value.clone()),
                LaunchArg::SandboxPath(path) => env
                    .sandbox()
                    .resolve(self.case_path(path))
                    .map(|path| path.display().to_string()),
            })
            .collect()
    }

    /// Launch the subject in the case's start directory and make sure it
    /// came up.
    ///
    /// # Errors
    /// `E_SANDBOX_PATH` when the start directory or a path argument leaves
    /// the sandbox, launch errors from the driver, or
    /// `E_SUBJECT_NOT_RUNNING` when the subject died right after start.
    pub fn start_subject(&self, env: &mut Environment) -> HarnessResult<()> {
        let start_dir = env.sandbox().resolve(self.case_path(&self.start_dir))?;
        let args = self.launch_args(env)?;
        env.driver().start(&start_dir, &args)?;
        if !env.driver().is_running() {
            return Err(HarnessError::SubjectNotRunning {
                runtime_info: env.driver_ref().runtime_info(),
            });
        }
        Ok(())
    }

    /// Send every input key, pausing for the key delay after each.
    ///
    /// # Errors
    /// Dispatch errors from the driver.
    pub fn send_inputs(&self, env: &mut Environment) -> HarnessResult<()> {
        let key_delay = env.config().delays.key();
        for key in &self.keys {
            env.driver().send_key(key)?;
            std::thread::sleep(key_delay);
        }
        Ok(())
    }

    /// Let the last operation settle, then ask the subject to quit (unless
    /// the case keeps it open) and wait for it to close.
    ///
    /// # Errors
    /// Dispatch errors from the driver when sending Escape.
    pub fn finish_execution(&self, env: &mut Environment) -> HarnessResult<()> {
        let delays = env.config().delays.clone();
        std::thread::sleep(delays.operation());
        if self.press_escape {
            env.driver().send_special(&ESC)?;
        }
        std::thread::sleep(self.close_delay.unwrap_or_else(|| delays.close()));
        Ok(())
    }

    fn expected_text(&self, env: &Environment, expected: &ExpectedContent) -> String {
        match expected {
            ExpectedContent::Text(text) => text.clone(),
            ExpectedContent::SandboxPath(path) => env
                .sandbox()
                .absolute(self.case_path(path))
                .display()
                .to_string(),
        }
    }

    fn check_paths(&self, env: &Environment) -> bool {
        let mut ok = true;
        for path in &self.expect_exists {
            if !env.sandbox().exists(self.case_path(path)) {
                tracing::error!(case = %self.name, path = %path.display(), "expected path is missing");
                ok = false;
            }
        }
        for path in &self.expect_absent {
            if env.sandbox().exists(self.case_path(path)) {
                tracing::error!(case = %self.name, path = %path.display(), "path should not exist");
                ok = false;
            }
        }
        for check in &self.expect_contents {
            let path = self.case_path(&check.path);
            // An empty read is also what a missing file gives back.
            if !env.sandbox().exists(&path) {
                tracing::error!(case = %self.name, path = %check.path.display(), "file to compare is missing");
                ok = false;
                continue;
            }
            let expected = self.expected_text(env, &check.expected);
            let actual = env.sandbox().read_file(&path);
            // Trailing newlines written by the subject are not significant.
            if actual.trim_end_matches(['\r', '\n']) != expected {
                tracing::error!(
                    case = %self.name,
                    path = %check.path.display(),
                    %expected,
                    %actual,
                    "unexpected file content"
                );
                ok = false;
            }
        }
        ok
    }
}

impl TestCase for GenericCase {
    fn name(&self) -> &str {
        &self.name
    }

    fn setup(&mut self, env: &mut Environment) -> HarnessResult<()> {
        env.sandbox().make_dirs(&self.root)?;
        for dir in &self.dirs {
            env.sandbox().make_dirs(self.case_path(dir))?;
        }
        for file in &self.files {
            env.sandbox()
                .create_file(self.case_path(&file.path), &file.content)?;
        }
        tracing::debug!(case = %self.name, dirs = self.dirs.len(), files = self.files.len(), "fixtures created");
        Ok(())
    }

    fn execute(&mut self, env: &mut Environment) -> HarnessResult<()> {
        self.start_subject(env)?;
        self.send_inputs(env)?;
        self.finish_execution(env)
    }

    fn validate(&mut self, env: &mut Environment) -> bool {
        let paths_ok = self.check_paths(env);
        let running = env.driver().is_running();
        let liveness_ok = running == self.expect_running;
        if !liveness_ok {
            if running {
                tracing::error!(case = %self.name, "subject is still running");
            } else {
                tracing::error!(case = %self.name, "subject exited but should still be running");
            }
        }
        let ok = paths_ok && liveness_ok;
        if !ok {
            tracing::error!(case = %self.name, "validation failed\n{}", env.diagnostics());
        }
        ok
    }

    fn cleanup(&mut self, env: &mut Environment) {
        if env.driver().is_running() {
            tracing::debug!(case = %self.name, "closing subject left running");
            env.driver().close();
        }
    }
}

/// Fluent construction of a [`GenericCase`].
#[derive(Clone, Debug)]
pub struct GenericCaseBuilder {
    case: GenericCase,
}

impl GenericCaseBuilder {
    /// Directory the subject is started in. Defaults to the case root.
    #[must_use]
    pub fn with_start_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.case.start_dir = dir.into();
        self
    }

    #[must_use]
    pub fn with_dirs<I, P>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.case.dirs.extend(dirs.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.case.files.push(FileFixture {
            path: path.into(),
            content: content.into(),
        });
        self
    }

    #[must_use]
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.case.args.push(LaunchArg::Literal(arg.into()));
        self
    }

    #[must_use]
    pub fn with_sandbox_arg(mut self, path: impl Into<PathBuf>) -> Self {
        self.case.args.push(LaunchArg::SandboxPath(path.into()));
        self
    }

    #[must_use]
    pub fn with_keys(mut self, keys: impl IntoIterator<Item = Key>) -> Self {
        self.case.keys.extend(keys);
        self
    }

    #[must_use]
    pub fn expect_exists<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.case.expect_exists.extend(paths.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn expect_absent<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.case.expect_absent.extend(paths.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn expect_content(mut self, path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        self.case.expect_contents.push(ContentCheck {
            path: path.into(),
            expected: ExpectedContent::Text(text.into()),
        });
        self
    }

    /// `path` must contain the absolute sandbox path of `target`.
    #[must_use]
    pub fn expect_content_path(
        mut self,
        path: impl Into<PathBuf>,
        target: impl Into<PathBuf>,
    ) -> Self {
        self.case.expect_contents.push(ContentCheck {
            path: path.into(),
            expected: ExpectedContent::SandboxPath(target.into()),
        });
        self
    }

    /// Subject must still be running after execution (default: closed).
    #[must_use]
    pub fn expect_running(mut self, running: bool) -> Self {
        self.case.expect_running = running;
        self
    }

    /// Send Escape after the input keys (default: true).
    #[must_use]
    pub fn press_escape(mut self, press: bool) -> Self {
        self.case.press_escape = press;
        self
    }

    #[must_use]
    pub fn with_close_delay(mut self, delay: Duration) -> Self {
        self.case.close_delay = Some(delay);
        self
    }

    #[must_use]
    pub fn build(self) -> GenericCase {
        self.case
    }
}
