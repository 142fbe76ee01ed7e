//! Name → constructor map of runnable test cases.
//!
//! Cases are registered explicitly, in order. [`Registry::builtin`] holds the
//! built-in scenarios and [`Registry::load_dir`] adds scenario files from
//! disk. Discovery always hands out fresh instances.

use crate::case::{GenericCase, TestCase};
use crate::error::{HarnessError, HarnessResult};
use crate::model::ScenarioSpec;
use crate::scenarios;
use std::fs;
use std::path::{Path, PathBuf};

type Factory = Box<dyn Fn() -> Box<dyn TestCase>>;

#[derive(Default)]
pub struct Registry {
    entries: Vec<(String, Factory)>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in file-manager scenarios.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        let builtins: [(&str, fn() -> GenericCase); 11] = [
            ("copy", scenarios::copy),
            ("copy_dir", scenarios::copy_dir),
            ("copy_duplicate", scenarios::copy_duplicate),
            ("cut", scenarios::cut),
            ("delete", scenarios::delete),
            ("delete_dir", scenarios::delete_dir),
            ("rename", scenarios::rename),
            ("command", scenarios::command),
            ("compress_extract", scenarios::compress_extract),
            ("empty_panel", scenarios::empty_panel),
            ("chooser_file", scenarios::chooser_file),
        ];
        for (name, build) in builtins {
            registry.insert(
                name.to_string(),
                Box::new(move || Box::new(build()) as Box<dyn TestCase>),
            );
        }
        registry
    }

    fn insert(&mut self, name: String, factory: Factory) {
        if let Some(slot) = self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            tracing::debug!(%name, "replacing registered case");
            slot.1 = factory;
        } else {
            self.entries.push((name, factory));
        }
    }

    /// Register a case constructor. A later registration under the same name
    /// replaces the earlier one but keeps its position.
    pub fn register<F, C>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> C + 'static,
        C: TestCase + 'static,
    {
        self.insert(
            name.into(),
            Box::new(move || Box::new(factory()) as Box<dyn TestCase>),
        );
    }

    /// Register every `*.yaml`/`*.yml` scenario in `dir`, in file name order.
    /// Returns the names registered.
    ///
    /// # Errors
    /// `E_SCENARIO` if the directory cannot be read or a file is invalid.
    pub fn load_dir(&mut self, dir: &Path) -> HarnessResult<Vec<String>> {
        let read_error = |err: std::io::Error| HarnessError::Scenario {
            path: dir.to_path_buf(),
            message: format!("failed to read scenario directory: {err}"),
        };
        let mut paths: Vec<PathBuf> = fs::read_dir(dir)
            .map_err(read_error)?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && path
                        .extension()
                        .is_some_and(|ext| ext == "yaml" || ext == "yml")
            })
            .collect();
        paths.sort();

        let mut names = Vec::with_capacity(paths.len());
        for path in paths {
            let spec = ScenarioSpec::load(&path)?;
            let name = spec.name.clone();
            let case = GenericCase::from_spec(spec, &path)?;
            tracing::debug!(%name, path = %path.display(), "registered scenario file");
            self.insert(
                name.clone(),
                Box::new(move || Box::new(case.clone()) as Box<dyn TestCase>),
            );
            names.push(name);
        }
        Ok(names)
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fresh instances of the selected cases, in registration order. An empty
    /// `only` selects everything.
    ///
    /// # Errors
    /// `E_UNKNOWN_CASE` for the first name in `only` that is not registered.
    pub fn discover(&self, only: &[String]) -> HarnessResult<Vec<Box<dyn TestCase>>> {
        if let Some(unknown) = only
            .iter()
            .find(|wanted| !self.entries.iter().any(|(name, _)| name == *wanted))
        {
            return Err(HarnessError::UnknownCase {
                name: unknown.clone(),
            });
        }
        Ok(self
            .entries
            .iter()
            .filter(|(name, _)| only.is_empty() || only.contains(name))
            .map(|(_, factory)| factory())
            .collect())
    }
}
