//! Disposable filesystem root for fixtures and assertions.
//!
//! Every path handed to a [`Sandbox`] is relative to its root. Paths are made
//! absolute only at the boundary, when they are passed to the subject or
//! printed in diagnostics. The root is a fresh temporary directory that is
//! removed by [`Sandbox::dispose`] (or on drop).

use crate::error::{HarnessError, HarnessResult};
use std::fmt::Write as FmtWrite;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;

const ROOT_PREFIX: &str = "termprobe-";

/// Whether `relative` stays below whatever root it is joined to: no root,
/// drive prefix or `..` component.
pub fn is_contained(relative: &Path) -> bool {
    relative
        .components()
        .all(|component| matches!(component, Component::Normal(_) | Component::CurDir))
}

/// Fresh temporary directory tree owned by one run.
#[derive(Debug)]
pub struct Sandbox {
    root: PathBuf,
    dir: Option<TempDir>,
}

impl Sandbox {
    /// Allocate a uniquely named root under the OS temp directory.
    ///
    /// # Errors
    /// `E_SANDBOX_INIT` if the directory cannot be created.
    pub fn create() -> HarnessResult<Self> {
        let dir = tempfile::Builder::new()
            .prefix(ROOT_PREFIX)
            .tempdir()
            .map_err(|source| HarnessError::SandboxInit { source })?;
        Ok(Self::from_temp_dir(dir))
    }

    /// Allocate a uniquely named root under `parent`.
    ///
    /// # Errors
    /// `E_SANDBOX_INIT` if the directory cannot be created.
    pub fn create_in(parent: &Path) -> HarnessResult<Self> {
        let dir = tempfile::Builder::new()
            .prefix(ROOT_PREFIX)
            .tempdir_in(parent)
            .map_err(|source| HarnessError::SandboxInit { source })?;
        Ok(Self::from_temp_dir(dir))
    }

    fn from_temp_dir(dir: TempDir) -> Self {
        let root = dir.path().to_path_buf();
        tracing::debug!(root = %root.display(), "sandbox created");
        Self {
            root,
            dir: Some(dir),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a sandbox-relative path. Never touches the disk and does not
    /// check containment; see [`Sandbox::resolve`].
    pub fn absolute(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.root.join(relative)
    }

    /// Like [`Sandbox::absolute`], but refuses paths that would leave the root.
    ///
    /// # Errors
    /// `E_SANDBOX_PATH` for absolute paths and paths with `..` components.
    pub fn resolve(&self, relative: impl AsRef<Path>) -> HarnessResult<PathBuf> {
        let relative = relative.as_ref();
        if is_contained(relative) {
            Ok(self.root.join(relative))
        } else {
            Err(HarnessError::PathOutsideSandbox {
                path: relative.to_path_buf(),
            })
        }
    }

    /// Create a directory and its missing ancestors. Existing directories are
    /// not an error.
    ///
    /// # Errors
    /// `E_SANDBOX_PATH` for paths outside the root, `E_IO` if the directory
    /// cannot be created.
    pub fn make_dirs(&self, relative: impl AsRef<Path>) -> HarnessResult<()> {
        let path = self.resolve(relative)?;
        fs::create_dir_all(&path).map_err(|err| {
            HarnessError::io(format!("failed to create directory {}", path.display()), err)
        })
    }

    /// Create or overwrite a file. The parent directory must already exist.
    ///
    /// # Errors
    /// `E_SANDBOX_PATH` for paths outside the root, `E_IO` if the file cannot
    /// be written.
    pub fn create_file(&self, relative: impl AsRef<Path>, content: &str) -> HarnessResult<()> {
        let path = self.resolve(relative)?;
        fs::write(&path, content).map_err(|err| {
            HarnessError::io(format!("failed to write file {}", path.display()), err)
        })
    }

    /// Paths outside the root never exist as far as the sandbox is concerned.
    pub fn exists(&self, relative: impl AsRef<Path>) -> bool {
        match self.resolve(relative) {
            Ok(path) => path.exists(),
            Err(err) => {
                tracing::warn!(error = %err, "refusing to look outside the sandbox");
                false
            }
        }
    }

    /// Read a file as text.
    ///
    /// Returns an empty string (and logs) when the file is missing or
    /// unreadable; pair with [`Sandbox::exists`] to tell the two apart.
    pub fn read_file(&self, relative: impl AsRef<Path>) -> String {
        let path = match self.resolve(relative) {
            Ok(path) => path,
            Err(err) => {
                tracing::warn!(error = %err, "refusing to read outside the sandbox");
                return String::new();
            }
        };
        match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "failed to read sandbox file");
                String::new()
            }
        }
    }

    /// Depth-first listing of the sandbox (or of `relative` inside it).
    ///
    /// Entries are sorted by name within each directory and tagged `[D]` or
    /// `[F]`. Only meant for diagnostics.
    pub fn tree(&self, relative: Option<&Path>) -> String {
        let base = relative.map_or_else(|| self.root.clone(), |rel| self.absolute(rel));
        let mut out = String::new();
        let _ = writeln!(out, "{}", base.display());
        for entry in WalkDir::new(&base)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
        {
            let tag = if entry.file_type().is_dir() { "D" } else { "F" };
            let rel = entry.path().strip_prefix(&base).unwrap_or(entry.path());
            let indent = "  ".repeat(entry.depth().saturating_sub(1));
            let _ = writeln!(out, "{indent}[{tag}] {}", rel.display());
        }
        out
    }

    pub fn is_disposed(&self) -> bool {
        self.dir.is_none()
    }

    /// Remove the sandbox root. Safe to call more than once; removal failures
    /// are logged and the OS temp cleanup is left to reclaim the directory.
    pub fn dispose(&mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };
        match dir.close() {
            Ok(()) => tracing::debug!(root = %self.root.display(), "sandbox removed"),
            Err(err) => tracing::warn!(
                root = %self.root.display(),
                error = %err,
                "failed to remove sandbox root"
            ),
        }
    }
}

impl Drop for Sandbox {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn fresh_sandbox_is_empty() {
        let sandbox = Sandbox::create().unwrap();
        assert!(sandbox.root().is_dir());
        assert!(!sandbox.exists("anything"));
        assert!(!sandbox.exists("a/b/c.txt"));
    }

    #[test]
    fn absolute_is_pure() {
        let mut sandbox = Sandbox::create().unwrap();
        let first = sandbox.absolute("dir1/file1.txt");
        let second = sandbox.absolute("dir1/file1.txt");
        assert_eq!(first, second);
        assert!(first.starts_with(sandbox.root()));
        // No I/O: the path was never created.
        assert!(!first.exists());
        sandbox.dispose();
        assert_eq!(sandbox.absolute("dir1/file1.txt"), first);
    }

    #[test]
    fn exists_tracks_creation_and_disposal() {
        let mut sandbox = Sandbox::create().unwrap();
        sandbox.make_dirs("ops/dir1").unwrap();
        sandbox.create_file("ops/dir1/file1.txt", "hello\n").unwrap();
        assert!(sandbox.exists("ops/dir1"));
        assert!(sandbox.exists("ops/dir1/file1.txt"));

        sandbox.dispose();
        assert!(sandbox.is_disposed());
        assert!(!sandbox.exists("ops/dir1"));
        assert!(!sandbox.exists("ops/dir1/file1.txt"));
    }

    #[test]
    fn make_dirs_is_idempotent() {
        let sandbox = Sandbox::create().unwrap();
        sandbox.make_dirs("a/b/c").unwrap();
        sandbox.make_dirs("a/b/c").unwrap();
        sandbox.make_dirs("a/b").unwrap();
        assert!(sandbox.exists("a/b/c"));
    }

    #[test]
    fn create_file_overwrites() {
        let sandbox = Sandbox::create().unwrap();
        sandbox.create_file("note.txt", "one").unwrap();
        sandbox.create_file("note.txt", "two").unwrap();
        assert_eq!(sandbox.read_file("note.txt"), "two");
    }

    #[test]
    fn create_file_requires_parent() {
        let sandbox = Sandbox::create().unwrap();
        let err = sandbox.create_file("missing/note.txt", "x").unwrap_err();
        assert_eq!(err.code(), "E_IO");
    }

    #[test]
    fn read_missing_file_is_empty() {
        let sandbox = Sandbox::create().unwrap();
        assert_eq!(sandbox.read_file("nope.txt"), "");
    }

    #[test]
    fn tree_is_depth_first_and_sorted() {
        let sandbox = Sandbox::create().unwrap();
        sandbox.make_dirs("root/b").unwrap();
        sandbox.make_dirs("root/a/nested").unwrap();
        sandbox.create_file("root/a/nested/f.txt", "").unwrap();
        sandbox.create_file("root/z.txt", "").unwrap();

        let tree = sandbox.tree(Some(Path::new("root")));
        let entries: Vec<String> = tree.lines().skip(1).map(|l| l.trim().to_string()).collect();
        let nested = Path::new("a").join("nested");
        let expected = vec![
            "[D] a".to_string(),
            format!("[D] {}", nested.display()),
            format!("[F] {}", nested.join("f.txt").display()),
            "[D] b".to_string(),
            "[F] z.txt".to_string(),
        ];
        assert_eq!(entries, expected);
        assert_eq!(tree, sandbox.tree(Some(Path::new("root"))));
    }

    #[test]
    fn dispose_twice_is_harmless() {
        let mut sandbox = Sandbox::create().unwrap();
        let root = sandbox.root().to_path_buf();
        sandbox.dispose();
        sandbox.dispose();
        assert!(!root.exists());
    }

    #[test]
    fn paths_leaving_the_root_are_refused() {
        let outside = tempfile::tempdir().unwrap();
        let sandbox = Sandbox::create().unwrap();
        let target = outside.path().join("escaped.txt");

        let err = sandbox.create_file(&target, "x").unwrap_err();
        assert_eq!(err.code(), "E_SANDBOX_PATH");
        assert!(!target.exists());

        let err = sandbox.make_dirs("ops/../../escaped").unwrap_err();
        assert_eq!(err.code(), "E_SANDBOX_PATH");

        fs::write(&target, "secret").unwrap();
        assert!(!sandbox.exists(&target));
        assert_eq!(sandbox.read_file(&target), "");
    }

    #[test]
    fn containment_allows_plain_relative_paths() {
        assert!(is_contained(Path::new("ops/dir1/file1.txt")));
        assert!(is_contained(Path::new("./ops")));
        assert!(is_contained(Path::new("")));
        assert!(!is_contained(Path::new("/etc/passwd")));
        assert!(!is_contained(Path::new("ops/../..")));
    }

    #[test]
    fn create_in_uses_parent() {
        let parent = tempfile::tempdir().unwrap();
        let sandbox = Sandbox::create_in(parent.path()).unwrap();
        assert!(sandbox.root().starts_with(parent.path()));
    }
}
