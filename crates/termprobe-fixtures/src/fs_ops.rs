//! File operations behind the mini file manager's key bindings.
//!
//! Pasting onto an existing name never overwrites: the destination gets a
//! `(n)` suffix before the extension, `file1.txt` becoming `file1(1).txt`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// First free path for `name` inside `dir`.
///
/// `name` itself when unused, otherwise `stem(n).ext` with the smallest
/// `n >= 1` that does not exist yet.
pub fn unique_destination(dir: &Path, name: &str) -> PathBuf {
    let candidate = dir.join(name);
    if !candidate.exists() {
        return candidate;
    }
    let (stem, ext) = split_name(name);
    let mut index = 1_u32;
    loop {
        let numbered = match ext {
            Some(ext) => format!("{stem}({index}).{ext}"),
            None => format!("{stem}({index})"),
        };
        let path = dir.join(numbered);
        if !path.exists() {
            return path;
        }
        index += 1;
    }
}

// Dotfiles have no extension.
fn split_name(name: &str) -> (&str, Option<&str>) {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (name, None),
    }
}

/// Copy a file or a whole directory tree into `dest_dir`.
///
/// Returns the path that was created.
pub fn copy_entry(source: &Path, dest_dir: &Path) -> io::Result<PathBuf> {
    let name = entry_name(source)?;
    let dest = unique_destination(dest_dir, &name);
    if dest.starts_with(source) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "cannot copy a directory into itself",
        ));
    }
    copy_recursive(source, &dest)?;
    Ok(dest)
}

fn copy_recursive(source: &Path, dest: &Path) -> io::Result<()> {
    if source.is_dir() {
        fs::create_dir(dest)?;
        for entry in fs::read_dir(source)? {
            let entry = entry?;
            copy_recursive(&entry.path(), &dest.join(entry.file_name()))?;
        }
        Ok(())
    } else {
        fs::copy(source, dest).map(|_| ())
    }
}

/// Move a file or directory into `dest_dir`. Moving onto itself is a no-op.
pub fn move_entry(source: &Path, dest_dir: &Path) -> io::Result<PathBuf> {
    if source.parent() == Some(dest_dir) {
        return Ok(source.to_path_buf());
    }
    let name = entry_name(source)?;
    let dest = unique_destination(dest_dir, &name);
    match fs::rename(source, &dest) {
        Ok(()) => Ok(dest),
        // Cross-device: fall back to copy + delete.
        Err(_) => {
            copy_recursive(source, &dest)?;
            remove_entry(source)?;
            Ok(dest)
        }
    }
}

pub fn remove_entry(path: &Path) -> io::Result<()> {
    if path.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

fn entry_name(path: &Path) -> io::Result<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))
}
