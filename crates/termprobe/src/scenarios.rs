//! Built-in file-manager scenarios.
//!
//! Each scenario owns its own subtree of the sandbox, named after the
//! operation it exercises. Key bindings are the ones of a two-panel file
//! manager: Ctrl+C/X/V copy, cut and paste, Ctrl+D deletes (confirmed with
//! Enter), Ctrl+R renames, `:` opens a shell command prompt, Esc quits.

use crate::case::GenericCase;
use crate::keys::{
    Key, BACKSPACE, CTRL_A, CTRL_C, CTRL_D, CTRL_E, CTRL_P, CTRL_R, CTRL_V, CTRL_W, CTRL_X,
    DOWN, ENTER, LEFT, RIGHT,
};
use std::time::Duration;

/// Content written to every fixture file.
pub const FIXTURE_TEXT: &str = "termprobe fixture\n";

/// Copy in `dir1`, step over into `dir2` and paste there.
pub fn copy() -> GenericCase {
    GenericCase::builder("copy", "copy_ops")
        .with_start_dir("dir1")
        .with_dirs(["dir1", "dir2"])
        .with_file("dir1/file1.txt", FIXTURE_TEXT)
        .with_keys([CTRL_C, LEFT, DOWN, ENTER, CTRL_V])
        .expect_exists(["dir1/file1.txt", "dir2/file1.txt"])
        .build()
}

pub fn copy_dir() -> GenericCase {
    GenericCase::builder("copy_dir", "copy_dir")
        .with_dirs(["dir1/nested1", "dir1/nested2", "dir2"])
        .with_file("dir1/nested1/file1.txt", FIXTURE_TEXT)
        .with_keys([CTRL_C, DOWN, ENTER, CTRL_V])
        .expect_exists(["dir2/dir1", "dir2/dir1/nested1/file1.txt"])
        .build()
}

/// Copy, then paste with Ctrl+W.
pub fn copy_duplicate() -> GenericCase {
    GenericCase::builder("copy_duplicate", "copyw_ops")
        .with_file("file1.txt", FIXTURE_TEXT)
        .with_keys([CTRL_C, CTRL_W])
        .expect_exists(["file1.txt", "file1(1).txt"])
        .build()
}

pub fn cut() -> GenericCase {
    GenericCase::builder("cut", "cut_ops")
        .with_start_dir("dir1")
        .with_dirs(["dir1", "dir2"])
        .with_file("dir1/file1.txt", FIXTURE_TEXT)
        .with_keys([CTRL_X, LEFT, DOWN, ENTER, CTRL_V])
        .expect_exists(["dir2/file1.txt"])
        .expect_absent(["dir1/file1.txt"])
        .build()
}

pub fn delete() -> GenericCase {
    GenericCase::builder("delete", "delete_ops")
        .with_file("file_to_delete.txt", FIXTURE_TEXT)
        .with_keys([CTRL_D, ENTER])
        .expect_absent(["file_to_delete.txt"])
        .build()
}

pub fn delete_dir() -> GenericCase {
    GenericCase::builder("delete_dir", "delete_dir")
        .with_dirs(["dir1/nested1", "dir1/nested2"])
        .with_file("dir1/nested1/file1.txt", FIXTURE_TEXT)
        .with_keys([CTRL_D, ENTER])
        .expect_absent([
            "dir1",
            "dir1/nested1",
            "dir1/nested2",
            "dir1/nested1/file1.txt",
        ])
        .build()
}

pub fn rename() -> GenericCase {
    GenericCase::builder("rename", "rename_ops")
        .with_start_dir("dir1")
        .with_dirs(["dir1"])
        .with_file("dir1/file1", FIXTURE_TEXT)
        .with_keys([CTRL_R, BACKSPACE, Key::text("2"), ENTER])
        .expect_exists(["dir1/file2"])
        .expect_absent(["dir1/file1"])
        .build()
}

/// Shell commands typed into the subject's command prompt.
pub fn command() -> GenericCase {
    GenericCase::builder("command", "cmd_ops")
        .with_keys([
            Key::text(":"),
            Key::text("mkdir dir1"),
            ENTER,
            Key::text(":"),
            Key::text("touch file1"),
            ENTER,
        ])
        .expect_exists(["dir1", "file1"])
        .build()
}

pub fn compress_extract() -> GenericCase {
    GenericCase::builder("compress_extract", "ce_ops")
        .with_dirs(["dir1"])
        .with_file("dir1/file1", FIXTURE_TEXT)
        .with_file("dir1/file2", FIXTURE_TEXT)
        .with_keys([CTRL_A, DOWN, CTRL_E])
        .expect_exists([
            "dir1",
            "dir1.zip",
            "dir1(1)/dir1",
            "dir1(1)/dir1/file1",
            "dir1(1)/dir1/file2",
        ])
        .build()
}

/// Every operation on an empty panel must leave the subject running.
pub fn empty_panel() -> GenericCase {
    GenericCase::builder("empty_panel", "empty_panel_ops")
        .with_start_dir("dir1")
        .with_dirs(["dir1"])
        .with_keys([
            CTRL_C,
            CTRL_X,
            CTRL_D,
            CTRL_V,
            CTRL_R,
            CTRL_P,
            Key::text("e"),
            ENTER,
            RIGHT,
            CTRL_A,
            CTRL_E,
            Key::text("v"),
            Key::text("J"),
            Key::text("K"),
            Key::text("A"),
            Key::text("v"),
            Key::text("."),
        ])
        .press_escape(false)
        .with_close_delay(Duration::ZERO)
        .expect_running(true)
        .build()
}

/// `--chooser-file`: opening a file writes its path to the chooser file and
/// quits, so no Escape is sent.
pub fn chooser_file() -> GenericCase {
    GenericCase::builder("chooser_file", "chooser_file_ops")
        .with_start_dir("dir1")
        .with_dirs(["dir1", "dir2"])
        .with_file("dir1/file1.txt", FIXTURE_TEXT)
        .with_arg("--chooser-file")
        .with_sandbox_arg("dir2/chooser_file.txt")
        .with_keys([Key::text("e")])
        .press_escape(false)
        .with_close_delay(Duration::from_secs(3))
        .expect_exists(["dir2/chooser_file.txt"])
        .expect_content_path("dir2/chooser_file.txt", "dir1/file1.txt")
        .build()
}
