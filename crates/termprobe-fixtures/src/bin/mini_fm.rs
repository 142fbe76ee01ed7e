//! Fixture: a single-panel file manager for end-to-end scenario tests.
//!
//! Bindings: Ctrl+C / Ctrl+X copy or cut the selected entry, Ctrl+V and
//! Ctrl+W paste into the current directory, Ctrl+D deletes after Enter
//! confirms, Ctrl+R renames, `:` runs a shell command, `e` opens the selected
//! file (writes its path to the chooser file and quits when one was given),
//! arrows move and Enter enters a directory. Esc quits.
//!
//! Usage: `termprobe-mini-fm [--chooser-file <path>] <dir>`

use std::fs;
use std::io::{self, Stdout, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{self, disable_raw_mode, enable_raw_mode, ClearType};
use crossterm::{cursor, queue, style};

use termprobe_fixtures::{copy_entry, move_entry, remove_entry};

#[derive(Debug)]
struct Clip {
    path: PathBuf,
    cut: bool,
}

#[derive(Debug)]
enum Mode {
    Browse,
    ConfirmDelete(PathBuf),
    Rename { from: PathBuf, buffer: String },
    Command(String),
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

struct App {
    cwd: PathBuf,
    cursor: usize,
    clip: Option<Clip>,
    mode: Mode,
    chooser_file: Option<PathBuf>,
    status: String,
}

impl App {
    fn new(cwd: PathBuf, chooser_file: Option<PathBuf>) -> Self {
        Self {
            cwd,
            cursor: 0,
            clip: None,
            mode: Mode::Browse,
            chooser_file,
            status: String::new(),
        }
    }

    fn entries(&self) -> Vec<PathBuf> {
        let mut entries: Vec<PathBuf> = fs::read_dir(&self.cwd)
            .map(|dir| dir.filter_map(Result::ok).map(|e| e.path()).collect())
            .unwrap_or_default();
        entries.sort();
        entries
    }

    fn selected(&self) -> Option<PathBuf> {
        self.entries().get(self.cursor).cloned()
    }

    fn enter_dir(&mut self, dir: PathBuf) {
        self.cwd = dir;
        self.cursor = 0;
    }

    fn handle(&mut self, key: KeyEvent) -> Flow {
        let mode = std::mem::replace(&mut self.mode, Mode::Browse);
        match mode {
            Mode::Browse => return self.browse(key),
            Mode::ConfirmDelete(path) => {
                if key.code == KeyCode::Enter {
                    self.report(remove_entry(&path).map(|()| format!("deleted {}", path.display())));
                    let last = self.entries().len().saturating_sub(1);
                    self.cursor = self.cursor.min(last);
                } else {
                    self.status = "delete cancelled".to_string();
                }
            }
            Mode::Rename { from, mut buffer } => {
                if let Some(buffer) = edit_line(&mut buffer, key) {
                    self.rename(&from, buffer);
                } else if key.code != KeyCode::Esc {
                    self.mode = Mode::Rename { from, buffer };
                }
            }
            Mode::Command(mut buffer) => {
                if let Some(command) = edit_line(&mut buffer, key) {
                    self.run_command(command);
                } else if key.code != KeyCode::Esc {
                    self.mode = Mode::Command(buffer);
                }
            }
        }
        Flow::Continue
    }

    fn browse(&mut self, key: KeyEvent) -> Flow {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            if let KeyCode::Char(letter) = key.code {
                self.chord(letter);
            }
            return Flow::Continue;
        }
        match key.code {
            KeyCode::Esc => return Flow::Quit,
            KeyCode::Up => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Down => {
                if self.cursor + 1 < self.entries().len() {
                    self.cursor += 1;
                }
            }
            KeyCode::Left => {
                if let Some(parent) = self.cwd.parent().map(Path::to_path_buf) {
                    self.enter_dir(parent);
                }
            }
            KeyCode::Right | KeyCode::Enter => {
                if let Some(dir) = self.selected().filter(|path| path.is_dir()) {
                    self.enter_dir(dir);
                }
            }
            KeyCode::Char(':') => self.mode = Mode::Command(String::new()),
            KeyCode::Char('e') => return self.open_selected(),
            _ => {}
        }
        Flow::Continue
    }

    fn chord(&mut self, letter: char) {
        match letter {
            'c' | 'x' => {
                if let Some(path) = self.selected() {
                    self.status = format!("clipboard: {}", path.display());
                    self.clip = Some(Clip {
                        path,
                        cut: letter == 'x',
                    });
                }
            }
            'v' | 'w' => self.paste(),
            'd' => {
                if let Some(path) = self.selected() {
                    self.status = format!("delete {}? (Enter to confirm)", path.display());
                    self.mode = Mode::ConfirmDelete(path);
                }
            }
            'r' => {
                if let Some(from) = self.selected() {
                    let buffer = from
                        .file_name()
                        .map(|name| name.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    self.mode = Mode::Rename { from, buffer };
                }
            }
            _ => {}
        }
    }

    fn paste(&mut self) {
        let Some(clip) = self.clip.take() else {
            return;
        };
        let result = if clip.cut {
            move_entry(&clip.path, &self.cwd)
        } else {
            let copied = copy_entry(&clip.path, &self.cwd);
            self.clip = Some(clip);
            copied
        };
        self.report(result.map(|dest| format!("pasted {}", dest.display())));
    }

    fn rename(&mut self, from: &Path, name: String) {
        if name.is_empty() || name.contains('/') {
            self.status = "invalid name".to_string();
            return;
        }
        let Some(parent) = from.parent() else {
            return;
        };
        let target = parent.join(&name);
        if target.exists() {
            self.status = format!("{name} already exists");
            return;
        }
        self.report(fs::rename(from, &target).map(|()| format!("renamed to {name}")));
    }

    fn run_command(&mut self, command: String) {
        let status = Command::new("sh")
            .arg("-c")
            .arg(&command)
            .current_dir(&self.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
        self.report(status.map(|status| format!("{command}: {status}")));
    }

    fn open_selected(&mut self) -> Flow {
        let Some(file) = self.selected().filter(|path| path.is_file()) else {
            return Flow::Continue;
        };
        match self.chooser_file.clone() {
            Some(chooser) => {
                let written = fs::write(&chooser, file.display().to_string());
                self.report(written.map(|()| String::new()));
                Flow::Quit
            }
            None => {
                self.status = format!("no opener for {}", file.display());
                Flow::Continue
            }
        }
    }

    fn report(&mut self, result: io::Result<String>) {
        self.status = match result {
            Ok(message) => message,
            Err(err) => format!("error: {err}"),
        };
    }

    fn draw(&self, out: &mut Stdout) -> io::Result<()> {
        queue!(
            out,
            terminal::Clear(ClearType::All),
            cursor::MoveTo(0, 0),
            style::Print(self.cwd.display()),
        )?;
        let mut row: u16 = 1;
        for (index, entry) in self.entries().iter().enumerate() {
            let marker = if index == self.cursor { '>' } else { ' ' };
            let kind = if entry.is_dir() { "/" } else { "" };
            let name = entry
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            queue!(
                out,
                cursor::MoveTo(0, row),
                style::Print(format!("{marker} {name}{kind}"))
            )?;
            row = row.saturating_add(1);
        }
        let prompt = match &self.mode {
            Mode::Browse | Mode::ConfirmDelete(_) => self.status.clone(),
            Mode::Rename { buffer, .. } => format!("rename: {buffer}"),
            Mode::Command(buffer) => format!(":{buffer}"),
        };
        queue!(
            out,
            cursor::MoveTo(0, row.saturating_add(1)),
            style::Print(prompt)
        )?;
        out.flush()
    }
}

/// Apply a key to a one-line editor. Returns the finished line on Enter.
fn edit_line(buffer: &mut String, key: KeyEvent) -> Option<String> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Enter => return Some(std::mem::take(buffer)),
        // Backspace arrives as 0x7f or as 0x08 (Ctrl+H).
        KeyCode::Backspace => {
            buffer.pop();
        }
        KeyCode::Char('h') if ctrl => {
            buffer.pop();
        }
        KeyCode::Char(c) if !ctrl => buffer.push(c),
        _ => {}
    }
    None
}

fn parse_args() -> io::Result<(PathBuf, Option<PathBuf>)> {
    let mut args = std::env::args_os().skip(1);
    let mut chooser_file = None;
    let mut dir = None;
    while let Some(arg) = args.next() {
        if arg == "--chooser-file" {
            chooser_file = args.next().map(PathBuf::from);
        } else {
            dir = Some(PathBuf::from(arg));
        }
    }
    let dir = dir.ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "usage: termprobe-mini-fm [--chooser-file <path>] <dir>",
        )
    })?;
    Ok((dir, chooser_file))
}

fn run(app: &mut App) -> io::Result<()> {
    let mut out = io::stdout();
    loop {
        app.draw(&mut out)?;
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if app.handle(key) == Flow::Quit {
                return Ok(());
            }
        }
    }
}

fn main() -> io::Result<()> {
    let (dir, chooser_file) = parse_args()?;
    let mut app = App::new(dir, chooser_file);
    enable_raw_mode()?;
    let result = run(&mut app);
    disable_raw_mode()?;
    result
}
