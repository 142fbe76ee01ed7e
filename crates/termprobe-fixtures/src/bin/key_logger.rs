//! Fixture: logs every received byte to `<dir>/keys.log`.
//! Exits when a read returns a lone Escape byte.

use std::fs::OpenOptions;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use crossterm::terminal::{disable_raw_mode, enable_raw_mode};

const ESC: u8 = 0x1b;

fn main() -> io::Result<()> {
    let Some(dir) = std::env::args_os().nth(1).map(PathBuf::from) else {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "usage: termprobe-key-logger <dir>",
        ));
    };
    let mut log = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("keys.log"))?;

    enable_raw_mode()?;
    let result = pump(&mut log);
    disable_raw_mode()?;
    result
}

fn pump(log: &mut impl Write) -> io::Result<()> {
    let mut stdin = io::stdin();
    let mut buffer = [0u8; 64];
    loop {
        let count = stdin.read(&mut buffer)?;
        let Some(bytes) = buffer.get(..count) else {
            break;
        };
        if bytes.is_empty() || bytes == [ESC] {
            break;
        }
        log.write_all(bytes)?;
        log.flush()?;
    }
    Ok(())
}
