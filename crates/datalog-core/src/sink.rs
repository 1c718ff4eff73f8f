//! Platform capabilities the logger writes through, plus host implementations.
//!
//! A board support layer provides a serial [`Console`], an SD-style
//! [`Storage`] and [`PinConfig`] for the card's select line. On a host the
//! same traits are backed by a writer, a directory, and a no-op pin driver.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

/// Line-oriented text output.
pub trait Console {
    /// Whether something is listening. Informational messages are only
    /// printed when this is true.
    fn is_ready(&self) -> bool;

    /// Write `line` followed by a line terminator.
    fn write_line(&mut self, line: &str) -> io::Result<()>;
}

/// Named flat files on a removable medium.
///
/// Every call opens, operates on and closes its file; implementations must
/// not keep handles open between calls.
pub trait Storage {
    /// One-time medium initialization using the given chip-select line.
    fn mount(&mut self, select_line: u8) -> io::Result<()>;

    /// Whole contents of `name`, or `None` if it does not exist.
    fn read(&mut self, name: &str) -> io::Result<Option<String>>;

    /// Delete `name`. Removing a missing file is not an error.
    fn remove(&mut self, name: &str) -> io::Result<()>;

    /// Open `name` for appending (creating it if needed), write, close.
    fn append(&mut self, name: &str, text: &str) -> io::Result<()>;

    /// Open `name` truncated (creating it if needed), write, close.
    fn write(&mut self, name: &str, text: &str) -> io::Result<()>;
}

/// Pin direction control for the storage select line.
pub trait PinConfig {
    fn configure_output(&mut self, line: u8);
}

impl<T: Console + ?Sized> Console for &mut T {
    fn is_ready(&self) -> bool {
        (**self).is_ready()
    }
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        (**self).write_line(line)
    }
}

impl<T: Storage + ?Sized> Storage for &mut T {
    fn mount(&mut self, select_line: u8) -> io::Result<()> {
        (**self).mount(select_line)
    }
    fn read(&mut self, name: &str) -> io::Result<Option<String>> {
        (**self).read(name)
    }
    fn remove(&mut self, name: &str) -> io::Result<()> {
        (**self).remove(name)
    }
    fn append(&mut self, name: &str, text: &str) -> io::Result<()> {
        (**self).append(name, text)
    }
    fn write(&mut self, name: &str, text: &str) -> io::Result<()> {
        (**self).write(name, text)
    }
}

impl<T: PinConfig + ?Sized> PinConfig for &mut T {
    fn configure_output(&mut self, line: u8) {
        (**self).configure_output(line)
    }
}

// ─── Host implementations ─────────────────────────────────────────────────────

/// Console over any `io::Write`, e.g. stdout.
pub struct WriterConsole<W> {
    writer: W,
    ready: bool,
}

impl<W: Write> WriterConsole<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            ready: true,
        }
    }

    /// Mark the console as having no listener (quiet mode).
    pub fn quiet(mut self) -> Self {
        self.ready = false;
        self
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Console for WriterConsole<W> {
    fn is_ready(&self) -> bool {
        self.ready
    }

    fn write_line(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.writer, "{line}")?;
        self.writer.flush()
    }
}

/// A directory standing in for the root of an SD card.
#[derive(Debug, Clone)]
pub struct DirStorage {
    root: PathBuf,
}

impl DirStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, name: &str) -> io::Result<PathBuf> {
        if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("not a flat file name: {name:?}"),
            ));
        }
        Ok(self.root.join(name))
    }
}

impl Storage for DirStorage {
    fn mount(&mut self, select_line: u8) -> io::Result<()> {
        debug!(root = %self.root.display(), select_line, "Mounting directory storage");
        if fs::metadata(&self.root)?.is_dir() {
            Ok(())
        } else {
            Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} is not a directory", self.root.display()),
            ))
        }
    }

    fn read(&mut self, name: &str) -> io::Result<Option<String>> {
        match fs::read_to_string(self.resolve(name)?) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn remove(&mut self, name: &str) -> io::Result<()> {
        match fs::remove_file(self.resolve(name)?) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }

    fn append(&mut self, name: &str, text: &str) -> io::Result<()> {
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.resolve(name)?)?;
        file.write_all(text.as_bytes())
    }

    fn write(&mut self, name: &str, text: &str) -> io::Result<()> {
        fs::write(self.resolve(name)?, text)
    }
}

/// Pin driver for hosts, where there is no select line to configure.
#[derive(Debug, Default, Clone, Copy)]
pub struct HostPins;

impl PinConfig for HostPins {
    fn configure_output(&mut self, line: u8) {
        debug!(line, "Configured pin as output");
    }
}
