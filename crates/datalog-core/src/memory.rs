//! In-memory sinks for tests and dry runs.

use std::collections::BTreeMap;
use std::io;

use crate::error::Result;
use crate::sequence::SequenceStore;
use crate::sink::{Console, PinConfig, Storage};

/// Console that records every line.
#[derive(Debug, Clone)]
pub struct MemoryConsole {
    pub lines: Vec<String>,
    pub ready: bool,
}

impl Default for MemoryConsole {
    fn default() -> Self {
        Self {
            lines: Vec::new(),
            ready: true,
        }
    }
}

impl MemoryConsole {
    /// A console with nobody listening.
    pub fn disconnected() -> Self {
        Self {
            ready: false,
            ..Default::default()
        }
    }
}

impl Console for MemoryConsole {
    fn is_ready(&self) -> bool {
        self.ready
    }

    fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.lines.push(line.to_string());
        Ok(())
    }
}

/// Flat file map with switchable failure modes.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    files: BTreeMap<String, String>,
    /// `mount` fails (no card inserted)
    pub unmountable: bool,
    /// `append`/`write`/`remove` fail (card pulled or write-protected)
    pub read_only: bool,
    /// Select line passed to the last successful `mount`
    pub mounted_on: Option<u8>,
    /// Number of storage operations performed
    pub ops: usize,
}

impl MemoryStorage {
    pub fn unmountable() -> Self {
        Self {
            unmountable: true,
            ..Default::default()
        }
    }

    pub fn with_file(mut self, name: &str, text: &str) -> Self {
        self.files.insert(name.to_string(), text.to_string());
        self
    }

    pub fn file(&self, name: &str) -> Option<&str> {
        self.files.get(name).map(String::as_str)
    }

    pub fn file_names(&self) -> Vec<&str> {
        self.files.keys().map(String::as_str).collect()
    }

    fn check_writable(&self) -> io::Result<()> {
        if self.read_only {
            Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "storage is read-only",
            ))
        } else {
            Ok(())
        }
    }
}

impl Storage for MemoryStorage {
    fn mount(&mut self, select_line: u8) -> io::Result<()> {
        self.ops += 1;
        if self.unmountable {
            return Err(io::Error::new(io::ErrorKind::NotFound, "no card"));
        }
        self.mounted_on = Some(select_line);
        Ok(())
    }

    fn read(&mut self, name: &str) -> io::Result<Option<String>> {
        self.ops += 1;
        Ok(self.files.get(name).cloned())
    }

    fn remove(&mut self, name: &str) -> io::Result<()> {
        self.ops += 1;
        self.check_writable()?;
        self.files.remove(name);
        Ok(())
    }

    fn append(&mut self, name: &str, text: &str) -> io::Result<()> {
        self.ops += 1;
        self.check_writable()?;
        self.files.entry(name.to_string()).or_default().push_str(text);
        Ok(())
    }

    fn write(&mut self, name: &str, text: &str) -> io::Result<()> {
        self.ops += 1;
        self.check_writable()?;
        self.files.insert(name.to_string(), text.to_string());
        Ok(())
    }
}

/// Records every pin configured as output.
#[derive(Debug, Clone, Default)]
pub struct MemoryPins {
    pub outputs: Vec<u8>,
}

impl PinConfig for MemoryPins {
    fn configure_output(&mut self, line: u8) {
        self.outputs.push(line);
    }
}

/// Sequence counter held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySequence {
    pub value: Option<u32>,
}

impl MemorySequence {
    pub fn starting_at(value: u32) -> Self {
        Self { value: Some(value) }
    }
}

impl SequenceStore for MemorySequence {
    fn load(&mut self) -> Result<Option<u32>> {
        Ok(self.value)
    }

    fn store(&mut self, next: u32) -> Result<()> {
        self.value = Some(next);
        Ok(())
    }
}
