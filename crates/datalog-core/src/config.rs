//! Logger configuration, loadable from YAML.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// How data files and the sequence counter are named on the storage medium.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileNaming {
    /// Data file prefix (e.g. "DATA" -> DATA000.TXT)
    pub prefix: String,
    /// Data file extension, without the dot
    pub extension: String,
    /// Name of the file holding the next sequence number
    pub counter_file: String,
}

impl Default for FileNaming {
    fn default() -> Self {
        Self {
            prefix: "DATA".to_string(),
            extension: "TXT".to_string(),
            counter_file: "number.txt".to_string(),
        }
    }
}

/// Configuration for a [`Logger`](crate::Logger). Fixed once the logger is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Write each cycle to the console sink
    pub log_to_console: bool,
    /// Write each cycle to a data file on the storage sink
    pub log_to_storage: bool,
    /// Console lines use "label: value" pairs instead of bare values
    pub console_labels: bool,
    /// Inserted between consecutive values (not after the last)
    pub delimiter: String,
    /// Maximum number of registered variables
    pub capacity: usize,
    pub naming: FileNaming,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            log_to_console: true,
            log_to_storage: false,
            console_labels: true,
            delimiter: ",".to_string(),
            capacity: 16,
            naming: FileNaming::default(),
        }
    }
}

impl LoggerConfig {
    pub fn new(log_to_console: bool, log_to_storage: bool, console_labels: bool) -> Self {
        Self {
            log_to_console,
            log_to_storage,
            console_labels,
            ..Default::default()
        }
    }

    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_console(mut self, enabled: bool) -> Self {
        self.log_to_console = enabled;
        self
    }

    pub fn with_storage(mut self, enabled: bool) -> Self {
        self.log_to_storage = enabled;
        self
    }

    pub fn with_console_labels(mut self, enabled: bool) -> Self {
        self.console_labels = enabled;
        self
    }

    pub fn with_naming(mut self, naming: FileNaming) -> Self {
        self.naming = naming;
        self
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}
