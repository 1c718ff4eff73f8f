//! The logger: registration, per-cycle formatting and dual-sink output.
//!
//! `Logger::new()` only stores configuration. Variables are registered once,
//! `initialize()` attaches the console and storage (mounting the medium and
//! naming the session's data file), then `update()` is called every sampling
//! cycle. Storage files are opened and closed within each call.

use tracing::{debug, info, warn};

use crate::config::LoggerConfig;
use crate::error::{DatalogError, Result};
use crate::sequence::{self, CounterFile};
use crate::sink::{Console, PinConfig, Storage};
use crate::variable::{Format, Source, Variable};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggerState {
    Uninitialized,
    /// Console attached; storage disabled or failed to mount.
    ConsoleOnly,
    ConsoleAndStorage,
}

/// Fault counters observable by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoggerStatus {
    /// Storage was requested but the medium did not mount
    pub storage_unavailable: bool,
    /// The session's data file could not be created
    pub data_file_failed: bool,
    /// Cycles whose storage append failed
    pub dropped_writes: u64,
    /// Console lines that failed to write
    pub console_errors: u64,
    /// Completed `update()` cycles that produced output
    pub cycles: u64,
    pub last_error: Option<String>,
}

/// Output forms built in one pass over the variables.
struct Lines {
    plain: Option<String>,
    labelled: Option<String>,
}

pub struct Logger<'a, C, S> {
    config: LoggerConfig,
    variables: Vec<Variable<'a>>,
    console: Option<C>,
    storage: Option<S>,
    state: LoggerState,
    filename: Option<String>,
    status: LoggerStatus,
}

impl<'a, C: Console, S: Storage> Logger<'a, C, S> {
    pub fn new(config: LoggerConfig) -> Self {
        let capacity = config.capacity;
        Self {
            config,
            variables: Vec::with_capacity(capacity),
            console: None,
            storage: None,
            state: LoggerState::Uninitialized,
            filename: None,
            status: LoggerStatus::default(),
        }
    }

    /// Register a variable with the default format (width 1, 2 decimals).
    pub fn add_variable(
        &mut self,
        label: impl Into<String>,
        source: impl Into<Source<'a>>,
    ) -> Result<()> {
        self.add_variable_with(label, source, Format::default())
    }

    pub fn add_variable_with(
        &mut self,
        label: impl Into<String>,
        source: impl Into<Source<'a>>,
        format: Format,
    ) -> Result<()> {
        if self.state != LoggerState::Uninitialized {
            return Err(DatalogError::AlreadyInitialized);
        }
        if self.variables.len() >= self.config.capacity {
            return Err(DatalogError::CapacityExceeded {
                capacity: self.config.capacity,
            });
        }
        let var = Variable::new(label, source.into(), format)?;
        debug!(
            label = %var.label(),
            kind = %var.kind(),
            min_digits = var.format().min_digits,
            precision = var.format().float_precision,
            "Registered variable"
        );
        self.variables.push(var);
        Ok(())
    }

    /// Attach the sinks. With storage enabled this also configures the
    /// select line, mounts the medium and creates the session's data file.
    ///
    /// A mount failure is reported on the console and leaves the logger in
    /// [`LoggerState::ConsoleOnly`] for the rest of the session.
    pub fn initialize<P: PinConfig>(
        &mut self,
        console: C,
        storage: S,
        pins: &mut P,
        select_line: u8,
    ) -> Result<LoggerState> {
        if self.state != LoggerState::Uninitialized {
            return Err(DatalogError::AlreadyInitialized);
        }
        self.console = Some(console);
        self.storage = Some(storage);
        self.state = LoggerState::ConsoleOnly;

        if !self.config.log_to_storage {
            info!(variables = self.variables.len(), "Logger initialized (console only)");
            return Ok(self.state);
        }

        pins.configure_output(select_line);
        let mounted = match self.storage.as_mut() {
            Some(storage) => storage.mount(select_line),
            None => return Err(DatalogError::NotInitialized),
        };
        if let Err(e) = mounted {
            warn!(select_line, "Storage mount failed: {}", e);
            self.status.storage_unavailable = true;
            self.status.last_error = Some(e.to_string());
            self.console_line("SD card initialization failed!", false);
            return Ok(self.state);
        }

        self.make_file();
        self.state = LoggerState::ConsoleAndStorage;
        info!(
            variables = self.variables.len(),
            file = self.filename.as_deref().unwrap_or(""),
            "Logger initialized"
        );
        Ok(self.state)
    }

    /// Sample every registered variable once and write the line(s).
    ///
    /// Does nothing when no sink is enabled or no variable is registered.
    /// Storage failures are counted in [`status`](Self::status), never
    /// returned.
    pub fn update(&mut self) -> Result<()> {
        if (!self.config.log_to_console && !self.config.log_to_storage)
            || self.variables.is_empty()
        {
            return Ok(());
        }
        if self.state == LoggerState::Uninitialized {
            return Err(DatalogError::NotInitialized);
        }

        let to_console = self.config.log_to_console;
        let to_storage = self.state == LoggerState::ConsoleAndStorage;
        if !to_console && !to_storage {
            return Ok(());
        }

        let labels = self.config.console_labels;
        let lines = self.format_lines(to_storage || (to_console && !labels), to_console && labels)?;

        if to_console {
            let line = if labels { &lines.labelled } else { &lines.plain };
            if let Some(line) = line {
                self.console_line(line, false);
            }
        }

        if to_storage {
            if let Some(line) = &lines.plain {
                self.append_to_data_file(line);
            }
        }

        self.status.cycles += 1;
        Ok(())
    }

    /// Labels joined by the delimiter; the first line of every data file.
    pub fn header_line(&self) -> String {
        self.variables
            .iter()
            .map(Variable::label)
            .collect::<Vec<_>>()
            .join(&self.config.delimiter)
    }

    pub fn variables(&self) -> &[Variable<'a>] {
        &self.variables
    }

    pub fn config(&self) -> &LoggerConfig {
        &self.config
    }

    pub fn state(&self) -> LoggerState {
        self.state
    }

    pub fn status(&self) -> &LoggerStatus {
        &self.status
    }

    /// Name of this session's data file, once storage is initialized.
    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    pub fn console(&self) -> Option<&C> {
        self.console.as_ref()
    }

    pub fn storage(&self) -> Option<&S> {
        self.storage.as_ref()
    }

    /// Release the sinks.
    pub fn into_parts(self) -> (Option<C>, Option<S>) {
        (self.console, self.storage)
    }

    // ─── internals ────────────────────────────────────────────────────────

    fn format_lines(&self, want_plain: bool, want_labelled: bool) -> Result<Lines> {
        let mut plain = want_plain.then(String::new);
        let mut labelled = want_labelled.then(String::new);
        let last = self.variables.len() - 1;

        for (i, var) in self.variables.iter().enumerate() {
            let mut word = var.serialize()?;
            if i != last {
                word.push_str(&self.config.delimiter);
            }
            if let Some(line) = labelled.as_mut() {
                line.push_str(var.label());
                line.push_str(": ");
                line.push_str(&word);
            }
            if let Some(line) = plain.as_mut() {
                line.push_str(&word);
            }
        }
        Ok(Lines { plain, labelled })
    }

    /// Informational lines are skipped unless the console reports ready.
    fn console_line(&mut self, line: &str, informational: bool) {
        let Some(console) = self.console.as_mut() else {
            return;
        };
        if informational && !console.is_ready() {
            return;
        }
        if let Err(e) = console.write_line(line) {
            self.status.console_errors += 1;
            debug!("Console write failed: {}", e);
        }
    }

    fn append_to_data_file(&mut self, line: &str) {
        let (Some(storage), Some(name)) = (self.storage.as_mut(), self.filename.as_deref()) else {
            return;
        };
        if let Err(e) = storage.append(name, &format!("{line}\n")) {
            warn!(file = %name, "Failed to append to data file: {}", e);
            self.status.dropped_writes += 1;
            self.status.last_error = Some(e.to_string());
        }
    }

    /// Claim a sequence number, name the data file and write its header.
    fn make_file(&mut self) {
        let header = self.header_line();
        let Some(storage) = self.storage.as_mut() else {
            return;
        };

        let seq = {
            let mut counter = CounterFile::new(&mut *storage, &self.config.naming.counter_file);
            sequence::advance(&mut counter)
        };
        let name = sequence::data_file_name(&self.config.naming, seq);

        let created = storage.append(&name, &format!("{header}\n"));
        self.filename = Some(name.clone());
        self.console_line(&format!("DATA FILE NAME: {name}"), true);

        match created {
            Ok(()) => {
                self.console_line(&format!("Writing to {name}..."), true);
                info!(file = %name, sequence = seq, "Created data file");
            }
            Err(e) => {
                self.console_line(&format!("error opening {name}"), true);
                warn!(file = %name, "Failed to create data file: {}", e);
                self.status.data_file_failed = true;
                self.status.last_error = Some(e.to_string());
            }
        }
    }
}
