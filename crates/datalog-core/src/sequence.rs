//! Persisted sequence counter and data file naming.
//!
//! Each initialization reads the counter, stores `counter + 1` for the next
//! power cycle and names the new data file after the value it read, so
//! successive sessions write DATA000.TXT, DATA001.TXT, ... without ever
//! reusing a name.

use tracing::{info, warn};

use crate::config::FileNaming;
use crate::error::{DatalogError, Result};
use crate::sink::Storage;

/// Minimum number of digits in a data file's sequence number.
pub const SEQUENCE_DIGITS: usize = 3;

/// Somewhere the next sequence number survives a restart.
pub trait SequenceStore {
    /// The stored counter, or `None` if nothing has been stored yet.
    fn load(&mut self) -> Result<Option<u32>>;
    fn store(&mut self, next: u32) -> Result<()>;
}

/// Counter kept as a one-line decimal text file on the storage medium.
pub struct CounterFile<'s, S: Storage + ?Sized> {
    storage: &'s mut S,
    name: &'s str,
}

impl<'s, S: Storage + ?Sized> CounterFile<'s, S> {
    pub fn new(storage: &'s mut S, name: &'s str) -> Self {
        Self { storage, name }
    }
}

impl<S: Storage + ?Sized> SequenceStore for CounterFile<'_, S> {
    fn load(&mut self) -> Result<Option<u32>> {
        match self.storage.read(self.name)? {
            None => Ok(None),
            Some(text) => parse_counter(&text).map(Some),
        }
    }

    fn store(&mut self, next: u32) -> Result<()> {
        self.storage.remove(self.name)?;
        self.storage.write(self.name, &format!("{next}\n"))?;
        Ok(())
    }
}

pub fn parse_counter(text: &str) -> Result<u32> {
    let trimmed = text.trim();
    trimmed
        .parse()
        .map_err(|_| DatalogError::CorruptCounter(trimmed.to_string()))
}

/// Claim the next sequence number and persist its successor.
///
/// A missing or unreadable counter starts the sequence at 0. Failing to
/// persist the successor is logged; the claimed number is still returned.
pub fn advance(store: &mut dyn SequenceStore) -> u32 {
    let current = match store.load() {
        Ok(Some(n)) => n,
        Ok(None) => 0,
        Err(e) => {
            warn!("Sequence counter unreadable, starting at 0: {}", e);
            0
        }
    };

    let next = current.saturating_add(1);
    if next == current {
        warn!(sequence = current, "Sequence counter saturated");
    }
    if let Err(e) = store.store(next) {
        warn!("Failed to persist sequence counter: {}", e);
    }

    info!(sequence = current, "Claimed data file sequence number");
    current
}

/// `DATA` + zero-padded sequence + `.TXT`. The number widens past 999
/// instead of wrapping.
pub fn data_file_name(naming: &FileNaming, sequence: u32) -> String {
    format!(
        "{}{:0width$}.{}",
        naming.prefix,
        sequence,
        naming.extension,
        width = SEQUENCE_DIGITS
    )
}

/// Inverse of [`data_file_name`]: the sequence number if `name` matches.
pub fn parse_data_file_name(naming: &FileNaming, name: &str) -> Option<u32> {
    let digits = name
        .strip_prefix(naming.prefix.as_str())?
        .strip_suffix(naming.extension.as_str())?
        .strip_suffix('.')?;
    if digits.len() < SEQUENCE_DIGITS || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
