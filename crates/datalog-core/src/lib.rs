//! datalog-core: sample a fixed set of scalar variables every cycle and write
//! them as delimited text lines to a console and/or sequentially named data
//! files on removable storage.
//!
//! Everything is synchronous. The caller owns the sampled variables (as
//! `Cell`s), registers them once, calls `initialize()` once and `update()`
//! once per cycle.

pub mod config;
pub mod datafile;
pub mod error;
pub mod logger;
pub mod memory;
pub mod sequence;
pub mod sink;
pub mod variable;

pub use config::{FileNaming, LoggerConfig};
pub use error::{DatalogError, Result};
pub use logger::{Logger, LoggerState, LoggerStatus};
pub use sink::{Console, DirStorage, HostPins, PinConfig, Storage, WriterConsole};
pub use variable::{Format, Kind, Source, Variable, MAX_FIELD_CHARS};
