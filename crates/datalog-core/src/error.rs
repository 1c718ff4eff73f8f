//! Error types for datalog-core.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatalogError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Logger is full: capacity of {capacity} variables reached")]
    CapacityExceeded { capacity: usize },

    #[error("Field width {width} for '{label}' exceeds the {max} character field limit")]
    WidthTooLarge { label: String, width: i32, max: usize },

    #[error("Precision {precision} for '{label}' cannot fit in the {max} character field limit")]
    PrecisionTooLarge { label: String, precision: u8, max: usize },

    #[error("Value of '{label}' needs {len} characters, field limit is {max}")]
    FieldOverflow { label: String, len: usize, max: usize },

    #[error("Logger used before initialize()")]
    NotInitialized,

    #[error("Logger already initialized")]
    AlreadyInitialized,

    #[error("Sequence counter is not a number: {0:?}")]
    CorruptCounter(String),
}

pub type Result<T> = std::result::Result<T, DatalogError>;
