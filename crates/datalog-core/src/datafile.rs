//! Reading back what the logger wrote: data file parsing and directory listing.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;
use serde_json::{Map, Number, Value};
use tracing::warn;

use crate::config::FileNaming;
use crate::error::Result;
use crate::sequence::{parse_counter, parse_data_file_name};

/// A parsed data file: the header labels and one row of fields per cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataFile {
    pub labels: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl DataFile {
    /// Fields are trimmed of formatter padding. Blank lines are skipped, as
    /// are repeats of the header left by a session that reused the file name.
    pub fn parse(text: &str, delimiter: &str) -> Self {
        let split = |line: &str| -> Vec<String> {
            if delimiter.is_empty() {
                vec![line.trim().to_string()]
            } else {
                line.split(delimiter).map(|f| f.trim().to_string()).collect()
            }
        };

        let (header, data) = split_header(text);
        let labels = header.map(&split).unwrap_or_default();
        let rows = data.map(&split).collect();
        Self { labels, rows }
    }

    pub fn load(path: &Path, delimiter: &str) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(Self::parse(&text, delimiter))
    }

    /// One JSON object per row keyed by label. Numeric fields become numbers.
    pub fn to_json_rows(&self) -> Vec<Map<String, Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.labels
                    .iter()
                    .zip(row)
                    .map(|(label, field)| (label.clone(), field_to_json(field)))
                    .collect()
            })
            .collect()
    }
}

/// The first non-blank line, and the remaining non-blank lines that are not
/// a repeat of it.
fn split_header<'a>(text: &'a str) -> (Option<&'a str>, impl Iterator<Item = &'a str> + 'a) {
    let mut lines = text
        .lines()
        .map(|l| l.trim_end_matches('\r'))
        .filter(|l| !l.trim().is_empty());
    let header = lines.next();
    let data = lines.filter(move |l| Some(l.trim()) != header.map(str::trim));
    (header, data)
}

fn field_to_json(field: &str) -> Value {
    if let Ok(i) = field.parse::<i64>() {
        return Value::Number(i.into());
    }
    field
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(field.to_string()))
}

#[derive(Debug, Clone, Serialize)]
pub struct DataFileInfo {
    pub name: String,
    pub path: PathBuf,
    pub sequence: u32,
    pub size_bytes: u64,
    /// Data lines, excluding the header
    pub rows: usize,
    pub modified: Option<DateTime<Local>>,
}

/// Data files in `dir` matching the naming pattern, in sequence order.
pub fn list_data_files(dir: &Path, naming: &FileNaming) -> Result<Vec<DataFileInfo>> {
    if !dir.exists() {
        return Ok(vec![]);
    }
    let mut files = vec![];
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        let Some(sequence) = parse_data_file_name(naming, &name) else {
            continue;
        };
        let bytes = match fs::read(entry.path()) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(file = %name, "Skipping unreadable data file: {}", e);
                continue;
            }
        };
        let text = String::from_utf8_lossy(&bytes);
        let modified = entry
            .metadata()
            .ok()
            .and_then(|m| m.modified().ok())
            .map(DateTime::<Local>::from);
        files.push(DataFileInfo {
            name,
            path: entry.path(),
            sequence,
            size_bytes: bytes.len() as u64,
            rows: split_header(&text).1.count(),
            modified,
        });
    }
    files.sort_by_key(|f| f.sequence);
    Ok(files)
}

/// The persisted next sequence number, if the counter file exists.
pub fn read_counter(dir: &Path, naming: &FileNaming) -> Result<Option<u32>> {
    let path = dir.join(&naming.counter_file);
    if !path.exists() {
        return Ok(None);
    }
    let text = fs::read_to_string(path)?;
    parse_counter(&text).map(Some)
}
