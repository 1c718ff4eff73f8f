//! Integration tests for datalog-core against a directory-backed card.

use std::cell::Cell;
use std::fs;

use datalog_core::datafile::{list_data_files, read_counter, DataFile};
use datalog_core::memory::MemoryConsole;
use datalog_core::{
    DirStorage, Format, HostPins, Logger, LoggerConfig, LoggerState, WriterConsole,
};
use tempfile::TempDir;

fn run_session(dir: &std::path::Path, cycles: i32) -> (Vec<String>, Option<String>) {
    let x = Cell::new(0);
    let y = Cell::new(0.0_f32);
    let mut logger = Logger::new(LoggerConfig::new(true, true, true));
    logger.add_variable_with("X", &x, Format::width(3)).unwrap();
    logger.add_variable_with("Y", &y, Format::new(1, 2)).unwrap();
    logger
        .initialize(MemoryConsole::default(), DirStorage::new(dir), &mut HostPins, 10)
        .unwrap();

    for i in 0..cycles {
        x.set(i * 21);
        y.set(i as f32 * 1.5);
        logger.update().unwrap();
    }

    let name = logger.filename().map(str::to_string);
    let (console, _) = logger.into_parts();
    (console.unwrap().lines, name)
}

#[test]
fn test_reference_scenario_on_disk() {
    let tmp = TempDir::new().unwrap();
    let x = Cell::new(42);
    let y = Cell::new(3.14159_f32);
    let mut logger = Logger::new(LoggerConfig::new(true, true, true).with_delimiter(","));
    logger.add_variable_with("X", &x, Format::width(3)).unwrap();
    logger.add_variable_with("Y", &y, Format::new(1, 2)).unwrap();

    let state = logger
        .initialize(
            WriterConsole::new(Vec::new()),
            DirStorage::new(tmp.path()),
            &mut HostPins,
            10,
        )
        .unwrap();
    assert_eq!(state, LoggerState::ConsoleAndStorage);
    logger.update().unwrap();

    let (console, _) = logger.into_parts();
    let out = String::from_utf8(console.unwrap().into_inner()).unwrap();
    assert!(out.ends_with("X:  42,Y: 3.14\n"), "console output: {out:?}");

    let data = fs::read_to_string(tmp.path().join("DATA000.TXT")).unwrap();
    assert_eq!(data, "X,Y\n 42,3.14\n");
    assert_eq!(fs::read_to_string(tmp.path().join("number.txt")).unwrap(), "1\n");
}

#[test]
fn test_restarts_never_reuse_a_file_name() {
    let tmp = TempDir::new().unwrap();
    let mut names = vec![];
    for _ in 0..3 {
        let (_, name) = run_session(tmp.path(), 2);
        names.push(name.unwrap());
    }
    assert_eq!(names, ["DATA000.TXT", "DATA001.TXT", "DATA002.TXT"]);

    let naming = LoggerConfig::default().naming;
    let files = list_data_files(tmp.path(), &naming).unwrap();
    assert_eq!(files.len(), 3);
    assert!(files.iter().all(|f| f.rows == 2));
    assert_eq!(read_counter(tmp.path(), &naming).unwrap(), Some(3));
}

#[test]
fn test_lost_counter_appends_instead_of_overwriting() {
    let tmp = TempDir::new().unwrap();
    run_session(tmp.path(), 1);
    fs::remove_file(tmp.path().join("number.txt")).unwrap();
    run_session(tmp.path(), 1);

    let data = fs::read_to_string(tmp.path().join("DATA000.TXT")).unwrap();
    assert_eq!(data, "X,Y\n  0,0.00\nX,Y\n  0,0.00\n");

    let file = DataFile::parse(&data, ",");
    assert_eq!(file.labels, ["X", "Y"]);
    assert_eq!(file.rows, [["0", "0.00"], ["0", "0.00"]]);
    let files = list_data_files(tmp.path(), &LoggerConfig::default().naming).unwrap();
    assert_eq!(files[0].rows, 2);
}

#[test]
fn test_counter_past_999_widens_name() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("number.txt"), "1000\n").unwrap();
    let (_, name) = run_session(tmp.path(), 1);
    assert_eq!(name.as_deref(), Some("DATA1000.TXT"));
    assert!(tmp.path().join("DATA1000.TXT").exists());
}

#[test]
fn test_missing_card_keeps_console_logging() {
    let tmp = TempDir::new().unwrap();
    let v = Cell::new(9);
    let mut logger = Logger::new(LoggerConfig::new(true, true, false));
    logger.add_variable("v", &v).unwrap();
    let state = logger
        .initialize(
            MemoryConsole::default(),
            DirStorage::new(tmp.path().join("no_card")),
            &mut HostPins,
            10,
        )
        .unwrap();
    assert_eq!(state, LoggerState::ConsoleOnly);
    logger.update().unwrap();

    assert!(logger.status().storage_unavailable);
    assert_eq!(
        logger.console().unwrap().lines,
        ["SD card initialization failed!", "9"]
    );
    assert!(!tmp.path().join("no_card").exists());
}

#[test]
fn test_written_file_parses_back() {
    let tmp = TempDir::new().unwrap();
    let (_, name) = run_session(tmp.path(), 4);
    let file = DataFile::load(&tmp.path().join(name.unwrap()), ",").unwrap();
    assert_eq!(file.labels, ["X", "Y"]);
    assert_eq!(file.rows.len(), 4);
    assert_eq!(file.rows[3], ["63", "4.50"]);
}
