//! datalog CLI: record sample sessions onto a card directory and inspect the
//! data files they leave behind.

use std::cell::Cell;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use comfy_table::{presets::UTF8_FULL, Table};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use datalog_core::datafile::{list_data_files, read_counter, DataFile};
use datalog_core::{DirStorage, Format, HostPins, Logger, LoggerConfig, WriterConsole};

/// Chip-select line of the card on the reference board.
const SD_SELECT_LINE: u8 = 10;

#[derive(Parser)]
#[command(
    name = "datalog",
    about = "Scalar variable logger: serial console and sequential SD data files",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulated sampling session and log it to a card directory
    Record {
        /// Directory standing in for the SD card root
        #[arg(default_value = "./sd")]
        dir: PathBuf,
        /// Logger configuration (YAML)
        #[arg(long, short)]
        config: Option<PathBuf>,
        /// Number of update cycles
        #[arg(long, short = 'n', default_value_t = 10)]
        cycles: u32,
        /// Delay between cycles in milliseconds
        #[arg(long, default_value_t = 0)]
        interval_ms: u64,
        /// Print "label: value" pairs on the console (overrides the config file)
        #[arg(long, overrides_with = "no_labels")]
        labels: bool,
        /// Print bare values on the console instead of "label: value"
        #[arg(long, overrides_with = "labels")]
        no_labels: bool,
        /// Suppress informational console messages (file name, open errors)
        #[arg(long, short)]
        quiet: bool,
        /// Disable the console sink
        #[arg(long)]
        no_console: bool,
        /// Disable the storage sink
        #[arg(long)]
        no_storage: bool,
        /// Field delimiter (overrides the config file)
        #[arg(long, short)]
        delimiter: Option<String>,
        /// Create the card directory if it does not exist
        #[arg(long)]
        create: bool,
    },
    /// List data files on a card directory
    List {
        #[arg(default_value = "./sd")]
        dir: PathBuf,
        /// Logger configuration, for non-default file naming
        #[arg(long, short)]
        config: Option<PathBuf>,
    },
    /// Print a data file as a table, CSV or JSON
    Show {
        file: PathBuf,
        #[arg(long, short, default_value = "table", value_parser = ["table", "csv", "json"])]
        format: String,
        /// Field delimiter used when the file was written
        #[arg(long, short, default_value = ",")]
        delimiter: String,
    },
    /// Write a default logger configuration
    InitConfig {
        #[arg(default_value = "datalog.yaml")]
        path: PathBuf,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Record {
            dir,
            config,
            cycles,
            interval_ms,
            labels,
            no_labels,
            quiet,
            no_console,
            no_storage,
            delimiter,
            create,
        } => {
            let mut cfg = load_config(config.as_deref())?;
            if labels {
                cfg.console_labels = true;
            }
            if no_labels {
                cfg.console_labels = false;
            }
            if no_console {
                cfg.log_to_console = false;
            }
            if no_storage {
                cfg.log_to_storage = false;
            }
            if let Some(delimiter) = delimiter {
                cfg.delimiter = delimiter;
            }
            cmd_record(dir, cfg, cycles, interval_ms, create, quiet)?;
        }
        Commands::List { dir, config } => {
            cmd_list(&dir, &load_config(config.as_deref())?)?;
        }
        Commands::Show {
            file,
            format,
            delimiter,
        } => {
            cmd_show(&file, &format, &delimiter)?;
        }
        Commands::InitConfig { path, force } => {
            cmd_init_config(&path, force)?;
        }
    }

    Ok(())
}

/// Without a file, record to both sinks.
fn load_config(path: Option<&Path>) -> Result<LoggerConfig> {
    match path {
        Some(path) => LoggerConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(LoggerConfig::default().with_storage(true)),
    }
}

// ─── Command implementations ──────────────────────────────────────────────────

fn cmd_record(
    dir: PathBuf,
    config: LoggerConfig,
    cycles: u32,
    interval_ms: u64,
    create: bool,
    quiet: bool,
) -> Result<()> {
    if create && config.log_to_storage {
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create card directory {}", dir.display()))?;
    }

    let cycle = Cell::new(0_i32);
    let sine = Cell::new(0.0_f32);
    let cosine = Cell::new(0.0_f64);

    let mut logger = Logger::new(config);
    logger.add_variable_with("cycle", &cycle, Format::width(4))?;
    logger.add_variable_with("sine", &sine, Format::new(6, 3))?;
    logger.add_variable_with("cosine", &cosine, Format::new(7, 4))?;

    let console = WriterConsole::new(std::io::stdout());
    let console = if quiet { console.quiet() } else { console };
    let state = logger.initialize(
        console,
        DirStorage::new(&dir),
        &mut HostPins,
        SD_SELECT_LINE,
    )?;
    info!(?state, file = logger.filename().unwrap_or("-"), "Recording {cycles} cycles");

    for i in 0..cycles {
        let t = f64::from(i) * 0.1;
        cycle.set(i32::try_from(i).unwrap_or(i32::MAX));
        sine.set(t.sin() as f32);
        cosine.set(t.cos());
        logger.update()?;

        if interval_ms > 0 {
            thread::sleep(Duration::from_millis(interval_ms));
        }
    }

    let status = logger.status();
    if status.dropped_writes > 0 || status.data_file_failed || status.storage_unavailable {
        warn!(
            dropped_writes = status.dropped_writes,
            last_error = status.last_error.as_deref().unwrap_or("-"),
            "Session finished with storage faults"
        );
    }
    info!(cycles = status.cycles, "Session finished");
    Ok(())
}

fn cmd_list(dir: &Path, config: &LoggerConfig) -> Result<()> {
    let files = list_data_files(dir, &config.naming)?;

    if files.is_empty() {
        println!("No data files found in '{}'", dir.display());
    } else {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(["File", "Rows", "Size", "Modified"]);

        for file in &files {
            let modified = file
                .modified
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "-".to_string());
            table.add_row([
                file.name.clone(),
                file.rows.to_string(),
                format_size(file.size_bytes),
                modified,
            ]);
        }
        println!("{}", table);
    }

    match read_counter(dir, &config.naming) {
        Ok(Some(next)) => println!("Next sequence number: {}", next),
        Ok(None) => println!("No sequence counter ({})", config.naming.counter_file),
        Err(e) => println!("Unreadable sequence counter: {}", e),
    }
    Ok(())
}

fn cmd_show(file: &Path, format: &str, delimiter: &str) -> Result<()> {
    let data = DataFile::load(file, delimiter)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    match format {
        "table" => {
            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.set_header(&data.labels);
            for row in &data.rows {
                table.add_row(row);
            }
            println!("{}", table);
        }
        "csv" => {
            println!("{}", data.labels.join(","));
            for row in &data.rows {
                println!("{}", row.join(","));
            }
        }
        "json" => {
            println!("{}", serde_json::to_string_pretty(&data.to_json_rows())?);
        }
        other => bail!("Unknown format: {}", other),
    }
    Ok(())
}

fn cmd_init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    LoggerConfig::default()
        .with_storage(true)
        .save(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KiB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MiB", bytes as f64 / (1024.0 * 1024.0))
    }
}
