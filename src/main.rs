//! Command-line access to a daily log root.
//!
//! ```bash
//! # Rows from the Error stream for one day, newest first
//! daily_logger --root ./Log query error 2024-01-01
//!
//! # Inclusive range, bounds in either order, as JSON lines
//! daily_logger --root ./Log query info 2024-01-07 2024-01-01 --json
//!
//! # Append one entry and wait for it to reach disk
//! daily_logger --root ./Log write alarm "door 4 open" --user alice --permission 2
//! ```

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use daily_logger::{FileLogger, LogQuery, LoggerConfig, Row, Severity, DEFAULT_USER};
use tracing_appender::non_blocking::WorkerGuard;

/// Inspect and append to daily text logs
#[derive(Parser)]
#[command(name = "daily_logger")]
#[command(version)]
struct Cli {
    /// Increase diagnostic verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Log root holding the Info, Error and Alarm directories
    #[arg(short, long, global = true, default_value = "Log")]
    root: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the records of one day, or of an inclusive date range
    Query {
        /// info, error or alarm
        severity: Severity,
        /// Day to read (yyyy-MM-dd)
        date: NaiveDate,
        /// Other end of the range
        until: Option<NaiveDate>,
        /// One JSON object per row
        #[arg(long)]
        json: bool,
    },

    /// Append one entry
    Write {
        severity: Severity,
        message: String,
        #[arg(short, long, default_value = DEFAULT_USER)]
        user: String,
        #[arg(short, long, default_value_t = 0)]
        permission: i32,
    },
}

fn setup_logging(verbosity: u8) -> WorkerGuard {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };

    let (writer, guard) = tracing_appender::non_blocking(std::io::stderr());
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_writer(writer)
        .init();
    guard
}

fn print_row(row: &Row, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(row)?);
        return Ok(());
    }
    let line = row.line.map(|l| l.to_string()).unwrap_or_default();
    println!(
        "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
        row.level,
        row.occurred_at,
        row.recorded_at,
        row.user,
        row.permission,
        row.class_name,
        row.method,
        line,
        row.message
    );
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = setup_logging(cli.verbose);

    match cli.command {
        Commands::Query {
            severity,
            date,
            until,
            json,
        } => {
            let query = LogQuery::new(&cli.root);
            let table = match until {
                Some(until) => query.by_date_range(severity, date, until),
                None => query.by_date(severity, date),
            }
            .with_context(|| format!("querying {}", cli.root.display()))?;

            for row in &table {
                print_row(row, json)?;
            }
            for warning in table.warnings() {
                eprintln!("warning: {}", warning);
            }
        }
        Commands::Write {
            severity,
            message,
            user,
            permission,
        } => {
            let logger = FileLogger::new(LoggerConfig::new(&cli.root))
                .with_context(|| format!("opening {}", cli.root.display()))?;
            logger.write(severity, message, user, permission);
            if !logger.flush(Duration::from_secs(10)) {
                bail!("entry still queued after 10s: {:?}", logger.stats().last_error);
            }
        }
    }

    Ok(())
}
