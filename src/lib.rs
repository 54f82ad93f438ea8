//! # Daily Logger
//!
//! An in-process asynchronous logger that keeps human-readable text logs, one
//! file per severity per calendar day, and can read them back as rows.
//!
//! * **Non-blocking producers**: a log call builds an entry and pushes it onto
//!   a queue; a dedicated flush thread does all file I/O
//! * **Three streams**: `Info`, `Error` and `Alarm` each get their own
//!   directory of `yyyy-MM-dd.log` files
//! * **Queryable**: records for a day or an inclusive date range come back as
//!   a [`RowTable`] sorted newest first
//!
//! ## Main Components
//!
//! * [`FileLogger`]: owns the queue and the flush thread, and answers queries
//! * [`LogQuery`]: read-only access to a log root without a running logger
//! * [`record`]: the ten-line text record format, writer and tolerant reader
//! * [`clock`]: the time source used for occurrence and recorded timestamps
//!
//! ## Quick Start
//!
//! ```
//! use daily_logger::{log_alarm, FileLogger, LoggerConfig, Severity};
//! use std::time::Duration;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let logger = FileLogger::new(LoggerConfig::new(dir.path())).unwrap();
//!
//! logger.info("service started");
//! logger.error_as("login rejected", "alice", 2);
//! log_alarm!(logger, "pressure at {} bar", 7.5);
//!
//! logger.flush(Duration::from_secs(5));
//! let today = chrono::Local::now().date_naive();
//! let alarms = logger.query_by_date(Severity::Alarm, today).unwrap();
//! assert_eq!(alarms.rows()[0].message, "pressure at 7.5 bar");
//! ```

pub mod backend;
pub mod clock;
pub mod config;
pub mod entry;
pub mod error;
pub mod flush;
pub mod layout;
pub mod logger;
pub mod query;
pub mod queue;
pub mod record;
pub mod row;
pub mod severity;

pub use backend::LogBackend;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::LoggerConfig;
pub use entry::{CallSite, LogEntry, DEFAULT_USER};
pub use error::{FormatError, LogError, QueryWarning};
pub use flush::FlushStats;
pub use layout::LogLayout;
pub use logger::FileLogger;
pub use query::LogQuery;
pub use row::{Row, RowTable, COLUMNS};
pub use severity::{ParseSeverityError, Severity};
