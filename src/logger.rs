use std::panic::Location;
use std::path::Path;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use chrono::NaiveDate;

use crate::clock::{Clock, SystemClock};
use crate::config::LoggerConfig;
use crate::entry::{CallSite, LogEntry, DEFAULT_USER};
use crate::error::LogError;
use crate::flush::{FlushLoop, FlushStats, Shared};
use crate::layout::LogLayout;
use crate::query;
use crate::row::RowTable;
use crate::severity::Severity;

/// Root of the `log` targets used by this crate's own events.
const OWN_TARGET: &str = "daily_logger";

fn is_own_target(target: &str) -> bool {
    match target.strip_prefix(OWN_TARGET) {
        Some(rest) => rest.is_empty() || rest.starts_with("::"),
        None => false,
    }
}

/// How long [`log::Log::flush`] waits for the flush thread.
const LOG_FACADE_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

/// Asynchronous logger writing one file per severity per day.
///
/// Logging calls only build an entry and push it onto an in-memory queue; a
/// dedicated thread owned by the logger drains the queue and appends records
/// to `<root>/<Severity>/<yyyy-MM-dd>.log`. Queries read the same files back.
///
/// Dropping the logger writes whatever is still queued and stops the thread.
///
/// # Examples
///
/// ```
/// # use daily_logger::{FileLogger, LoggerConfig, Severity};
/// # use std::time::Duration;
/// let dir = tempfile::tempdir().unwrap();
/// let logger = FileLogger::new(LoggerConfig::new(dir.path())).unwrap();
///
/// logger.write(Severity::Info, "boot", "alice", 1);
/// assert!(logger.flush(Duration::from_secs(5)));
///
/// let today = chrono::Local::now().date_naive();
/// let rows = logger.query_by_date(Severity::Info, today).unwrap();
/// assert_eq!(rows.len(), 1);
/// assert_eq!(rows.rows()[0].user, "alice");
/// ```
pub struct FileLogger {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl FileLogger {
    /// Creates the log directories and starts the flush thread.
    pub fn new(config: LoggerConfig) -> Result<Self, LogError> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Like [`new`](Self::new) with an explicit time source.
    pub fn with_clock(config: LoggerConfig, clock: Arc<dyn Clock>) -> Result<Self, LogError> {
        let layout = LogLayout::new(&config.root);
        layout.ensure_dirs()?;

        let shared = Arc::new(Shared::new(layout, clock));
        let flush_loop = FlushLoop::new(Arc::clone(&shared), &config);
        let worker = std::thread::Builder::new()
            .name(config.thread_name.clone())
            .spawn(move || flush_loop.run())
            .map_err(LogError::Spawn)?;

        tracing::debug!(root = %config.root.display(), "file logger started");
        Ok(Self {
            shared,
            worker: Some(worker),
        })
    }

    pub fn root(&self) -> &Path {
        self.shared.layout.root()
    }

    /// Queues a message. Never waits for disk.
    ///
    /// The caller's source location is recorded as the call site.
    #[track_caller]
    pub fn write(&self, severity: Severity, message: impl Into<String>, user: impl Into<String>, permission: i32) {
        let entry = self
            .entry(severity, message)
            .with_user(user, permission)
            .with_call_site(CallSite::from_location(Location::caller()));
        self.shared.enqueue(entry);
    }

    /// Queues a fully built entry as is, including its occurrence time.
    pub fn write_entry(&self, entry: LogEntry) {
        self.shared.enqueue(entry);
    }

    /// Starts an entry stamped with this logger's current time.
    pub fn entry(&self, severity: Severity, message: impl Into<String>) -> LogEntry {
        LogEntry::new(severity, message, self.shared.clock.now())
    }

    #[track_caller]
    pub fn info(&self, message: impl Into<String>) {
        self.write(Severity::Info, message, DEFAULT_USER, 0);
    }

    #[track_caller]
    pub fn error(&self, message: impl Into<String>) {
        self.write(Severity::Error, message, DEFAULT_USER, 0);
    }

    #[track_caller]
    pub fn alarm(&self, message: impl Into<String>) {
        self.write(Severity::Alarm, message, DEFAULT_USER, 0);
    }

    #[track_caller]
    pub fn info_as(&self, message: impl Into<String>, user: impl Into<String>, permission: i32) {
        self.write(Severity::Info, message, user, permission);
    }

    #[track_caller]
    pub fn error_as(&self, message: impl Into<String>, user: impl Into<String>, permission: i32) {
        self.write(Severity::Error, message, user, permission);
    }

    #[track_caller]
    pub fn alarm_as(&self, message: impl Into<String>, user: impl Into<String>, permission: i32) {
        self.write(Severity::Alarm, message, user, permission);
    }

    /// Rows from the file dated `date`, newest first.
    ///
    /// Holds the shared side of the file lock, so a flush cycle of this logger
    /// is never observed half-written.
    pub fn query_by_date(&self, severity: Severity, date: NaiveDate) -> Result<RowTable, LogError> {
        let _guard = self.shared.file_lock.read();
        query::query_by_date(&self.shared.layout, severity, date)
    }

    /// Rows from every file dated within `[first, second]`, newest first.
    /// The bounds may be given in either order.
    pub fn query_by_date_range(&self, severity: Severity, first: NaiveDate, second: NaiveDate) -> Result<RowTable, LogError> {
        let _guard = self.shared.file_lock.read();
        query::query_by_date_range(&self.shared.layout, severity, first, second)
    }

    pub fn stats(&self) -> FlushStats {
        self.shared.stats()
    }

    /// Blocks until everything queued before this call has been written, or
    /// `timeout` elapses. Returns whether the flush thread caught up.
    pub fn flush(&self, timeout: Duration) -> bool {
        self.shared.wait_persisted(timeout)
    }

    /// Registers this logger as the `log` crate's global logger.
    ///
    /// The logger then lives for the rest of the process; call
    /// `log::logger().flush()` before exiting to persist queued records.
    pub fn install(self, max_level: log::LevelFilter) -> Result<(), log::SetLoggerError> {
        log::set_boxed_logger(Box::new(self))?;
        log::set_max_level(max_level);
        Ok(())
    }
}

impl Drop for FileLogger {
    fn drop(&mut self) {
        self.shared.request_shutdown();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!("flush thread panicked");
            }
        }
    }
}

impl log::Log for FileLogger {
    /// Events from this crate's own modules are refused, so the flush loop's
    /// diagnostics never come back to it as entries.
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        !is_own_target(metadata.target())
    }

    fn log(&self, record: &log::Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let class_name = record.module_path().unwrap_or_else(|| record.target());
        let entry = self
            .entry(Severity::from_log_level(record.level()), record.args().to_string())
            .with_call_site(CallSite::new(class_name, "", record.line()));
        self.shared.enqueue(entry);
    }

    fn flush(&self) {
        self.shared.wait_persisted(LOG_FACADE_FLUSH_TIMEOUT);
    }
}

/// Queues an Info entry with the enclosing function as call site.
///
/// ```
/// # use daily_logger::{log_info, FileLogger, LoggerConfig};
/// # let dir = tempfile::tempdir().unwrap();
/// # let logger = FileLogger::new(LoggerConfig::new(dir.path())).unwrap();
/// log_info!(logger, "started {} workers", 4);
/// log_info!(logger, user: "alice", permission: 2, "opened {}", "valve 3");
/// ```
#[macro_export]
macro_rules! log_info {
    ($logger:expr, user: $user:expr, permission: $permission:expr, $($arg:tt)+) => {
        $crate::__log_at_call_site!($logger, $crate::Severity::Info, $user, $permission, $($arg)+)
    };
    ($logger:expr, $($arg:tt)+) => {
        $crate::__log_at_call_site!($logger, $crate::Severity::Info, $crate::DEFAULT_USER, 0, $($arg)+)
    };
}

/// Queues an Error entry with the enclosing function as call site.
#[macro_export]
macro_rules! log_error {
    ($logger:expr, user: $user:expr, permission: $permission:expr, $($arg:tt)+) => {
        $crate::__log_at_call_site!($logger, $crate::Severity::Error, $user, $permission, $($arg)+)
    };
    ($logger:expr, $($arg:tt)+) => {
        $crate::__log_at_call_site!($logger, $crate::Severity::Error, $crate::DEFAULT_USER, 0, $($arg)+)
    };
}

/// Queues an Alarm entry with the enclosing function as call site.
#[macro_export]
macro_rules! log_alarm {
    ($logger:expr, user: $user:expr, permission: $permission:expr, $($arg:tt)+) => {
        $crate::__log_at_call_site!($logger, $crate::Severity::Alarm, $user, $permission, $($arg)+)
    };
    ($logger:expr, $($arg:tt)+) => {
        $crate::__log_at_call_site!($logger, $crate::Severity::Alarm, $crate::DEFAULT_USER, 0, $($arg)+)
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __log_at_call_site {
    ($logger:expr, $severity:expr, $user:expr, $permission:expr, $($arg:tt)+) => {{
        let logger: &$crate::FileLogger = &$logger;
        let site = $crate::call_site!();
        logger.write_entry(
            logger
                .entry($severity, ::std::format!($($arg)+))
                .with_user($user, $permission)
                .with_call_site(site),
        );
    }};
}
