//! The background flush loop and the per-instance state it shares with
//! producers.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{NaiveDate, NaiveDateTime};
use parking_lot::{Condvar, Mutex, RwLock};

use crate::clock::Clock;
use crate::config::LoggerConfig;
use crate::entry::LogEntry;
use crate::error::LogError;
use crate::layout::LogLayout;
use crate::queue::{MessageQueue, WakeSignal};
use crate::record::write_record;
use crate::severity::Severity;

/// Attempts made to persist what is left in the queue once the logger is
/// being dropped.
const SHUTDOWN_ATTEMPTS: u32 = 3;

/// Snapshot of the flush loop's counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlushStats {
    /// Cycles that wrote at least one entry or failed trying
    pub cycles: u64,
    /// Entries persisted since the logger started
    pub entries_written: u64,
    /// Cycles that hit an I/O fault
    pub failed_cycles: u64,
    /// Entries waiting in the queue, including requeued ones
    pub pending: usize,
    /// Text of the most recent fault, cleared by the next good cycle
    pub last_error: Option<String>,
}

/// Counts entries in and out so callers can wait for the loop to catch up.
#[derive(Debug, Default)]
struct Progress {
    enqueued: AtomicU64,
    persisted: Mutex<u64>,
    cond: Condvar,
}

impl Progress {
    fn add_persisted(&self, count: usize) {
        if count == 0 {
            return;
        }
        let mut persisted = self.persisted.lock();
        *persisted += count as u64;
        self.cond.notify_all();
    }

    fn wait_for(&self, target: u64, timeout: Duration) -> bool {
        let deadline = Instant::now().checked_add(timeout);
        let mut persisted = self.persisted.lock();
        while *persisted < target {
            match deadline {
                Some(deadline) => {
                    if self.cond.wait_until(&mut persisted, deadline).timed_out() {
                        return *persisted >= target;
                    }
                }
                None => self.cond.wait(&mut persisted),
            }
        }
        true
    }
}

/// State owned once per logger and shared with its flush thread.
pub(crate) struct Shared {
    pub(crate) queue: MessageQueue,
    pub(crate) signal: WakeSignal,
    /// Held exclusively while a cycle writes, shared while a query reads.
    pub(crate) file_lock: RwLock<()>,
    pub(crate) layout: LogLayout,
    pub(crate) clock: Arc<dyn Clock>,
    stats: Mutex<FlushStats>,
    progress: Progress,
    shutdown: AtomicBool,
}

impl Shared {
    pub(crate) fn new(layout: LogLayout, clock: Arc<dyn Clock>) -> Self {
        Self {
            queue: MessageQueue::new(),
            signal: WakeSignal::new(),
            file_lock: RwLock::new(()),
            layout,
            clock,
            stats: Mutex::new(FlushStats::default()),
            progress: Progress::default(),
            shutdown: AtomicBool::new(false),
        }
    }

    /// Producer side: queue the entry and wake the loop. Never touches files.
    pub(crate) fn enqueue(&self, entry: LogEntry) {
        self.queue.push(entry);
        self.progress.enqueued.fetch_add(1, Ordering::AcqRel);
        self.signal.notify();
    }

    pub(crate) fn stats(&self) -> FlushStats {
        let mut stats = self.stats.lock().clone();
        stats.pending = self.queue.len();
        stats
    }

    /// Waits until as many entries as had been enqueued before the call have
    /// been persisted.
    pub(crate) fn wait_persisted(&self, timeout: Duration) -> bool {
        let target = self.progress.enqueued.load(Ordering::Acquire);
        self.progress.wait_for(target, timeout)
    }

    pub(crate) fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
        self.signal.notify();
    }

    fn is_shutting_down(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }
}

/// What a cycle managed to do.
struct BatchOutcome {
    written: usize,
    /// Entries of failed severities, in drain order
    unwritten: Vec<LogEntry>,
    /// First fault of the cycle
    error: Option<LogError>,
}

/// Why a cycle stopped short, and how far it got.
struct CycleFailure {
    written: usize,
    error: LogError,
}

/// A per-severity daily file as seen by one cycle.
enum DailyFile {
    Unopened,
    Open { file: File, path: PathBuf },
    Failed,
}

/// Appendable output that can be cut back after a failed write.
trait RecordSink: Write {
    fn end_offset(&mut self) -> io::Result<u64>;
    fn truncate_to(&mut self, len: u64) -> io::Result<()>;
}

impl RecordSink for File {
    fn end_offset(&mut self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn truncate_to(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }
}

/// Writes one record. On failure the sink is cut back to where the record
/// started, so a retry does not leave a torn block in front of it.
fn append_record<S: RecordSink>(sink: &mut S, entry: &LogEntry, recorded_at: &NaiveDateTime) -> io::Result<()> {
    let start = sink.end_offset()?;
    if let Err(error) = write_record(sink, entry, recorded_at) {
        if let Err(rollback) = sink.truncate_to(start) {
            tracing::warn!(error = %rollback, "could not remove partial record");
        }
        return Err(error);
    }
    Ok(())
}

/// Doubling delay between failed cycles.
struct Backoff {
    initial: Duration,
    max: Duration,
    current: Duration,
}

impl Backoff {
    fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            max,
            current: initial,
        }
    }

    fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = self.current.saturating_mul(2).min(self.max);
        delay
    }

    fn reset(&mut self) {
        self.current = self.initial;
    }
}

/// The single consumer. Runs on its own thread until the logger is dropped.
pub(crate) struct FlushLoop {
    shared: Arc<Shared>,
    backoff: Backoff,
}

impl FlushLoop {
    pub(crate) fn new(shared: Arc<Shared>, config: &LoggerConfig) -> Self {
        Self {
            shared,
            backoff: Backoff::new(config.retry_backoff_initial(), config.retry_backoff_max()),
        }
    }

    pub(crate) fn run(mut self) {
        loop {
            self.shared.signal.wait_and_reset();

            if self.shared.is_shutting_down() {
                self.final_drain();
                return;
            }

            if let Err(failure) = self.run_cycle() {
                let delay = self.backoff.next_delay();
                tracing::error!(
                    error = %failure.error,
                    written = failure.written,
                    pending = self.shared.queue.len(),
                    retry_in_ms = delay.as_millis() as u64,
                    "flush cycle failed, entries requeued"
                );
                std::thread::sleep(delay);
                // Retry even if no producer calls in meanwhile.
                self.shared.signal.notify();
            } else {
                self.backoff.reset();
            }
        }
    }

    fn final_drain(&mut self) {
        for attempt in 1..=SHUTDOWN_ATTEMPTS {
            match self.run_cycle() {
                Ok(_) if self.shared.queue.is_empty() => return,
                Ok(_) => continue,
                Err(failure) => {
                    tracing::warn!(attempt, error = %failure.error, "final flush attempt failed");
                    std::thread::sleep(self.backoff.initial);
                }
            }
        }
        let lost = self.shared.queue.len();
        if lost > 0 {
            tracing::error!(lost, "logger dropped with unpersisted entries");
        }
    }

    /// Drains the queue and writes the batch. Returns how many entries were written.
    fn run_cycle(&mut self) -> Result<usize, CycleFailure> {
        let batch = self.shared.queue.drain();
        if batch.is_empty() {
            return Ok(0);
        }

        let outcome = {
            let _guard = self.shared.file_lock.write();
            self.write_batch(batch)
        };
        let written = outcome.written;

        {
            let mut stats = self.shared.stats.lock();
            stats.cycles += 1;
            stats.entries_written += written as u64;
            match &outcome.error {
                None => stats.last_error = None,
                Some(error) => {
                    stats.failed_cycles += 1;
                    stats.last_error = Some(error.to_string());
                }
            }
        }

        self.shared.queue.requeue_front(outcome.unwritten);
        self.shared.progress.add_persisted(written);

        match outcome.error {
            None => {
                tracing::debug!(written, "flush cycle complete");
                Ok(written)
            }
            Some(error) => Err(CycleFailure { written, error }),
        }
    }

    /// Writes entries in drain order, each to its severity's daily file.
    ///
    /// The whole batch shares one recorded time, which also picks the file
    /// date. Files are opened on first use and closed when the batch is
    /// done. A fault stops only the severity it happened in: that severity's
    /// remaining entries are handed back, the other severities keep going.
    fn write_batch(&self, batch: Vec<LogEntry>) -> BatchOutcome {
        let recorded_at = self.shared.clock.now();
        let today = recorded_at.date();
        let mut files = [DailyFile::Unopened, DailyFile::Unopened, DailyFile::Unopened];
        let mut outcome = BatchOutcome {
            written: 0,
            unwritten: Vec::new(),
            error: None,
        };

        for entry in batch {
            let slot = entry.severity.index();
            if let DailyFile::Unopened = files[slot] {
                files[slot] = match self.open_daily_file(entry.severity, today) {
                    Ok((file, path)) => DailyFile::Open { file, path },
                    Err(error) => {
                        outcome.fail(entry.severity, error);
                        DailyFile::Failed
                    }
                };
            }

            let result = match &mut files[slot] {
                DailyFile::Open { file, path } => {
                    Some(append_record(file, &entry, &recorded_at).map_err(|e| LogError::io(path.as_path(), e)))
                }
                _ => None,
            };
            match result {
                Some(Ok(())) => outcome.written += 1,
                Some(Err(error)) => {
                    outcome.fail(entry.severity, error);
                    files[slot] = DailyFile::Failed;
                    outcome.unwritten.push(entry);
                }
                None => outcome.unwritten.push(entry),
            }
        }
        outcome
    }

    fn open_daily_file(&self, severity: Severity, date: NaiveDate) -> Result<(File, PathBuf), LogError> {
        let layout = &self.shared.layout;
        layout.ensure_severity_dir(severity)?;
        let path = layout.file_path(severity, date);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| LogError::io(&path, e))?;
        Ok((file, path))
    }
}

impl BatchOutcome {
    fn fail(&mut self, severity: Severity, error: LogError) {
        tracing::warn!(%severity, error = %error, "severity stream failed for this cycle");
        if self.error.is_none() {
            self.error = Some(error);
        }
    }
}
