use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use parking_lot::Mutex;

/// Wall-clock source for occurrence and recorded timestamps.
///
/// The logger reads the clock twice per entry: once when the entry is
/// enqueued (occurrence time) and once when the flush loop writes it
/// (recorded time, which also picks the daily file).
///
/// # Examples
///
/// ```
/// # use daily_logger::clock::{Clock, ManualClock};
/// # use chrono::NaiveDate;
/// let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(23, 59, 0).unwrap();
/// let clock = ManualClock::new(start);
/// clock.advance(std::time::Duration::from_secs(120));
/// assert_eq!(clock.now().date(), NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
/// ```
pub trait Clock: Send + Sync {
    /// Current local time.
    fn now(&self) -> NaiveDateTime;
}

/// The host's local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same underlying time, so a test can keep one handle and
/// give another to the logger.
#[derive(Debug, Clone)]
pub struct ManualClock {
    current: Arc<Mutex<NaiveDateTime>>,
}

impl ManualClock {
    pub fn new(start: NaiveDateTime) -> Self {
        Self {
            current: Arc::new(Mutex::new(start)),
        }
    }

    /// Jumps to an absolute time, forwards or backwards.
    pub fn set(&self, to: NaiveDateTime) {
        *self.current.lock() = to;
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut current = self.current.lock();
        // Durations beyond chrono's range saturate at the maximum representable time.
        let delta = chrono::Duration::from_std(by).unwrap_or(chrono::Duration::MAX);
        *current = current.checked_add_signed(delta).unwrap_or(NaiveDateTime::MAX);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        *self.current.lock()
    }
}
