//! Producer/consumer plumbing between log callers and the flush loop.
//!
//! [`MessageQueue`] is an unbounded FIFO that any number of threads push into
//! and exactly one consumer drains. [`WakeSignal`] is a binary latch: however
//! many producers notify before the consumer wakes, the consumer sees a
//! single wake and drains everything in one go.

use std::collections::VecDeque;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use crate::entry::LogEntry;

/// Unbounded multi-producer, single-consumer queue of pending entries.
#[derive(Debug, Default)]
pub struct MessageQueue {
    entries: Mutex<VecDeque<LogEntry>>,
}

impl MessageQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry to the tail. Holds the lock only for the push.
    pub fn push(&self, entry: LogEntry) {
        self.entries.lock().push_back(entry);
    }

    /// Removes and returns every entry currently queued, oldest first.
    ///
    /// Entries pushed while the caller processes the returned batch remain
    /// queued for the next drain.
    pub fn drain(&self) -> Vec<LogEntry> {
        let taken = std::mem::take(&mut *self.entries.lock());
        taken.into()
    }

    /// Puts entries back at the head of the queue, preserving their order and
    /// keeping them ahead of anything pushed in the meantime.
    pub fn requeue_front(&self, batch: Vec<LogEntry>) {
        if batch.is_empty() {
            return;
        }
        let mut entries = self.entries.lock();
        for entry in batch.into_iter().rev() {
            entries.push_front(entry);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

/// Binary wake-up latch for the single consumer.
///
/// # Examples
///
/// ```
/// # use daily_logger::queue::WakeSignal;
/// let signal = WakeSignal::new();
/// signal.notify();
/// signal.notify();
/// // Both notifications collapse into one wake.
/// signal.wait_and_reset();
/// assert!(!signal.is_set());
/// ```
#[derive(Debug, Default)]
pub struct WakeSignal {
    set: Mutex<bool>,
    cond: Condvar,
}

impl WakeSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the latch and wakes the consumer. Idempotent.
    pub fn notify(&self) {
        let mut set = self.set.lock();
        if !*set {
            *set = true;
            self.cond.notify_one();
        }
    }

    /// Blocks until the latch is set, then clears it.
    ///
    /// The clear happens under the same lock as the wait, so a notification
    /// that arrives after this returns sets the latch again and is picked up
    /// by the next call.
    pub fn wait_and_reset(&self) {
        let mut set = self.set.lock();
        while !*set {
            self.cond.wait(&mut set);
        }
        *set = false;
    }

    /// Like [`wait_and_reset`](Self::wait_and_reset) but gives up after
    /// `timeout`. Returns whether the latch had been set.
    pub fn wait_and_reset_timeout(&self, timeout: Duration) -> bool {
        let mut set = self.set.lock();
        if !*set {
            // Spurious wake-ups just shorten the wait; the caller loops anyway.
            let _ = self.cond.wait_for(&mut set, timeout);
        }
        std::mem::replace(&mut *set, false)
    }

    pub fn is_set(&self) -> bool {
        *self.set.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::severity::Severity;
    use chrono::NaiveDate;

    fn entry(message: &str) -> LogEntry {
        let at = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        LogEntry::new(Severity::Info, message, at)
    }

    #[test]
    fn test_drain_returns_fifo_order() {
        let queue = MessageQueue::new();
        queue.push(entry("a"));
        queue.push(entry("b"));
        queue.push(entry("c"));

        let drained: Vec<_> = queue.drain().into_iter().map(|e| e.message).collect();
        assert_eq!(drained, vec!["a", "b", "c"]);
        assert!(queue.is_empty());
        assert!(queue.drain().is_empty());
    }

    #[test]
    fn test_requeue_front_keeps_order_ahead_of_new_entries() {
        let queue = MessageQueue::new();
        queue.push(entry("a"));
        queue.push(entry("b"));
        let batch = queue.drain();
        queue.push(entry("c"));
        queue.requeue_front(batch);

        let drained: Vec<_> = queue.drain().into_iter().map(|e| e.message).collect();
        assert_eq!(drained, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_timeout_without_notify() {
        let signal = WakeSignal::new();
        assert!(!signal.wait_and_reset_timeout(Duration::from_millis(5)));
        signal.notify();
        assert!(signal.wait_and_reset_timeout(Duration::from_millis(5)));
        assert!(!signal.is_set());
    }
}
