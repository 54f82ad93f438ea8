use daily_logger::queue::{MessageQueue, WakeSignal};
use daily_logger::{LogEntry, Severity};
use chrono::NaiveDate;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn entry(message: String) -> LogEntry {
    let at = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
    LogEntry::new(Severity::Info, message, at)
}

#[test]
fn test_notifications_collapse_into_one_wake() {
    let signal = WakeSignal::new();
    for _ in 0..100 {
        signal.notify();
    }
    assert!(signal.is_set());

    assert!(signal.wait_and_reset_timeout(Duration::from_millis(10)));
    assert!(!signal.wait_and_reset_timeout(Duration::from_millis(10)));
}

#[test]
fn test_notify_wakes_blocked_waiter() {
    let signal = Arc::new(WakeSignal::new());
    let waiter = {
        let signal = Arc::clone(&signal);
        thread::spawn(move || signal.wait_and_reset())
    };

    thread::sleep(Duration::from_millis(20));
    signal.notify();
    waiter.join().unwrap();
    assert!(!signal.is_set());
}

#[test]
fn test_concurrent_push_and_drain() {
    const PRODUCERS: usize = 4;
    const PER_PRODUCER: usize = 1000;

    let queue = Arc::new(MessageQueue::new());
    let signal = Arc::new(WakeSignal::new());

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|p| {
            let queue = Arc::clone(&queue);
            let signal = Arc::clone(&signal);
            thread::spawn(move || {
                for i in 0..PER_PRODUCER {
                    queue.push(entry(format!("{}-{}", p, i)));
                    signal.notify();
                }
            })
        })
        .collect();

    let mut seen = Vec::new();
    while seen.len() < PRODUCERS * PER_PRODUCER {
        signal.wait_and_reset_timeout(Duration::from_millis(50));
        seen.extend(queue.drain());
    }
    for producer in producers {
        producer.join().unwrap();
    }

    assert_eq!(seen.len(), PRODUCERS * PER_PRODUCER);
    assert!(queue.is_empty());

    // Each producer's entries come out in the order it pushed them.
    for p in 0..PRODUCERS {
        let prefix = format!("{}-", p);
        let order: Vec<usize> = seen
            .iter()
            .filter_map(|e| e.message.strip_prefix(&prefix))
            .map(|i| i.parse().unwrap())
            .collect();
        assert_eq!(order, (0..PER_PRODUCER).collect::<Vec<_>>());
    }
}
