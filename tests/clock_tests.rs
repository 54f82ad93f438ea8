use daily_logger::{Clock, ManualClock, SystemClock};
use chrono::{Local, NaiveDate};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[test]
fn test_system_clock_tracks_local_time() {
    let before = Local::now().naive_local();
    let now = SystemClock.now();
    let after = Local::now().naive_local();
    assert!(before <= now && now <= after, "Clock should read local wall time");
}

#[test]
fn test_system_clock_monotonic_enough() {
    let clock = SystemClock;
    let first = clock.now();
    thread::sleep(Duration::from_millis(2));
    assert!(clock.now() > first);
}

#[test]
fn test_manual_clock_only_moves_when_told() {
    let start = NaiveDate::from_ymd_opt(2024, 2, 28).unwrap().and_hms_opt(23, 0, 0).unwrap();
    let clock = ManualClock::new(start);
    assert_eq!(clock.now(), start);
    assert_eq!(clock.now(), start);

    clock.advance(Duration::from_secs(2 * 3600));
    assert_eq!(clock.now().date(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());

    clock.set(start);
    assert_eq!(clock.now(), start);
}

#[test]
fn test_manual_clock_clones_share_time() {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
    let clock = ManualClock::new(start);
    let handed_out: Arc<dyn Clock> = Arc::new(clock.clone());

    clock.advance(Duration::from_millis(1500));
    assert_eq!(handed_out.now(), start + chrono::Duration::milliseconds(1500));
}

#[test]
fn test_manual_clock_advance_saturates() {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
    let clock = ManualClock::new(start);
    clock.advance(Duration::MAX);
    assert_eq!(clock.now(), chrono::NaiveDateTime::MAX);
}
