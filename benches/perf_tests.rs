use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use daily_logger::{FileLogger, LoggerConfig, ManualClock, Severity};
use chrono::NaiveDate;
use log::{info, LevelFilter};
use log4rs::{
    append::file::FileAppender,
    config::{Appender, Config, Root},
    encode::pattern::PatternEncoder,
};
use std::path::Path;
use std::sync::{Arc, Once};
use std::time::Duration;
use tempfile::tempdir;

const BATCH: usize = 1_000;
const FLUSH_TIMEOUT: Duration = Duration::from_secs(60);

static LOG4RS_INIT: Once = Once::new();

#[derive(Debug)]
struct TestEvent {
    id: i32,
    active: bool,
    large_number: u64,
    description: String,
}

impl std::fmt::Display for TestEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Event[id={}, active={}, large_number={}, desc={}]",
            self.id, self.active, self.large_number, self.description)
    }
}

fn event() -> TestEvent {
    TestEvent {
        id: 42,
        active: true,
        large_number: u64::MAX,
        description: "Pump 3 pressure above threshold; CPU: 95%, Memory: 2.5GB, Network: 1.2Gbps".to_string(),
    }
}

fn fixed_clock() -> Arc<ManualClock> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(12, 0, 0).unwrap();
    Arc::new(ManualClock::new(start))
}

fn setup_log4rs(log_file: &Path) {
    LOG4RS_INIT.call_once(|| {
        let logfile = FileAppender::builder()
            .encoder(Box::new(PatternEncoder::new("{d} - {m}{n}")))
            .append(true)
            .build(log_file)
            .unwrap();

        let config = Config::builder()
            .appender(Appender::builder().build("logfile", Box::new(logfile)))
            .build(Root::builder().appender("logfile").build(LevelFilter::Info))
            .unwrap();

        log4rs::init_config(config).unwrap();
    });
}

fn bench_logging_comparison(c: &mut Criterion) {
    let mut group = c.benchmark_group("Logging Comparison");
    group.sample_size(10);
    let event = event();

    let dir = tempdir().unwrap();
    let logger = FileLogger::with_clock(LoggerConfig::new(dir.path().join("daily")), fixed_clock()).unwrap();

    // Caller-side cost only: the flush thread writes in the background.
    group.bench_function("daily_logger_enqueue", |b| {
        b.iter(|| {
            for i in 0..BATCH {
                logger.info(format!("Test perf: iteration={}, event={}", i, event));
            }
        });
        logger.flush(FLUSH_TIMEOUT);
    });

    group.bench_function("daily_logger_enqueue_and_flush", |b| {
        b.iter(|| {
            for i in 0..BATCH {
                logger.info(format!("Test perf: iteration={}, event={}", i, event));
            }
            black_box(logger.flush(FLUSH_TIMEOUT))
        });
    });

    setup_log4rs(&dir.path().join("log4rs").join("traditional.log"));
    group.bench_function("log4rs_file", |b| {
        b.iter(|| {
            for i in 0..BATCH {
                info!("Test perf: iteration={}, event={}", i, event);
            }
        });
    });

    group.finish();
}

fn bench_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("Query");
    group.sample_size(10);
    let event = event();

    group.bench_function("query_by_date_10k", |b| {
        b.iter_batched_ref(
            || {
                let dir = tempdir().unwrap();
                let logger = FileLogger::with_clock(LoggerConfig::new(dir.path()), fixed_clock()).unwrap();
                for i in 0..10 * BATCH {
                    logger.error(format!("Test perf: iteration={}, event={}", i, event));
                }
                logger.flush(FLUSH_TIMEOUT);
                (dir, logger)
            },
            |(_dir, logger)| {
                let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
                black_box(logger.query_by_date(Severity::Error, date).unwrap().len())
            },
            BatchSize::PerIteration,
        );
    });

    group.finish();
}

criterion_group!(benches, bench_logging_comparison, bench_query);
criterion_main!(benches);
