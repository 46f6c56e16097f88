//! Concurrency tests for the error metrics collector
//!
//! Many writers against one collector, with and without snapshot readers.

use faultline_core::{ErrorOccurrence, MetricsCollector, MetricsConfig};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

const THREADS: usize = 12;
const PER_THREAD: usize = 1_000;

fn collector(max_events: usize) -> Arc<MetricsCollector> {
    let config = MetricsConfig::default()
        .with_bucket_width(Duration::from_secs(60))
        .with_retention_window(Duration::from_secs(3600))
        .with_max_events(max_events);
    Arc::new(MetricsCollector::new(config).unwrap())
}

#[test]
fn test_concurrent_records_are_all_counted() {
    let collector = collector(500);

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let collector = Arc::clone(&collector);
            thread::spawn(move || {
                for _ in 0..PER_THREAD {
                    collector.record(ErrorOccurrence::new(503, "Unavailable", 503, "busy"));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let snapshot = collector.snapshot();
    let expected = (THREADS * PER_THREAD) as u64;
    assert_eq!(snapshot.count_for(503), expected);
    assert_eq!(snapshot.total_errors, expected);
    assert_eq!(snapshot.recent_events.len(), 500);
    assert_eq!(collector.total_events(), expected);
}

#[test]
fn test_concurrent_mixed_codes_conserve_totals() {
    let collector = collector(100);

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let collector = Arc::clone(&collector);
            thread::spawn(move || {
                let code = 400 + t as u32;
                for _ in 0..PER_THREAD {
                    collector.record(ErrorOccurrence::new(code, "E", 400, "x"));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let counts = collector.error_counts_by_code();
    assert_eq!(counts.len(), THREADS);
    assert!(counts.values().all(|count| *count == PER_THREAD as u64));
    assert_eq!(
        counts.values().sum::<u64>(),
        collector.snapshot().total_errors
    );
}

#[test]
fn test_snapshots_during_writes_are_consistent() {
    let collector = collector(1_000);
    let done = Arc::new(AtomicBool::new(false));

    let reader = {
        let collector = Arc::clone(&collector);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let mut last_total = 0;
            while !done.load(Ordering::Relaxed) {
                let snapshot = collector.snapshot();
                assert_eq!(
                    snapshot.error_counts.values().sum::<u64>(),
                    snapshot.total_errors
                );
                assert!(snapshot.total_errors >= last_total);
                assert!(snapshot.recent_events.len() <= 1_000);
                last_total = snapshot.total_errors;
            }
        })
    };

    let writers: Vec<_> = (0..4)
        .map(|t| {
            let collector = Arc::clone(&collector);
            thread::spawn(move || {
                for i in 0..PER_THREAD {
                    let code = if i % 2 == 0 { 500 } else { 404 + t as u32 };
                    collector.record(ErrorOccurrence::new(code, "E", 500, "x"));
                }
            })
        })
        .collect();
    for writer in writers {
        writer.join().unwrap();
    }
    done.store(true, Ordering::Relaxed);
    reader.join().unwrap();

    assert_eq!(collector.snapshot().total_errors, 4 * PER_THREAD as u64);
}

#[test]
fn test_record_latency_stays_low_under_readers() {
    const CALLS: usize = 10_000;
    let collector = collector(10_000);
    let done = Arc::new(AtomicBool::new(false));

    let readers: Vec<_> = (0..2)
        .map(|_| {
            let collector = Arc::clone(&collector);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                while !done.load(Ordering::Relaxed) {
                    let _ = collector.snapshot();
                    thread::sleep(Duration::from_millis(1));
                }
            })
        })
        .collect();

    let mut latencies = Vec::with_capacity(CALLS);
    for i in 0..CALLS {
        let occurrence = ErrorOccurrence::new(500 + (i % 5) as u32, "E", 500, "latency probe");
        let start = Instant::now();
        collector.record(occurrence);
        latencies.push(start.elapsed());
    }
    done.store(true, Ordering::Relaxed);
    for reader in readers {
        reader.join().unwrap();
    }

    let total: Duration = latencies.iter().sum();
    let average = total / CALLS as u32;
    assert!(average < Duration::from_micros(100), "average record latency {:?}", average);

    // Ignore the slowest 0.1% so a single OS preemption does not fail the run.
    latencies.sort();
    let p999 = latencies[CALLS - CALLS / 1000 - 1];
    assert!(p999 < Duration::from_millis(5), "p99.9 record latency {:?}", p999);
}
