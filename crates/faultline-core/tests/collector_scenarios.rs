//! End-to-end collector scenarios driven by a manual clock

use chrono::{TimeZone, Utc};
use faultline_core::{
    ErrorOccurrence, ExpositionExporter, ManualClock, MetricsCollector, MetricsConfig,
};
use std::sync::Arc;
use std::time::Duration;

fn setup(max_events: usize) -> (Arc<MetricsCollector>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap(),
    ));
    let config = MetricsConfig::default()
        .with_bucket_width(Duration::from_secs(60))
        .with_retention_window(Duration::from_secs(300))
        .with_max_events(max_events);
    let collector = MetricsCollector::new(config)
        .unwrap()
        .with_clock(clock.clone());
    (Arc::new(collector), clock)
}

#[test]
fn test_three_not_found_two_server_errors() {
    let (collector, _clock) = setup(100);

    for _ in 0..3 {
        collector.record(
            ErrorOccurrence::new(404, "NotFound", 404, "Resource not found")
                .with_path("/items/1")
                .with_method("GET"),
        );
    }
    collector.record(ErrorOccurrence::new(500, "Internal", 500, "first failure"));
    collector.record(ErrorOccurrence::new(500, "Internal", 500, "second failure"));

    let snapshot = collector.snapshot();
    assert_eq!(snapshot.total_errors, 5);
    assert_eq!(snapshot.error_counts.get(&404), Some(&3));
    assert_eq!(snapshot.error_counts.get(&500), Some(&2));
    assert_eq!(snapshot.recent_events.len(), 5);
    assert_eq!(snapshot.recent_events[0].message(), "second failure");
    assert_eq!(snapshot.recent_events[4].path(), Some("/items/1"));
}

#[test]
fn test_counts_roll_off_while_history_remains() {
    let (collector, clock) = setup(100);

    collector.record(ErrorOccurrence::new(404, "NotFound", 404, "early"));
    clock.advance(Duration::from_secs(120));
    collector.record(ErrorOccurrence::new(500, "Internal", 500, "middle"));
    clock.advance(Duration::from_secs(250));

    // The first window [09:30, 09:31) ended before 09:36:10 - 5m.
    let snapshot = collector.snapshot();
    assert_eq!(snapshot.count_for(404), 0);
    assert_eq!(snapshot.count_for(500), 1);
    assert_eq!(snapshot.total_errors, 1);
    assert_eq!(snapshot.recent_events.len(), 2);

    clock.advance(Duration::from_secs(600));
    let snapshot = collector.snapshot();
    assert_eq!(snapshot.total_errors, 0);
    assert_eq!(snapshot.bucket_count, 0);
    assert_eq!(snapshot.recent_events.len(), 2);
}

#[test]
fn test_bucket_count_stays_bounded() {
    let (collector, clock) = setup(10);
    let max_buckets = collector.config().max_buckets();

    for _ in 0..120 {
        collector.record(ErrorOccurrence::new(500, "Internal", 500, "tick"));
        clock.advance(Duration::from_secs(30));
    }

    assert!(collector.buckets().len() <= max_buckets);
    let snapshot = collector.snapshot();
    assert!(snapshot.bucket_count <= max_buckets);
    // At most seven retained windows of two ticks each.
    assert!(snapshot.total_errors <= 14);
    assert_eq!(snapshot.recent_events.len(), 10);
    assert_eq!(collector.total_events(), 120);
}

#[test]
fn test_boundary_writes_reach_bucket_bound() {
    // The clock starts on a minute boundary and every write lands on one.
    let (collector, clock) = setup(100);
    for _ in 0..=10 {
        collector.record(ErrorOccurrence::new(500, "Internal", 500, "tick"));
        clock.advance(Duration::from_secs(60));
    }
    clock.rewind(Duration::from_secs(60));

    // At 9:40 the horizon is 9:35; the 9:34 window ends exactly there.
    let max_buckets = collector.config().max_buckets();
    assert_eq!(max_buckets, 7);
    assert_eq!(collector.buckets().len(), max_buckets);
    assert_eq!(collector.snapshot().total_errors, 7);
}

#[test]
fn test_backward_skew_keeps_history_and_skips_counts() {
    let (collector, clock) = setup(100);

    collector.record(ErrorOccurrence::new(1, "A", 500, "a"));
    clock.advance(Duration::from_secs(900));
    collector.record(ErrorOccurrence::new(2, "B", 500, "b"));

    clock.rewind(Duration::from_secs(900));
    collector.record(ErrorOccurrence::new(3, "C", 500, "c"));

    assert_eq!(collector.dropped_from_aggregation(), 1);
    assert_eq!(collector.recent_events(1)[0].error_code(), 3);

    clock.advance(Duration::from_secs(900));
    assert_eq!(collector.snapshot().count_for(3), 0);
    assert_eq!(collector.snapshot().count_for(2), 1);
}

#[test]
fn test_earlier_snapshot_is_not_affected_by_later_writes() {
    let (collector, clock) = setup(3);
    collector.record(ErrorOccurrence::new(404, "NotFound", 404, "x"));
    let first = collector.snapshot();

    for _ in 0..10 {
        collector.record(ErrorOccurrence::new(500, "Internal", 500, "y"));
        clock.advance(Duration::from_secs(45));
    }
    collector.clear();

    assert_eq!(first.total_errors, 1);
    assert_eq!(first.error_counts.len(), 1);
    assert_eq!(first.recent_events.len(), 1);
    assert_eq!(first.recent_events[0].error_code(), 404);
}

#[test]
fn test_exposition_reflects_snapshot() {
    let (collector, _clock) = setup(100);
    collector.record(ErrorOccurrence::new(301, "Moved", 404, "x"));
    collector.record(ErrorOccurrence::new(301, "Moved", 404, "x"));

    let exporter = ExpositionExporter::new(collector.clone(), &collector.config().exposition);
    let page = exporter.render();
    assert!(page.contains("faultline_errors_total 2"));
    assert!(page.contains("faultline_errors_by_code{error_code=\"301\"} 2"));
    assert!(page.contains("faultline_errors_by_status{status_code=\"404\"} 2"));
    assert!(page.contains("faultline_error_buckets 1"));
}
