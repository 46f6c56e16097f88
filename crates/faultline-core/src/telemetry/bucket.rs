//! Time-bucketed aggregation with prefix-trim eviction

use crate::error::{FaultlineError, FaultlineResult};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::time::Duration;

/// Longest accepted bucket width or retention window (100 years)
pub const MAX_WINDOW: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Counts for one fixed-width window `[start_time, end_time)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeBucket {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub counts_by_code: HashMap<u32, u64>,
    pub total_count: u64,
}

impl TimeBucket {
    fn new(start_time: DateTime<Utc>, width: chrono::Duration) -> Self {
        Self {
            start_time,
            end_time: start_time
                .checked_add_signed(width)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
            counts_by_code: HashMap::new(),
            total_count: 0,
        }
    }

    /// Both counters move together under the caller's lock.
    fn add(&mut self, error_code: u32) {
        *self.counts_by_code.entry(error_code).or_insert(0) += 1;
        self.total_count += 1;
    }

    /// Whether the bucket's window ended strictly before `horizon`
    ///
    /// A bucket ending exactly at the horizon is still retained.
    pub fn is_expired(&self, horizon: DateTime<Utc>) -> bool {
        self.end_time < horizon
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start_time <= instant && instant < self.end_time
    }
}

/// Outcome of placing a count into the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketInsert {
    /// Counted in an existing or new bucket
    Counted,
    /// The timestamp maps to a window that is already evicted or expired
    Dropped,
}

/// Merged view over the retained buckets
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BucketTotals {
    pub counts_by_code: BTreeMap<u32, u64>,
    pub total_count: u64,
    pub bucket_count: usize,
}

/// Chronologically ordered bucket ring
///
/// Buckets are created lazily and kept oldest-first, so eviction only ever
/// pops from the front. Eviction runs on insert; reads filter expired
/// buckets without mutating.
#[derive(Debug)]
pub struct TimeBucketStore {
    width: chrono::Duration,
    width_ms: i64,
    retention: chrono::Duration,
    buckets: VecDeque<TimeBucket>,
    evicted_horizon: Option<DateTime<Utc>>,
    dropped: u64,
}

impl TimeBucketStore {
    pub fn new(bucket_width: Duration, retention_window: Duration) -> FaultlineResult<Self> {
        if bucket_width < Duration::from_millis(1) || bucket_width.subsec_nanos() % 1_000_000 != 0 {
            return Err(FaultlineError::config_field(
                "bucket_width",
                format!("Bucket width must be a whole number of milliseconds, got {:?}", bucket_width),
            ));
        }
        if retention_window.is_zero() {
            return Err(FaultlineError::config_field(
                "retention_window",
                "Retention window must be greater than 0",
            ));
        }
        check_window("bucket_width", bucket_width)?;
        check_window("retention_window", retention_window)?;

        let width = to_chrono("bucket_width", bucket_width)?;
        let retention = to_chrono("retention_window", retention_window)?;
        let width_ms = width.num_milliseconds();

        Ok(Self {
            width,
            width_ms,
            retention,
            buckets: VecDeque::new(),
            evicted_horizon: None,
            dropped: 0,
        })
    }

    /// Start of the bucket holding `timestamp`: `floor(ts / width) * width`
    pub fn bucket_start(&self, timestamp: DateTime<Utc>) -> DateTime<Utc> {
        let offset_ms = timestamp.timestamp_millis().rem_euclid(self.width_ms);
        let sub_ms_nanos = i64::from(timestamp.timestamp_subsec_nanos() % 1_000_000);
        let offset = chrono::Duration::milliseconds(offset_ms) + chrono::Duration::nanoseconds(sub_ms_nanos);
        timestamp
            .checked_sub_signed(offset)
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Oldest instant whose bucket is still retained relative to `now`
    ///
    /// Saturates at the earliest representable instant.
    pub fn horizon(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_sub_signed(self.retention)
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    fn bucket_end(&self, start: DateTime<Utc>) -> DateTime<Utc> {
        start
            .checked_add_signed(self.width)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Count `error_code` at `timestamp`, evicting expired buckets first
    pub fn insert(
        &mut self,
        error_code: u32,
        timestamp: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> BucketInsert {
        self.evict_expired(now);

        let start = self.bucket_start(timestamp);
        let already_evicted = self.evicted_horizon.is_some_and(|h| start < h);
        if already_evicted || self.bucket_end(start) < self.horizon(now) {
            // Never resurrect a window that eviction has moved past.
            self.dropped += 1;
            return BucketInsert::Dropped;
        }

        let back_start = self.buckets.back().map(|b| b.start_time);
        match back_start {
            Some(back) if back == start => {
                if let Some(bucket) = self.buckets.back_mut() {
                    bucket.add(error_code);
                }
            }
            Some(back) if back > start => self.insert_out_of_order(error_code, start),
            _ => {
                let mut bucket = TimeBucket::new(start, self.width);
                bucket.add(error_code);
                self.buckets.push_back(bucket);
            }
        }
        BucketInsert::Counted
    }

    /// Slow path for a timestamp behind the newest bucket
    fn insert_out_of_order(&mut self, error_code: u32, start: DateTime<Utc>) {
        let idx = self.buckets.partition_point(|b| b.start_time < start);
        match self.buckets.get_mut(idx) {
            Some(bucket) if bucket.start_time == start => bucket.add(error_code),
            _ => {
                let mut bucket = TimeBucket::new(start, self.width);
                bucket.add(error_code);
                self.buckets.insert(idx, bucket);
            }
        }
    }

    /// Pop buckets whose window ended before `now - retention`
    pub fn evict_expired(&mut self, now: DateTime<Utc>) -> usize {
        let horizon = self.horizon(now);
        let mut evicted = 0;
        while self
            .buckets
            .front()
            .is_some_and(|bucket| bucket.is_expired(horizon))
        {
            if let Some(bucket) = self.buckets.pop_front() {
                self.evicted_horizon = Some(
                    self.evicted_horizon
                        .map_or(bucket.end_time, |h| h.max(bucket.end_time)),
                );
                evicted += 1;
            }
        }
        if evicted > 0 {
            tracing::debug!(evicted, remaining = self.buckets.len(), "evicted expired error buckets");
        }
        evicted
    }

    /// Merge counts of buckets still inside the retention window at `now`
    pub fn totals(&self, now: DateTime<Utc>) -> BucketTotals {
        let horizon = self.horizon(now);
        let mut totals = BucketTotals::default();
        for bucket in self.buckets.iter().filter(|b| !b.is_expired(horizon)) {
            for (code, count) in &bucket.counts_by_code {
                *totals.counts_by_code.entry(*code).or_insert(0) += count;
            }
            totals.total_count += bucket.total_count;
            totals.bucket_count += 1;
        }
        totals
    }

    /// Copies of the retained buckets, oldest first
    pub fn retained(&self, now: DateTime<Utc>) -> Vec<TimeBucket> {
        let horizon = self.horizon(now);
        self.buckets
            .iter()
            .filter(|b| !b.is_expired(horizon))
            .cloned()
            .collect()
    }

    /// Number of buckets currently held, including not-yet-pruned expired ones
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Events dropped from aggregation by the evicted-window rule
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
        self.evicted_horizon = None;
        self.dropped = 0;
    }
}

fn check_window(field: &str, duration: Duration) -> FaultlineResult<()> {
    if duration > MAX_WINDOW {
        return Err(FaultlineError::config_field(
            field,
            format!("{} must not exceed {:?}, got {:?}", field, MAX_WINDOW, duration),
        ));
    }
    Ok(())
}

fn to_chrono(field: &str, duration: Duration) -> FaultlineResult<chrono::Duration> {
    chrono::Duration::from_std(duration).map_err(|e| {
        FaultlineError::config_field(field, format!("Duration out of range: {}", e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn store() -> TimeBucketStore {
        TimeBucketStore::new(Duration::from_secs(60), Duration::from_secs(300)).unwrap()
    }

    #[test]
    fn test_rejects_non_positive_durations() {
        assert!(TimeBucketStore::new(Duration::ZERO, Duration::from_secs(1)).is_err());
        assert!(TimeBucketStore::new(Duration::from_secs(1), Duration::ZERO).is_err());
        assert!(TimeBucketStore::new(Duration::from_micros(500), Duration::from_secs(1)).is_err());
    }

    #[test]
    fn test_rejects_sub_millisecond_width() {
        let err = TimeBucketStore::new(Duration::from_micros(1_500), Duration::from_secs(1)).unwrap_err();
        assert!(err.to_string().contains("whole number of milliseconds"));
        assert!(TimeBucketStore::new(Duration::from_millis(2), Duration::from_secs(1)).is_ok());
    }

    #[test]
    fn test_rejects_windows_beyond_limit() {
        let huge = Duration::from_secs(300_000 * 365 * 86_400);
        assert!(TimeBucketStore::new(Duration::from_secs(60), huge).is_err());
        assert!(TimeBucketStore::new(huge, huge).is_err());
        assert!(TimeBucketStore::new(Duration::from_secs(60), MAX_WINDOW).is_ok());
    }

    #[test]
    fn test_arithmetic_saturates_at_calendar_edges() {
        let mut store = TimeBucketStore::new(Duration::from_secs(60), MAX_WINDOW).unwrap();

        let early = DateTime::<Utc>::MIN_UTC + chrono::Duration::days(1);
        assert_eq!(store.horizon(early), DateTime::<Utc>::MIN_UTC);
        assert_eq!(store.insert(1, early, early), BucketInsert::Counted);
        assert_eq!(store.totals(early).total_count, 1);

        let late = DateTime::<Utc>::MAX_UTC;
        assert_eq!(store.insert(2, late, late), BucketInsert::Counted);
        let buckets = store.retained(late);
        assert_eq!(buckets.last().map(|b| b.end_time), Some(DateTime::<Utc>::MAX_UTC));
        assert_eq!(store.totals(late).counts_by_code.get(&2), Some(&1));
    }

    #[test]
    fn test_bucket_ending_at_horizon_is_retained() {
        let mut store = store();
        let base = store.bucket_start(at(0));
        store.insert(1, base, base);

        // The first window ends at base + 60s; with 300s retention that is
        // exactly the horizon at base + 360s.
        let boundary = base + chrono::Duration::seconds(360);
        store.insert(2, boundary, boundary);
        assert_eq!(store.len(), 2);
        assert_eq!(store.totals(boundary).counts_by_code.get(&1), Some(&1));

        let past = boundary + chrono::Duration::milliseconds(1);
        store.insert(3, past, past);
        assert_eq!(store.len(), 2);
        assert_eq!(store.totals(past).counts_by_code.get(&1), None);
    }

    #[test]
    fn test_bucket_start_floors_to_width() {
        let store = store();
        let ts = Utc.timestamp_opt(125, 999_999_999).unwrap();
        assert_eq!(store.bucket_start(ts), Utc.timestamp_opt(120, 0).unwrap());

        let pre_epoch = Utc.timestamp_opt(-1, 500_000_000).unwrap();
        assert_eq!(store.bucket_start(pre_epoch), Utc.timestamp_opt(-60, 0).unwrap());
    }

    #[test]
    fn test_same_window_accumulates() {
        let mut store = store();
        let base = store.bucket_start(at(0));
        let now = base + chrono::Duration::seconds(1);

        store.insert(404, now, now);
        store.insert(404, now + chrono::Duration::seconds(30), now);
        store.insert(500, now + chrono::Duration::seconds(58), now);

        assert_eq!(store.len(), 1);
        let totals = store.totals(now);
        assert_eq!(totals.total_count, 3);
        assert_eq!(totals.counts_by_code.get(&404), Some(&2));
        assert_eq!(totals.counts_by_code.get(&500), Some(&1));
        assert_eq!(totals.bucket_count, 1);
    }

    #[test]
    fn test_new_window_creates_bucket_in_order() {
        let mut store = store();
        for minute in 0..4 {
            let ts = at(minute * 60);
            store.insert(1, ts, ts);
        }
        let buckets = store.retained(at(180));
        assert_eq!(buckets.len(), 4);
        assert!(buckets.windows(2).all(|w| w[0].start_time < w[1].start_time));
        assert!(buckets.iter().all(|b| b.end_time - b.start_time == chrono::Duration::seconds(60)));
    }

    #[test]
    fn test_eviction_is_prefix_trim_on_write() {
        let mut store = store();
        store.insert(1, at(0), at(0));
        store.insert(2, at(60), at(60));

        // Horizon at t=361 is t=61: the first window ended at t=40, the second ends at t=100.
        store.insert(3, at(361), at(361));
        assert_eq!(store.len(), 2);
        let totals = store.totals(at(361));
        assert_eq!(totals.counts_by_code.get(&1), None);
        assert_eq!(totals.counts_by_code.get(&2), Some(&1));
        assert_eq!(totals.counts_by_code.get(&3), Some(&1));
    }

    #[test]
    fn test_reads_filter_expired_without_mutating() {
        let mut store = store();
        store.insert(1, at(0), at(0));
        assert_eq!(store.totals(at(1000)).total_count, 0);
        assert_eq!(store.totals(at(1000)).bucket_count, 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_backward_clock_into_evicted_window_is_dropped() {
        let mut store = store();
        store.insert(1, at(0), at(0));
        store.insert(1, at(600), at(600));
        assert_eq!(store.len(), 1);

        // Clock jumps back into the evicted first window.
        let outcome = store.insert(9, at(10), at(10));
        assert_eq!(outcome, BucketInsert::Dropped);
        assert_eq!(store.dropped(), 1);
        assert_eq!(store.totals(at(600)).counts_by_code.get(&9), None);
    }

    #[test]
    fn test_backward_clock_into_retained_window_is_placed() {
        let mut store = store();
        let base = store.bucket_start(at(0));
        store.insert(1, base, base);
        store.insert(1, base + chrono::Duration::seconds(120), base + chrono::Duration::seconds(120));

        let skewed = base + chrono::Duration::seconds(61);
        assert_eq!(store.insert(2, skewed, skewed), BucketInsert::Counted);
        let buckets = store.retained(base + chrono::Duration::seconds(120));
        assert_eq!(buckets.len(), 3);
        assert_eq!(buckets[1].counts_by_code.get(&2), Some(&1));
        assert!(buckets.windows(2).all(|w| w[0].start_time < w[1].start_time));

        // Second hit on the same middle window reuses it.
        store.insert(2, skewed, skewed);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_clear_resets_horizon() {
        let mut store = store();
        store.insert(1, at(0), at(0));
        store.insert(1, at(600), at(600));
        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.insert(1, at(10), at(10)), BucketInsert::Counted);
    }
}
