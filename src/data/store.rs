//! Capacity-bounded reading history.
//!
//! [`Store`] keeps the most recent readings in arrival order and evicts the
//! oldest once the capacity is exceeded. [`SharedStore`] wraps it in a lock
//! so a background producer can append while the UI renders.

use std::collections::{vec_deque, BTreeMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::{RwLock, RwLockReadGuard};

use super::reading::{Metric, Reading};

/// Default number of readings kept (~24h at one reading per minute).
pub const DEFAULT_CAPACITY: usize = 1440;

/// Append-only, capacity-bounded history of readings.
#[derive(Debug, Clone)]
pub struct Store {
    history: VecDeque<Reading>,
    capacity: usize,
    last_seen_by_room: BTreeMap<String, DateTime<Utc>>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    /// Create an empty store with [`DEFAULT_CAPACITY`].
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create an empty store keeping at most `capacity` readings.
    ///
    /// A capacity of zero is treated as one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            history: VecDeque::with_capacity(capacity),
            capacity,
            last_seen_by_room: BTreeMap::new(),
        }
    }

    /// Append a reading, evicting the oldest entries beyond capacity.
    ///
    /// A timestamp older than the latest stored one is clamped up to it, so
    /// the history stays sorted for [`Store::since`].
    ///
    /// Returns the number of evicted readings.
    pub fn append(&mut self, mut reading: Reading) -> usize {
        if let Some(last) = self.latest_timestamp() {
            if reading.timestamp < last {
                tracing::debug!(
                    room = %reading.room,
                    timestamp = %reading.timestamp,
                    clamped_to = %last,
                    "clamped out-of-order timestamp"
                );
                reading.timestamp = last;
            }
        }
        self.last_seen_by_room
            .insert(reading.room.clone(), reading.timestamp);
        self.history.push_back(reading);

        let mut evicted = 0;
        while self.history.len() > self.capacity {
            self.history.pop_front();
            evicted += 1;
        }
        evicted
    }

    /// The most recently appended reading, or `None` if nothing was appended yet.
    pub fn latest(&self) -> Option<&Reading> {
        self.history.back()
    }

    /// Timestamp of the most recently appended reading.
    pub fn latest_timestamp(&self) -> Option<DateTime<Utc>> {
        self.history.back().map(|r| r.timestamp)
    }

    /// The most recent reading recorded for `room`.
    pub fn latest_for_room(&self, room: &str) -> Option<&Reading> {
        self.history.iter().rev().find(|r| r.room == room)
    }

    /// Lazy `(timestamp, values)` sequence over the selected metrics, oldest first.
    ///
    /// The returned iterator is `Clone`, so it can be restarted without
    /// touching the store again.
    pub fn window<'a>(&'a self, metrics: &'a [Metric]) -> Window<'a> {
        Window {
            inner: self.history.iter(),
            metrics,
        }
    }

    /// Readings captured at or after `since`, oldest first.
    pub fn since(&self, since: DateTime<Utc>) -> impl Iterator<Item = &Reading> + Clone {
        // history is ordered by timestamp, so skip the prefix that is too old
        let start = self.history.partition_point(|r| r.timestamp < since);
        self.history.range(start..)
    }

    pub fn iter(&self) -> vec_deque::Iter<'_, Reading> {
        self.history.iter()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Last capture time per room, in room-name order.
    pub fn last_seen_by_room(&self) -> &BTreeMap<String, DateTime<Utc>> {
        &self.last_seen_by_room
    }

    pub fn last_seen(&self, room: &str) -> Option<DateTime<Utc>> {
        self.last_seen_by_room.get(room).copied()
    }

    /// Judge whether `room` is still reporting.
    pub fn liveness(&self, room: &str, now: DateTime<Utc>, offline_after: Duration) -> Liveness {
        match self.last_seen(room) {
            None => Liveness::Never,
            Some(seen) => {
                let age = (now - seen).to_std().unwrap_or(Duration::ZERO);
                if age > offline_after {
                    Liveness::Offline { age }
                } else {
                    Liveness::Online { age }
                }
            }
        }
    }
}

/// Whether a room has reported recently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    /// Last reading is within the offline timeout.
    Online { age: Duration },
    /// Last reading is older than the offline timeout.
    Offline { age: Duration },
    /// No reading has ever been recorded for the room.
    Never,
}

impl Liveness {
    pub fn label(&self) -> &'static str {
        match self {
            Liveness::Online { .. } => "online",
            Liveness::Offline { .. } => "offline",
            Liveness::Never => "no data",
        }
    }

    pub fn is_online(&self) -> bool {
        matches!(self, Liveness::Online { .. })
    }
}

/// One point of a [`Window`]: capture time and the selected metric values.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowPoint {
    pub timestamp: DateTime<Utc>,
    pub values: Vec<(Metric, f64)>,
}

impl WindowPoint {
    pub fn get(&self, metric: Metric) -> Option<f64> {
        self.values.iter().find(|(m, _)| *m == metric).map(|(_, v)| *v)
    }
}

/// Lazy iterator returned by [`Store::window`].
#[derive(Debug, Clone)]
pub struct Window<'a> {
    inner: vec_deque::Iter<'a, Reading>,
    metrics: &'a [Metric],
}

impl Iterator for Window<'_> {
    type Item = WindowPoint;

    fn next(&mut self) -> Option<Self::Item> {
        let reading = self.inner.next()?;
        Some(WindowPoint {
            timestamp: reading.timestamp,
            values: self.metrics.iter().map(|&m| (m, reading.value(m))).collect(),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Window<'_> {}

/// Cloneable handle to a [`Store`] shared between a producer and readers.
///
/// Appends (including the trim) happen under the write lock, so readers
/// never observe a half-resized history.
#[derive(Debug, Clone, Default)]
pub struct SharedStore {
    inner: Arc<RwLock<Store>>,
}

impl SharedStore {
    pub fn new(store: Store) -> Self {
        Self {
            inner: Arc::new(RwLock::new(store)),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::new(Store::with_capacity(capacity))
    }

    /// Append under the write lock. Returns the number of evicted readings.
    pub fn append(&self, reading: Reading) -> usize {
        self.inner.write().append(reading)
    }

    /// Snapshot of the latest reading.
    pub fn latest(&self) -> Option<Reading> {
        self.inner.read().latest().cloned()
    }

    /// Borrow the store for a consistent multi-step read.
    pub fn read(&self) -> RwLockReadGuard<'_, Store> {
        self.inner.read()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::reading::Metrics;
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn reading(i: i64, room: &str) -> Reading {
        Reading::new(ts(i), room, Metrics::new(600.0 + i as f64, 22.0, 45.0, 8.0))
    }

    #[test]
    fn new_store_is_empty() {
        let store = Store::new();
        assert!(store.is_empty());
        assert!(store.latest().is_none());
        assert_eq!(store.capacity(), 1440);
        assert_eq!(store.window(&Metric::ALL).count(), 0);
    }

    #[test]
    fn length_is_min_of_appends_and_capacity() {
        for n in [0usize, 1, 5, 10, 11, 25] {
            let mut store = Store::with_capacity(10);
            for i in 0..n {
                store.append(reading(i as i64, "Lab"));
            }
            assert_eq!(store.len(), n.min(10));

            // retained entries are the most recent ones, in order
            let kept: Vec<f64> = store.iter().map(|r| r.metrics.co2).collect();
            let expected: Vec<f64> = (n.saturating_sub(10)..n).map(|i| 600.0 + i as f64).collect();
            assert_eq!(kept, expected);
        }
    }

    #[test]
    fn one_past_capacity_evicts_the_first_reading() {
        let mut store = Store::new();
        for i in 0..1440 {
            assert_eq!(store.append(reading(i, "Lab")), 0);
        }
        assert_eq!(store.len(), 1440);
        assert_eq!(store.iter().next().unwrap().timestamp, ts(0));

        assert_eq!(store.append(reading(1440, "Lab")), 1);
        assert_eq!(store.len(), 1440);
        assert!(store.iter().all(|r| r.timestamp != ts(0)));
        assert_eq!(store.iter().next().unwrap().timestamp, ts(1));
        assert_eq!(store.latest().unwrap().timestamp, ts(1440));
    }

    #[test]
    fn append_records_last_seen_per_room() {
        let mut store = Store::new();
        store.append(reading(1, "Lab"));
        store.append(reading(2, "Office A"));
        store.append(reading(3, "Lab"));

        assert_eq!(store.last_seen("Lab"), Some(ts(3)));
        assert_eq!(store.last_seen("Office A"), Some(ts(2)));
        assert_eq!(store.last_seen("Office B"), None);
        assert_eq!(store.latest_for_room("Office A").unwrap().timestamp, ts(2));
    }

    #[test]
    fn window_is_restartable_and_ordered() {
        let mut store = Store::new();
        for i in 0..3 {
            store.append(reading(i, "Lab"));
        }
        let selection = [Metric::Co2, Metric::Pm];
        let window = store.window(&selection);
        assert_eq!(window.len(), 3);

        let first: Vec<_> = window.clone().collect();
        let second: Vec<_> = window.collect();
        assert_eq!(first, second);

        assert_eq!(first[0].timestamp, ts(0));
        assert_eq!(first[2].get(Metric::Co2), Some(602.0));
        assert_eq!(first[2].get(Metric::Pm), Some(8.0));
        assert_eq!(first[2].get(Metric::Temp), None);
    }

    #[test]
    fn since_skips_older_readings() {
        let mut store = Store::new();
        for i in 0..10 {
            store.append(reading(i, "Lab"));
        }
        let recent: Vec<_> = store.since(ts(7)).map(|r| r.timestamp).collect();
        assert_eq!(recent, vec![ts(7), ts(8), ts(9)]);
        assert_eq!(store.since(ts(100)).count(), 0);
    }

    #[test]
    fn backwards_timestamp_is_clamped_to_latest() {
        let mut store = Store::new();
        store.append(reading(100, "Lab"));
        store.append(reading(50, "Office A"));
        store.append(reading(101, "Lab"));

        let stamps: Vec<_> = store.iter().map(|r| r.timestamp).collect();
        assert_eq!(stamps, vec![ts(100), ts(100), ts(101)]);
        assert!(stamps.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(store.last_seen("Office A"), Some(ts(100)));

        let recent: Vec<_> = store.since(ts(90)).map(|r| r.metrics.co2).collect();
        assert_eq!(recent, vec![700.0, 650.0, 701.0]);
    }

    #[test]
    fn liveness_uses_offline_timeout() {
        let mut store = Store::new();
        store.append(reading(0, "Lab"));
        let timeout = Duration::from_secs(30);

        assert!(store.liveness("Lab", ts(10), timeout).is_online());
        assert_eq!(
            store.liveness("Lab", ts(31), timeout),
            Liveness::Offline {
                age: Duration::from_secs(31)
            }
        );
        assert_eq!(store.liveness("Office B", ts(10), timeout), Liveness::Never);
    }

    #[test]
    fn zero_capacity_keeps_one_reading() {
        let mut store = Store::with_capacity(0);
        store.append(reading(0, "Lab"));
        store.append(reading(1, "Lab"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.latest().unwrap().timestamp, ts(1));
    }

    #[test]
    fn shared_store_appends_from_another_thread() {
        let shared = SharedStore::with_capacity(100);
        let producer = shared.clone();

        let handle = std::thread::spawn(move || {
            for i in 0..250 {
                producer.append(reading(i, "Lab"));
            }
        });

        // readers see a consistent, bounded history while the producer runs
        while !handle.is_finished() {
            let store = shared.read();
            assert!(store.len() <= 100);
            if let (Some(first), Some(last)) = (store.iter().next(), store.latest()) {
                assert!(first.timestamp <= last.timestamp);
            }
        }
        handle.join().unwrap();

        assert_eq!(shared.len(), 100);
        assert_eq!(shared.latest().unwrap().timestamp, ts(249));
    }
}
