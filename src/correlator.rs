//! Create/read pairing into end-to-end latency samples
//!
//! One pending create is tracked per item key. A later create for the same
//! key replaces it, a matching read consumes it, and a read with nothing
//! pending is dropped. Unmatched creates stay pending for the whole run.
//!
//! The elapsed-time axis is anchored at the first successful create seen,
//! which is not necessarily the earliest timestamp in the trace.

use crate::record::OpEvent;
use std::collections::HashMap;

/// An outstanding create waiting for its read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingCreate {
    pub start_time_micros: i64,
    pub duration_micros: i64,
}

/// One correlated (create, read) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatencySample {
    pub item_key: String,
    /// Create start relative to the run's anchor
    pub time_offset_micros: i64,
    /// `read_start + read_latency - create_start - create_duration`, unclamped,
    /// two's-complement wrapping on overflow
    pub latency_micros: i64,
}

/// Pairs create and read events by item key
#[derive(Debug)]
pub struct Correlator {
    pending: HashMap<String, PendingCreate>,
    anchor: Option<i64>,
    latency_min: i64,
    latency_max: i64,
    sample_count: u64,
    unmatched_reads: u64,
}

impl Default for Correlator {
    fn default() -> Self {
        Self::new()
    }
}

impl Correlator {
    pub fn new() -> Self {
        Self {
            pending: HashMap::new(),
            anchor: None,
            latency_min: i64::MAX,
            latency_max: 0,
            sample_count: 0,
            unmatched_reads: 0,
        }
    }

    /// Register (or replace) the pending create for `item_key`
    pub fn on_create(&mut self, item_key: &str, start_time_micros: i64, duration_micros: i64) {
        if self.anchor.is_none() {
            self.anchor = Some(start_time_micros);
        }
        let pending = PendingCreate {
            start_time_micros,
            duration_micros,
        };
        // get_mut avoids reallocating the key on overwrite
        match self.pending.get_mut(item_key) {
            Some(slot) => *slot = pending,
            None => {
                self.pending.insert(item_key.to_string(), pending);
            }
        }
    }

    /// Match a read against the pending create for `item_key`
    ///
    /// Returns `None` when nothing is pending for the key.
    pub fn on_read(
        &mut self,
        item_key: &str,
        start_time_micros: i64,
        read_latency_micros: i64,
    ) -> Option<LatencySample> {
        let Some((item_key, create)) = self.pending.remove_entry(item_key) else {
            self.unmatched_reads += 1;
            return None;
        };

        // A pending entry implies a create was seen, so the anchor is set.
        let anchor = self.anchor.unwrap_or(create.start_time_micros);
        // Timestamps are raw trace input; out-of-range values wrap instead of panicking.
        let latency_micros = start_time_micros
            .wrapping_add(read_latency_micros)
            .wrapping_sub(create.start_time_micros)
            .wrapping_sub(create.duration_micros);

        self.latency_min = self.latency_min.min(latency_micros);
        self.latency_max = self.latency_max.max(latency_micros);
        self.sample_count += 1;

        Some(LatencySample {
            item_key,
            time_offset_micros: create.start_time_micros.wrapping_sub(anchor),
            latency_micros,
        })
    }

    /// Dispatch a decoded event
    pub fn ingest(&mut self, event: OpEvent) -> Option<LatencySample> {
        match event {
            OpEvent::Create {
                item_key,
                start_time_micros,
                duration_micros,
            } => {
                self.on_create(&item_key, start_time_micros, duration_micros);
                None
            }
            OpEvent::Read {
                item_key,
                start_time_micros,
                read_latency_micros,
            } => self.on_read(&item_key, start_time_micros, read_latency_micros),
        }
    }

    /// Start time of the first successful create, if any
    pub fn anchor(&self) -> Option<i64> {
        self.anchor
    }

    /// Smallest latency emitted so far; `i64::MAX` before the first sample
    pub fn latency_min(&self) -> i64 {
        self.latency_min
    }

    /// Largest latency emitted so far; `0` before the first sample
    pub fn latency_max(&self) -> i64 {
        self.latency_max
    }

    pub fn sample_count(&self) -> u64 {
        self.sample_count
    }

    pub fn unmatched_reads(&self) -> u64 {
        self.unmatched_reads
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pairing_latency_and_offset() {
        let mut c = Correlator::new();
        c.on_create("A", 100, 10);
        let sample = c.on_read("A", 500, 50).unwrap();
        assert_eq!(sample.item_key, "A");
        assert_eq!(sample.time_offset_micros, 0);
        assert_eq!(sample.latency_micros, 440);
        assert_eq!(c.pending_count(), 0);
    }

    #[test]
    fn test_offset_relative_to_first_create() {
        let mut c = Correlator::new();
        c.on_create("A", 1_000, 0);
        c.on_create("B", 3_500, 0);
        let sample = c.on_read("B", 4_000, 0).unwrap();
        assert_eq!(sample.time_offset_micros, 2_500);
    }

    #[test]
    fn test_anchor_is_first_create_not_earliest() {
        let mut c = Correlator::new();
        c.on_create("A", 5_000, 0);
        c.on_create("B", 1_000, 0);
        assert_eq!(c.anchor(), Some(5_000));
        let sample = c.on_read("B", 2_000, 0).unwrap();
        assert_eq!(sample.time_offset_micros, -4_000);
    }

    #[test]
    fn test_read_does_not_set_anchor() {
        let mut c = Correlator::new();
        assert!(c.on_read("A", 10, 1).is_none());
        assert_eq!(c.anchor(), None);
        c.on_create("A", 700, 1);
        assert_eq!(c.anchor(), Some(700));
    }

    #[test]
    fn test_unmatched_read_dropped() {
        let mut c = Correlator::new();
        assert!(c.on_read("missing", 500, 50).is_none());
        assert_eq!(c.unmatched_reads(), 1);
        assert_eq!(c.sample_count(), 0);
    }

    #[test]
    fn test_second_create_overwrites_first() {
        let mut c = Correlator::new();
        c.on_create("A", 100, 10);
        c.on_create("A", 200, 20);
        assert_eq!(c.pending_count(), 1);
        let sample = c.on_read("A", 500, 50).unwrap();
        assert_eq!(sample.latency_micros, 500 + 50 - 200 - 20);
        assert_eq!(sample.time_offset_micros, 100);
    }

    #[test]
    fn test_read_consumes_pending_create() {
        let mut c = Correlator::new();
        c.on_create("A", 100, 10);
        assert!(c.on_read("A", 500, 50).is_some());
        assert!(c.on_read("A", 600, 50).is_none());
        assert_eq!(c.sample_count(), 1);
    }

    #[test]
    fn test_negative_latency_not_clamped() {
        let mut c = Correlator::new();
        c.on_create("A", 1_000, 500);
        let sample = c.on_read("A", 1_100, 0).unwrap();
        assert_eq!(sample.latency_micros, -400);
        assert_eq!(c.latency_min(), -400);
        assert_eq!(c.latency_max(), 0);
    }

    #[test]
    fn test_min_max_sentinels_without_samples() {
        let c = Correlator::new();
        assert_eq!(c.latency_min(), i64::MAX);
        assert_eq!(c.latency_max(), 0);
    }

    #[test]
    fn test_min_max_track_samples() {
        let mut c = Correlator::new();
        for (key, lat) in [("a", 30), ("b", 7), ("c", 900)] {
            c.on_create(key, 0, 0);
            c.on_read(key, 0, lat);
        }
        assert_eq!(c.latency_min(), 7);
        assert_eq!(c.latency_max(), 900);
    }

    #[test]
    fn test_unmatched_creates_stay_pending() {
        let mut c = Correlator::new();
        c.on_create("A", 1, 1);
        c.on_create("B", 2, 2);
        assert_eq!(c.pending_count(), 2);

        let sample = c.on_read("B", 10, 0).unwrap();
        assert_eq!(sample.latency_micros, 6);
        assert_eq!(sample.time_offset_micros, 1);
        assert_eq!(c.pending_count(), 1);
    }

    #[test]
    fn test_extreme_timestamps_wrap() {
        let mut c = Correlator::new();
        c.on_create("A", i64::MIN + 10, 100);
        let sample = c.on_read("A", i64::MAX - 10, 50).unwrap();

        let expected = (i64::MAX - 10)
            .wrapping_add(50)
            .wrapping_sub(i64::MIN + 10)
            .wrapping_sub(100);
        assert_eq!(sample.latency_micros, expected);
        assert_eq!(sample.time_offset_micros, 0);
    }

    #[test]
    fn test_extreme_offset_wraps() {
        let mut c = Correlator::new();
        c.on_create("anchor", i64::MAX, 0);
        c.on_create("B", i64::MIN, 0);
        let sample = c.on_read("B", i64::MIN, 0).unwrap();
        assert_eq!(sample.time_offset_micros, i64::MIN.wrapping_sub(i64::MAX));
        assert_eq!(sample.latency_micros, 0);
    }

    #[test]
    fn test_ingest_dispatch() {
        let mut c = Correlator::new();
        let create = OpEvent::Create {
            item_key: "A".to_string(),
            start_time_micros: 100,
            duration_micros: 10,
        };
        let read = OpEvent::Read {
            item_key: "A".to_string(),
            start_time_micros: 500,
            read_latency_micros: 50,
        };
        assert!(c.ingest(create).is_none());
        let sample = c.ingest(read).unwrap();
        assert_eq!(sample.latency_micros, 440);
    }
}
