//! Counters, timing histograms and per-node access statistics.

pub mod histogram;
pub mod pressure;
pub mod snapshot;

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::model::{InvalidationReason, MissReason, NodeId};
use histogram::TimingHistogram;
pub use histogram::TimingSummary;
pub use pressure::{FixedMemoryProbe, MemoryProbe, ProcessMemoryProbe};
pub use snapshot::{
    CacheStatistics, EntryPriority, MaintenanceReport, MemoryPressureInfo, PerformanceMetrics,
};

/// Kinds of timed operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    Hit,
    Miss,
    Write,
    WriteFailure,
    Invalidation,
    Clear,
    Prewarm,
    PeriodicCleanup,
    AggressiveCleanup,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Hit => "hit",
            Operation::Miss => "miss",
            Operation::Write => "write",
            Operation::WriteFailure => "write_failure",
            Operation::Invalidation => "invalidation",
            Operation::Clear => "clear",
            Operation::Prewarm => "prewarm",
            Operation::PeriodicCleanup => "periodic_cleanup",
            Operation::AggressiveCleanup => "aggressive_cleanup",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AccessStats {
    pub access_count: u64,
    pub last_access: Instant,
}

/// Counters that are not tied to a timed operation.
#[derive(Clone, Debug, Default)]
pub struct MetricsCounters {
    pub hits: u64,
    pub misses: u64,
    pub writes: u64,
    pub write_failures: u64,
    pub invalidations: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub prewarmed: u64,
    pub pressure_events: u64,
    pub aggressive_cleanups: u64,
    pub pressure_evictions: u64,
    pub lock_recoveries: u64,
    pub miss_reasons: BTreeMap<String, u64>,
    pub invalidation_reasons: BTreeMap<String, u64>,
}

struct MetricsState {
    timings: HashMap<Operation, TimingHistogram>,
    miss_reasons: HashMap<MissReason, u64>,
    invalidation_reasons: HashMap<InvalidationReason, u64>,
    invalidated_entries: u64,
    evictions: u64,
    expirations: u64,
    prewarmed: u64,
    pressure_events: u64,
    pressure_evictions: u64,
    lock_recoveries: u64,
    access: HashMap<NodeId, AccessStats>,
    since: Instant,
}

impl MetricsState {
    fn new() -> Self {
        Self {
            timings: HashMap::new(),
            miss_reasons: HashMap::new(),
            invalidation_reasons: HashMap::new(),
            invalidated_entries: 0,
            evictions: 0,
            expirations: 0,
            prewarmed: 0,
            pressure_events: 0,
            pressure_evictions: 0,
            lock_recoveries: 0,
            access: HashMap::new(),
            since: Instant::now(),
        }
    }

    fn time(&mut self, operation: Operation, elapsed: Duration) {
        self.timings.entry(operation).or_default().record(elapsed);
    }

    fn count(&self, operation: Operation) -> u64 {
        self.timings.get(&operation).map_or(0, TimingHistogram::count)
    }

    fn count_invalidation(&mut self, reason: InvalidationReason, entries: usize) {
        *self.invalidation_reasons.entry(reason).or_default() += 1;
        self.invalidated_entries += entries as u64;
    }

    fn touch(&mut self, id: NodeId, now: Instant) {
        let stats = self.access.entry(id).or_insert(AccessStats {
            access_count: 0,
            last_access: now,
        });
        stats.access_count += 1;
        stats.last_access = now;
    }
}

/// Thread-safe metrics sink shared by every cache operation.
///
/// Recording never fails: a poisoned lock is recovered since the counters
/// are diagnostic only.
pub struct MetricsCollector {
    state: Mutex<MetricsState>,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MetricsState::new()),
        }
    }

    fn state(&self) -> MutexGuard<'_, MetricsState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn record(&self, operation: Operation, elapsed: Duration) {
        self.state().time(operation, elapsed);
    }

    pub fn record_hit(&self, id: NodeId, elapsed: Duration, now: Instant) {
        let mut state = self.state();
        state.time(Operation::Hit, elapsed);
        state.touch(id, now);
    }

    pub fn record_miss(&self, reason: MissReason, elapsed: Duration) {
        let mut state = self.state();
        state.time(Operation::Miss, elapsed);
        *state.miss_reasons.entry(reason).or_default() += 1;
    }

    pub fn record_write(&self, id: NodeId, elapsed: Duration, now: Instant) {
        let mut state = self.state();
        state.time(Operation::Write, elapsed);
        state.touch(id, now);
    }

    pub fn record_invalidation(
        &self,
        reason: InvalidationReason,
        entries: usize,
        elapsed: Duration,
    ) {
        let mut state = self.state();
        state.time(Operation::Invalidation, elapsed);
        state.count_invalidation(reason, entries);
    }

    /// Count an invalidation that happened as a side effect of another
    /// operation. No timing sample is taken.
    pub fn count_invalidation(&self, reason: InvalidationReason, entries: usize) {
        self.state().count_invalidation(reason, entries);
    }

    pub fn record_prewarm(&self, entries: usize, elapsed: Duration) {
        let mut state = self.state();
        state.time(Operation::Prewarm, elapsed);
        state.prewarmed += entries as u64;
    }

    pub fn record_evictions(&self, count: usize) {
        if count > 0 {
            self.state().evictions += count as u64;
        }
    }

    pub fn record_expirations(&self, count: usize) {
        if count > 0 {
            self.state().expirations += count as u64;
        }
    }

    pub fn record_aggressive_cleanup(&self, evicted: usize, elapsed: Duration) {
        let mut state = self.state();
        state.time(Operation::AggressiveCleanup, elapsed);
        state.pressure_events += 1;
        state.pressure_evictions += evicted as u64;
    }

    /// A poisoned store lock was recovered by emptying the cache.
    pub fn record_recovery(&self) {
        self.state().lock_recoveries += 1;
    }

    /// Drop access statistics for nodes that left the cache.
    pub fn forget<'a>(&self, ids: impl IntoIterator<Item = &'a NodeId>) {
        let mut state = self.state();
        for id in ids {
            state.access.remove(id);
        }
    }

    pub fn forget_all(&self) {
        self.state().access.clear();
    }

    pub fn access_stats(&self, id: &NodeId) -> Option<AccessStats> {
        self.state().access.get(id).copied()
    }

    pub fn counters(&self) -> MetricsCounters {
        let state = self.state();
        MetricsCounters {
            hits: state.count(Operation::Hit),
            misses: state.count(Operation::Miss),
            writes: state.count(Operation::Write),
            write_failures: state.count(Operation::WriteFailure),
            invalidations: state.invalidated_entries,
            evictions: state.evictions,
            expirations: state.expirations,
            prewarmed: state.prewarmed,
            pressure_events: state.pressure_events,
            aggressive_cleanups: state.count(Operation::AggressiveCleanup),
            pressure_evictions: state.pressure_evictions,
            lock_recoveries: state.lock_recoveries,
            miss_reasons: state
                .miss_reasons
                .iter()
                .map(|(reason, n)| (reason.to_string(), *n))
                .collect(),
            invalidation_reasons: state
                .invalidation_reasons
                .iter()
                .map(|(reason, n)| (reason.to_string(), *n))
                .collect(),
        }
    }

    pub fn performance(&self) -> PerformanceMetrics {
        let state = self.state();
        PerformanceMetrics {
            operations: state
                .timings
                .iter()
                .map(|(operation, histogram)| (operation.to_string(), histogram.summary()))
                .collect(),
            since_reset: state.since.elapsed(),
        }
    }

    /// Zero every counter and histogram. Cache contents are not touched.
    pub fn reset(&self) {
        *self.state() = MetricsState::new();
    }
}

/// Ranking score for the priority report. Frequently used, young and small
/// entries rank highest. Eviction itself stays strictly LRU.
pub fn priority(access_count: u64, age: Duration, size_bytes: usize) -> f64 {
    let age_minutes = age.as_secs_f64() / 60.0;
    let size_kb = size_bytes as f64 / 1024.0;
    access_count as f64 * 10.0 + (100.0 - age_minutes).max(0.0) - size_kb
}
