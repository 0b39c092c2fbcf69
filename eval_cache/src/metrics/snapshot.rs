//! Read-only reports computed from the metrics collector and the stores.

use std::collections::BTreeMap;
use std::time::Duration;

use ordered_float::OrderedFloat;
use serde::Serialize;

use super::histogram::TimingSummary;
use crate::model::NodeId;

#[derive(Clone, Debug, Default, Serialize)]
pub struct CacheStatistics {
    pub entry_count: usize,
    pub capacity: usize,
    pub memory_usage_bytes: u64,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub writes: u64,
    pub write_failures: u64,
    pub invalidations: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub prewarmed: u64,
    /// Times a poisoned store lock was recovered by emptying the cache.
    pub lock_recoveries: u64,
    pub miss_reasons: BTreeMap<String, u64>,
    pub invalidation_reasons: BTreeMap<String, u64>,
    pub signature_count: usize,
    pub signature_validations: u64,
    pub dependency_nodes: usize,
    pub dependency_edges: usize,
}

impl CacheStatistics {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct PerformanceMetrics {
    /// Timing per operation kind, keyed by operation name.
    pub operations: BTreeMap<String, TimingSummary>,
    #[serde(rename = "since_reset_ms", serialize_with = "as_millis")]
    pub since_reset: Duration,
}

impl PerformanceMetrics {
    pub fn operation(&self, name: &str) -> Option<&TimingSummary> {
        self.operations.get(name)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct MemoryPressureInfo {
    pub cache_memory_bytes: u64,
    pub process_memory_bytes: u64,
    pub ratio: f64,
    pub threshold: f64,
    pub under_pressure: bool,
    pub pressure_events: u64,
    pub aggressive_cleanups: u64,
    pub entries_evicted_by_pressure: u64,
}

/// One row of the priority report.
#[derive(Clone, Debug, Serialize)]
pub struct EntryPriority {
    pub node_id: NodeId,
    pub priority: OrderedFloat<f64>,
    pub access_count: u64,
    #[serde(rename = "age_ms", serialize_with = "as_millis")]
    pub age: Duration,
    /// Time since the last hit or write.
    #[serde(rename = "idle_ms", serialize_with = "as_millis")]
    pub idle: Duration,
    pub size_bytes: usize,
}

/// What one maintenance sweep did.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MaintenanceReport {
    /// False when the sweep was skipped because the interval had not elapsed.
    pub ran: bool,
    pub expired: usize,
    pub orphaned_signatures: usize,
}

fn as_millis<S: serde::Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(value.as_millis() as u64)
}
