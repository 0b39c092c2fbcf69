//! Incremental evaluation cache for node graph runtimes.
//!
//! Node results are memoized per [`NodeId`], reused only while the node's
//! [`NodeSignature`] is unchanged and the entry is younger than the TTL, and
//! invalidated transitively along recorded dependency edges.

pub mod cache;
pub mod config;
pub mod error;
pub mod metrics;
pub mod model;
pub mod util;

pub use cache::{CacheLookup, CacheOptions, EvaluationCache};
pub use config::CacheConfig;
pub use error::{CacheError, CacheResult};
pub use metrics::{
    CacheStatistics, EntryPriority, FixedMemoryProbe, MaintenanceReport, MemoryPressureInfo,
    MemoryProbe, PerformanceMetrics, ProcessMemoryProbe,
};
pub use model::{
    CachedEntry, FixedSizeEstimator, InvalidationReason, MissReason, NodeId, NodeSignature,
    SizeEstimator,
};
pub use util::{Clock, ManualClock, SystemClock};
