//! The evaluation cache facade.
//!
//! The engine calls [`EvaluationCache::get_cached_result`] before evaluating
//! a node and [`EvaluationCache::cache_result`] after a miss. Structural
//! changes are reported through the invalidation methods. Nothing on the hot
//! path returns an error: internal faults degrade to misses and are only
//! visible in the metrics.

pub mod dependency;
pub mod locks;
pub mod maintenance;
pub mod signature;
pub mod store;

use std::collections::{HashMap, HashSet, VecDeque};
use std::num::NonZeroUsize;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use ordered_float::OrderedFloat;
use rayon::prelude::*;

use crate::config::CacheConfig;
use crate::error::{CacheError, CacheResult};
use crate::metrics::pressure::pressure_ratio;
use crate::metrics::{
    self, CacheStatistics, EntryPriority, MaintenanceReport, MemoryPressureInfo, MemoryProbe,
    MetricsCollector, Operation, PerformanceMetrics, ProcessMemoryProbe,
};
use crate::model::{
    CachedEntry, FixedSizeEstimator, InvalidationReason, MissReason, NodeId, NodeSignature,
    SizeEstimator,
};
use crate::util::timing::ScopedTimer;
use crate::util::{Clock, SystemClock};
use dependency::DependencyTracker;
use locks::NodeLocks;
use maintenance::MaintenanceScheduler;
use signature::SignatureIndex;
use store::LruStore;

/// Pluggable collaborators of the cache.
pub struct CacheOptions<V> {
    pub size_estimator: Arc<dyn SizeEstimator<V>>,
    pub memory_probe: Arc<dyn MemoryProbe>,
    pub clock: Arc<dyn Clock>,
}

impl<V> Default for CacheOptions<V> {
    fn default() -> Self {
        Self {
            size_estimator: Arc::new(FixedSizeEstimator::default()),
            memory_probe: Arc::new(ProcessMemoryProbe::new()),
            clock: Arc::new(SystemClock),
        }
    }
}

impl<V> CacheOptions<V> {
    pub fn with_size_estimator(mut self, estimator: impl SizeEstimator<V> + 'static) -> Self {
        self.size_estimator = Arc::new(estimator);
        self
    }

    pub fn with_memory_probe(mut self, probe: impl MemoryProbe + 'static) -> Self {
        self.memory_probe = Arc::new(probe);
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }
}

/// Outcome of [`EvaluationCache::get_cached_result`].
#[derive(Clone, Debug)]
pub struct CacheLookup<V> {
    pub hit: bool,
    pub result: Option<V>,
    pub retrieval_time: Duration,
    pub cached_at: Option<Instant>,
    pub estimated_size: usize,
    pub miss_reason: Option<MissReason>,
}

impl<V> CacheLookup<V> {
    fn hit(result: V, cached_at: Instant, estimated_size: usize, retrieval_time: Duration) -> Self {
        Self {
            hit: true,
            result: Some(result),
            retrieval_time,
            cached_at: Some(cached_at),
            estimated_size,
            miss_reason: None,
        }
    }

    fn miss(reason: MissReason, retrieval_time: Duration) -> Self {
        Self {
            hit: false,
            result: None,
            retrieval_time,
            cached_at: None,
            estimated_size: 0,
            miss_reason: Some(reason),
        }
    }

    pub fn into_result(self) -> Option<V> {
        self.result
    }
}

struct Found<V> {
    result: V,
    cached_at: Instant,
    estimated_size: usize,
}

/// State shared between the facade and the maintenance thread.
pub(crate) struct CacheCore<V> {
    config: CacheConfig,
    store: Mutex<LruStore<V>>,
    signatures: Mutex<SignatureIndex>,
    dependencies: RwLock<DependencyTracker>,
    locks: NodeLocks,
    metrics: MetricsCollector,
    size_estimator: Arc<dyn SizeEstimator<V>>,
    memory_probe: Arc<dyn MemoryProbe>,
    clock: Arc<dyn Clock>,
    last_sweep: Mutex<Instant>,
}

impl<V: Clone> CacheCore<V> {
    /// Lock the store, then the signature index.
    ///
    /// A panic inside either critical section poisons its lock. Recovery
    /// drops every entry and signature together, so the two agree about
    /// residency again and later operations see a working, empty cache.
    fn lock_store_and_signatures(
        &self,
    ) -> (MutexGuard<'_, LruStore<V>>, MutexGuard<'_, SignatureIndex>) {
        let mut poisoned = false;
        let mut store = self.store.lock().unwrap_or_else(|e| {
            poisoned = true;
            e.into_inner()
        });
        let mut signatures = self.signatures.lock().unwrap_or_else(|e| {
            poisoned = true;
            e.into_inner()
        });
        if poisoned {
            warn!(
                "Cache store lock was poisoned; dropping {} entries to recover",
                store.len()
            );
            store.clear();
            signatures.clear();
            self.store.clear_poison();
            self.signatures.clear_poison();
            self.metrics.forget_all();
            self.metrics.record_recovery();
        }
        (store, signatures)
    }

    fn store(&self) -> MutexGuard<'_, LruStore<V>> {
        let (store, signatures) = self.lock_store_and_signatures();
        drop(signatures);
        store
    }

    /// Every path that mutates both the store and the signature index goes
    /// through here so the two never disagree about residency.
    fn with_store_and_signatures<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut LruStore<V>, &mut SignatureIndex) -> R,
    {
        let (mut store, mut signatures) = self.lock_store_and_signatures();
        f(&mut store, &mut signatures)
    }

    fn with_dependencies<F, R>(&self, f: F) -> CacheResult<R>
    where
        F: FnOnce(&DependencyTracker) -> R,
    {
        let deps = self
            .dependencies
            .read()
            .map_err(|_| CacheError::LockPoisoned("dependencies"))?;
        Ok(f(&deps))
    }

    fn with_dependencies_mut<F, R>(&self, f: F) -> CacheResult<R>
    where
        F: FnOnce(&mut DependencyTracker) -> R,
    {
        let mut deps = self
            .dependencies
            .write()
            .map_err(|_| CacheError::LockPoisoned("dependencies"))?;
        Ok(f(&mut deps))
    }

    /// Caller holds the node lock. `V::clone` runs inside the store critical
    /// section, so callers must be prepared for it to unwind.
    fn lookup(&self, id: &NodeId, signature: &NodeSignature) -> Result<Found<V>, MissReason> {
        let now = self.clock.now();
        let ttl = self.config.ttl;
        let (outcome, stale) = self.with_store_and_signatures(|store, signatures| {
            let Some(entry) = store.try_get(id) else {
                return (Err(MissReason::NotCached), None);
            };
            let reason = if !signatures.is_valid(id, signature) {
                MissReason::SignatureChanged
            } else if entry.is_expired(now, ttl) {
                MissReason::Expired
            } else {
                let found = Found {
                    result: entry.result.clone(),
                    cached_at: entry.cached_at,
                    estimated_size: entry.estimated_size,
                };
                return (Ok(found), None);
            };
            signatures.remove(id);
            (Err(reason), store.remove(id))
        });
        drop(stale);

        match outcome {
            Err(MissReason::SignatureChanged) => {
                self.metrics.forget([id]);
                self.metrics
                    .count_invalidation(InvalidationReason::SignatureMismatch, 1);
            }
            Err(MissReason::Expired) => {
                self.metrics.forget([id]);
                self.metrics.record_expirations(1);
            }
            _ => {}
        }
        outcome
    }

    /// Caller holds the node lock.
    fn store_result(&self, id: NodeId, result: V, signature: NodeSignature) {
        let size = self.size_estimator.estimate(&result);
        let entry = CachedEntry::new(result, signature, self.clock.now(), size);

        let (evicted, cache_bytes) = self.with_store_and_signatures(|store, signatures| {
            let evicted = store.put(id, entry);
            signatures.update(id, signature);
            if let Some((evicted_id, _)) = &evicted {
                signatures.remove(evicted_id);
            }
            (evicted, store.memory_usage())
        });

        if let Some((evicted_id, _)) = evicted {
            debug!("Evicted node {} to make room for {}", evicted_id, id);
            self.metrics.forget([&evicted_id]);
            self.metrics.record_evictions(1);
        }

        self.relieve_memory_pressure(cache_bytes);
    }

    fn relieve_memory_pressure(&self, cache_bytes: usize) {
        let process_bytes = self.memory_probe.process_memory();
        let ratio = pressure_ratio(cache_bytes as u64, process_bytes);
        if ratio <= self.config.memory_pressure_threshold {
            return;
        }

        let timer = ScopedTimer::debug("aggressive cleanup");
        info!(
            "Cache memory pressure {:.2} exceeds {:.2} ({} of {} bytes); evicting oldest entries",
            ratio, self.config.memory_pressure_threshold, cache_bytes, process_bytes
        );
        let fraction = self.config.aggressive_cleanup_fraction;
        let removed = self.with_store_and_signatures(|store, signatures| {
            let count = ((store.len() as f64 * fraction) as usize).max(1);
            let removed = store.remove_oldest_n(count);
            for (id, _) in &removed {
                signatures.remove(id);
            }
            removed
        });
        let removed: Vec<NodeId> = removed.into_iter().map(|(id, _)| id).collect();

        self.metrics.forget(&removed);
        self.metrics.record_aggressive_cleanup(removed.len(), timer.elapsed());
        debug!("Aggressive cleanup dropped {} entries", removed.len());
    }

    /// Drop one node from store and index. Caller holds the node lock.
    fn discard(&self, id: &NodeId) -> bool {
        let removed = self.with_store_and_signatures(|store, signatures| {
            signatures.remove(id);
            store.remove(id)
        });
        self.metrics.forget([id]);
        removed.is_some()
    }

    /// Every node reachable from `root` through dependents, root first.
    /// The visited set makes this terminate on cyclic graphs.
    fn collect_invalidation_set(&self, root: NodeId) -> CacheResult<Vec<NodeId>> {
        self.with_dependencies(|deps| {
            let mut visited = HashSet::from([root]);
            let mut order = vec![root];
            let mut queue = VecDeque::from([root]);
            while let Some(current) = queue.pop_front() {
                for dependent in deps.dependents(&current) {
                    if visited.insert(dependent) {
                        order.push(dependent);
                        queue.push_back(dependent);
                    }
                }
            }
            order
        })
    }

    /// Periodic entry point: sweeps only if a full interval has passed.
    fn maintenance_tick(&self) -> CacheResult<MaintenanceReport> {
        let now = self.clock.now();
        let last = *self
            .last_sweep
            .lock()
            .map_err(|_| CacheError::LockPoisoned("last_sweep"))?;
        if now.saturating_duration_since(last) < self.config.signature_validation_interval {
            return Ok(MaintenanceReport::default());
        }
        self.sweep()
    }

    /// Expire stale entries in batches, then drop orphaned signatures.
    ///
    /// Holds one node lock and a short store critical section per entry, so
    /// foreground traffic interleaves with a large sweep.
    fn sweep(&self) -> CacheResult<MaintenanceReport> {
        let timer = ScopedTimer::debug("maintenance sweep");
        let now = self.clock.now();
        let ttl = self.config.ttl;
        let candidates = self.store().expired_ids(now, ttl);

        let mut expired = Vec::new();
        for batch in candidates.chunks(self.config.sweep_batch_size) {
            for id in batch {
                let _guard = self.locks.lock(id);
                let removed = self.with_store_and_signatures(|store, signatures| {
                    // the entry may have been refreshed since the scan
                    if !store.peek(id).is_some_and(|e| e.is_expired(now, ttl)) {
                        return None;
                    }
                    signatures.remove(id);
                    store.remove(id)
                });
                if removed.is_some() {
                    expired.push(*id);
                }
            }
            std::thread::yield_now();
        }

        self.metrics.forget(&expired);
        self.metrics.record_expirations(expired.len());
        if !expired.is_empty() {
            self.metrics
                .count_invalidation(InvalidationReason::Expired, expired.len());
        }

        let orphaned_signatures = self.with_store_and_signatures(|store, signatures| {
            signatures.revalidate(|id| store.contains(id))
        });

        self.metrics.record(Operation::PeriodicCleanup, timer.elapsed());
        *self
            .last_sweep
            .lock()
            .map_err(|_| CacheError::LockPoisoned("last_sweep"))? = now;

        Ok(MaintenanceReport {
            ran: true,
            expired: expired.len(),
            orphaned_signatures,
        })
    }
}

/// Memoizes node results keyed by [`NodeId`] and validated by
/// [`NodeSignature`].
///
/// Cheap to share behind an `Arc`; every method takes `&self`. Operations on
/// the same node are serialized, operations on different nodes run in
/// parallel apart from the short store critical section.
pub struct EvaluationCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    core: Arc<CacheCore<V>>,
    scheduler: Mutex<Option<MaintenanceScheduler>>,
}

impl<V> EvaluationCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new(config: CacheConfig) -> CacheResult<Self> {
        Self::with_options(config, CacheOptions::default())
    }

    pub fn with_options(config: CacheConfig, options: CacheOptions<V>) -> CacheResult<Self> {
        config.validate()?;
        let capacity = NonZeroUsize::new(config.max_cache_size).ok_or_else(|| {
            CacheError::invalid_config("max_cache_size", "must be greater than zero")
        })?;

        let now = options.clock.now();
        let core = Arc::new(CacheCore {
            store: Mutex::new(LruStore::new(capacity)),
            signatures: Mutex::new(SignatureIndex::new()),
            dependencies: RwLock::new(DependencyTracker::new()),
            locks: NodeLocks::new(config.lock_shards),
            metrics: MetricsCollector::new(),
            size_estimator: options.size_estimator,
            memory_probe: options.memory_probe,
            clock: options.clock,
            last_sweep: Mutex::new(now),
            config,
        });

        let scheduler = if core.config.enable_maintenance {
            Some(MaintenanceScheduler::start(
                Arc::downgrade(&core),
                core.config.signature_validation_interval,
            )?)
        } else {
            None
        };

        info!(
            "Evaluation cache ready: capacity {}, ttl {:?}, {} lock shards",
            core.config.max_cache_size, core.config.ttl, core.config.lock_shards
        );
        Ok(Self {
            core,
            scheduler: Mutex::new(scheduler),
        })
    }

    pub fn config(&self) -> &CacheConfig {
        &self.core.config
    }

    /// Look up a node's result. A hit requires a resident entry, an equal
    /// signature and an age below the TTL; an invalid entry is dropped.
    pub fn get_cached_result(&self, id: NodeId, signature: NodeSignature) -> CacheLookup<V> {
        let timer = ScopedTimer::trace_lazy(|| format!("get_cached_result {}", id));
        let _guard = self.core.locks.lock(&id);

        let outcome =
            panic::catch_unwind(AssertUnwindSafe(|| self.core.lookup(&id, &signature)));
        match outcome {
            Ok(Ok(found)) => {
                let elapsed = timer.elapsed();
                self.core.metrics.record_hit(id, elapsed, self.core.clock.now());
                CacheLookup::hit(found.result, found.cached_at, found.estimated_size, elapsed)
            }
            Ok(Err(reason)) => {
                let elapsed = timer.elapsed();
                self.core.metrics.record_miss(reason, elapsed);
                CacheLookup::miss(reason, elapsed)
            }
            Err(_) => {
                warn!("Cache lookup for node {} panicked, treating as miss", id);
                let elapsed = timer.elapsed();
                self.core.metrics.record_miss(MissReason::Error, elapsed);
                CacheLookup::miss(MissReason::Error, elapsed)
            }
        }
    }

    /// Store a freshly computed result. Faults are counted and swallowed so
    /// the engine can always keep using the value it computed.
    pub fn cache_result(&self, id: NodeId, result: V, signature: NodeSignature) {
        let timer = ScopedTimer::trace_lazy(|| format!("cache_result {}", id));
        let _guard = self.core.locks.lock(&id);

        let stored = panic::catch_unwind(AssertUnwindSafe(|| {
            self.core.store_result(id, result, signature)
        }));
        match stored {
            Ok(()) => self
                .core
                .metrics
                .record_write(id, timer.elapsed(), self.core.clock.now()),
            Err(_) => {
                warn!("Caching the result of node {} panicked; result dropped", id);
                self.core.metrics.record(Operation::WriteFailure, timer.elapsed());
            }
        }
    }

    /// Drop one node's entry. Returns whether an entry was resident.
    pub fn invalidate_node(&self, id: NodeId, reason: InvalidationReason) -> bool {
        let timer = ScopedTimer::trace_lazy(|| format!("invalidate_node {}", id));
        let _guard = self.core.locks.lock(&id);

        let removed = self.core.discard(&id);
        self.core
            .metrics
            .record_invalidation(reason, removed as usize, timer.elapsed());
        removed
    }

    /// Drop `id` and every node that transitively depends on it. Terminates
    /// on cyclic graphs. Returns the visited nodes, root first.
    pub fn invalidate_node_and_dependents(
        &self,
        id: NodeId,
        reason: InvalidationReason,
    ) -> Vec<NodeId> {
        let timer =
            ScopedTimer::debug_lazy(|| format!("invalidate_node_and_dependents {}", id));
        let targets = match self.core.collect_invalidation_set(id) {
            Ok(targets) => targets,
            Err(e) => {
                warn!("Dependency lookup for node {} failed, invalidating it alone: {}", id, e);
                vec![id]
            }
        };

        let mut removed = 0;
        for node in &targets {
            // one node lock at a time, never nested
            let _guard = self.core.locks.lock(node);
            if self.core.discard(node) {
                removed += 1;
            }
        }

        debug!(
            "Invalidated {} of {} nodes reachable from {} ({})",
            removed,
            targets.len(),
            id,
            reason
        );
        self.core
            .metrics
            .record_invalidation(reason, removed, timer.elapsed());
        targets
    }

    /// Drop every entry, signature and dependency edge.
    pub fn clear_cache(&self, reason: InvalidationReason) {
        let timer = ScopedTimer::debug("clear_cache");
        let cleared = self.core.with_store_and_signatures(|store, signatures| {
            let count = store.len();
            store.clear();
            signatures.clear();
            count
        });
        if let Err(e) = self.core.with_dependencies_mut(DependencyTracker::clear) {
            warn!("Failed to clear dependency graph: {}", e);
        }

        self.core.metrics.forget_all();
        self.core.metrics.record(Operation::Clear, timer.elapsed());
        self.core.metrics.count_invalidation(reason, cleared);
        info!("Cleared {} cached entries ({})", cleared, reason);
    }

    /// Bulk-load results, e.g. from a previous evaluation pass. Entries are
    /// written in parallel, each under its own node lock.
    pub fn prewarm_cache(&self, entries: HashMap<NodeId, (V, NodeSignature)>) {
        let timer = ScopedTimer::debug("prewarm_cache");
        let count = entries.len();
        entries
            .into_par_iter()
            .for_each(|(id, (result, signature))| self.cache_result(id, result, signature));
        self.core.metrics.record_prewarm(count, timer.elapsed());
    }

    /// Record that `consumer` reads the output of `producer`.
    pub fn add_dependency(&self, producer: NodeId, consumer: NodeId) {
        if let Err(e) = self
            .core
            .with_dependencies_mut(|deps| deps.add_dependency(producer, consumer))
        {
            warn!("Failed to record dependency {} -> {}: {}", producer, consumer, e);
        }
    }

    pub fn remove_dependency(&self, producer: NodeId, consumer: NodeId) {
        if let Err(e) = self
            .core
            .with_dependencies_mut(|deps| deps.remove_dependency(&producer, &consumer))
        {
            warn!("Failed to remove dependency {} -> {}: {}", producer, consumer, e);
        }
    }

    /// Forget a node that left the graph: its entry and all its edges.
    pub fn remove_node(&self, id: NodeId) {
        self.invalidate_node(id, InvalidationReason::TopologyChanged);
        if let Err(e) = self.core.with_dependencies_mut(|deps| deps.remove(&id)) {
            warn!("Failed to remove node {} from dependency graph: {}", id, e);
        }
    }

    pub fn record_evaluation(&self, id: NodeId, signature: NodeSignature) {
        if let Err(e) = self
            .core
            .with_dependencies_mut(|deps| deps.record_evaluation(id, signature))
        {
            warn!("Failed to record evaluation of {}: {}", id, e);
        }
    }

    pub fn last_evaluation(&self, id: NodeId) -> Option<NodeSignature> {
        self.core
            .with_dependencies(|deps| deps.last_evaluation(&id))
            .ok()
            .flatten()
    }

    /// Direct dependents of `id`.
    pub fn dependents(&self, id: NodeId) -> HashSet<NodeId> {
        self.core
            .with_dependencies(|deps| deps.dependents(&id))
            .unwrap_or_default()
    }

    /// Whether `id` has a resident entry, regardless of its validity.
    pub fn contains(&self, id: NodeId) -> bool {
        self.core.store().contains(&id)
    }

    pub fn len(&self) -> usize {
        self.core.store().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resident node ids, most recently used first.
    pub fn resident_nodes(&self) -> Vec<NodeId> {
        self.core.store().ids()
    }

    pub fn get_statistics(&self) -> CacheStatistics {
        let counters = self.core.metrics.counters();
        let mut stats = CacheStatistics {
            hits: counters.hits,
            misses: counters.misses,
            writes: counters.writes,
            write_failures: counters.write_failures,
            invalidations: counters.invalidations,
            evictions: counters.evictions,
            expirations: counters.expirations,
            prewarmed: counters.prewarmed,
            lock_recoveries: counters.lock_recoveries,
            miss_reasons: counters.miss_reasons,
            invalidation_reasons: counters.invalidation_reasons,
            ..Default::default()
        };
        let lookups = stats.hits + stats.misses;
        if lookups > 0 {
            stats.hit_rate = stats.hits as f64 / lookups as f64;
        }

        self.core.with_store_and_signatures(|store, signatures| {
            stats.entry_count = store.len();
            stats.capacity = store.capacity();
            stats.memory_usage_bytes = store.memory_usage() as u64;
            stats.signature_count = signatures.len();
            stats.signature_validations = signatures.validations();
        });
        if let Ok((nodes, edges)) = self
            .core
            .with_dependencies(|deps| (deps.node_count(), deps.edge_count()))
        {
            stats.dependency_nodes = nodes;
            stats.dependency_edges = edges;
        }
        stats
    }

    pub fn get_performance_metrics(&self) -> PerformanceMetrics {
        self.core.metrics.performance()
    }

    pub fn get_memory_pressure_info(&self) -> MemoryPressureInfo {
        let cache_bytes = self.core.store().memory_usage() as u64;
        let process_bytes = self.core.memory_probe.process_memory();
        let ratio = pressure_ratio(cache_bytes, process_bytes);
        let counters = self.core.metrics.counters();
        MemoryPressureInfo {
            cache_memory_bytes: cache_bytes,
            process_memory_bytes: process_bytes,
            ratio,
            threshold: self.core.config.memory_pressure_threshold,
            under_pressure: ratio > self.core.config.memory_pressure_threshold,
            pressure_events: counters.pressure_events,
            aggressive_cleanups: counters.aggressive_cleanups,
            entries_evicted_by_pressure: counters.pressure_evictions,
        }
    }

    /// Resident entries ranked by [`metrics::priority`], highest first.
    pub fn get_cache_entries_by_priority(&self) -> Vec<EntryPriority> {
        let now = self.core.clock.now();
        let resident: Vec<(NodeId, Duration, usize)> = self
            .core
            .store()
            .iter()
            .map(|(id, entry)| (*id, entry.age(now), entry.estimated_size))
            .collect();

        let mut ranked: Vec<EntryPriority> = resident
            .into_iter()
            .map(|(node_id, age, size_bytes)| {
                let (access_count, idle) = match self.core.metrics.access_stats(&node_id) {
                    Some(stats) => (
                        stats.access_count,
                        now.saturating_duration_since(stats.last_access),
                    ),
                    None => (0, age),
                };
                EntryPriority {
                    node_id,
                    priority: OrderedFloat(metrics::priority(access_count, age, size_bytes)),
                    access_count,
                    age,
                    idle,
                    size_bytes,
                }
            })
            .collect();
        ranked.sort_by(|a, b| b.priority.cmp(&a.priority));
        ranked
    }

    /// Zero all counters. Cached entries and signatures are kept.
    pub fn reset_statistics(&self) {
        self.core.metrics.reset();
    }

    /// Run one expiry sweep now, regardless of the timer.
    pub fn run_maintenance(&self) -> MaintenanceReport {
        match self.core.sweep() {
            Ok(report) => report,
            Err(e) => {
                warn!("Maintenance sweep failed: {}", e);
                MaintenanceReport::default()
            }
        }
    }

    /// Stop background maintenance. Safe to call more than once; the cache
    /// stays usable afterwards.
    pub fn dispose(&self) {
        let scheduler = self
            .scheduler
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(scheduler) = scheduler {
            scheduler.stop();
            info!("Evaluation cache maintenance stopped");
        }
    }
}

impl<V> Drop for EvaluationCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn drop(&mut self) {
        self.dispose();
    }
}
