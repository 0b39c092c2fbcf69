//! Integration tests for lookup, write, eviction and invalidation.

use std::collections::HashMap;
use std::time::Duration;

use eval_cache::{
    CacheConfig, CacheOptions, EvaluationCache, FixedMemoryProbe, FixedSizeEstimator,
    InvalidationReason, ManualClock, MissReason, NodeId, NodeSignature,
};

const TTL: Duration = Duration::from_secs(60);

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Helper: a cache without background maintenance or memory pressure,
/// driven by a manual clock.
fn make_cache(capacity: usize) -> (EvaluationCache<String>, ManualClock) {
    init_logger();
    let clock = ManualClock::new();
    let config = CacheConfig::default()
        .with_max_cache_size(capacity)
        .with_ttl(TTL)
        .with_maintenance(false);
    let options = CacheOptions::<String>::default()
        .with_clock(clock.clone())
        .with_memory_probe(FixedMemoryProbe(0))
        .with_size_estimator(|v: &String| v.len());
    let cache = EvaluationCache::with_options(config, options).unwrap();
    (cache, clock)
}

fn sig(n: u64) -> NodeSignature {
    NodeSignature::from_raw(n)
}

#[test]
fn test_hit_after_write() {
    let (cache, _clock) = make_cache(16);
    let id = NodeId::new();

    cache.cache_result(id, "blurred frame".to_string(), sig(1));
    let lookup = cache.get_cached_result(id, sig(1));

    assert!(lookup.hit);
    assert_eq!(lookup.result.as_deref(), Some("blurred frame"));
    assert_eq!(lookup.estimated_size, "blurred frame".len());
    assert!(lookup.cached_at.is_some());
    assert!(lookup.miss_reason.is_none());
}

#[test]
fn test_unknown_node_is_not_cached() {
    let (cache, _clock) = make_cache(16);
    let lookup = cache.get_cached_result(NodeId::new(), sig(1));
    assert!(!lookup.hit);
    assert_eq!(lookup.miss_reason, Some(MissReason::NotCached));
}

#[test]
fn test_signature_mismatch_is_miss_and_drops_entry() {
    let (cache, _clock) = make_cache(16);
    let id = NodeId::new();
    cache.cache_result(id, "v1".to_string(), sig(1));

    let lookup = cache.get_cached_result(id, sig(2));
    assert!(!lookup.hit);
    assert_eq!(lookup.miss_reason, Some(MissReason::SignatureChanged));

    // the stale entry is gone, even for the original signature
    let again = cache.get_cached_result(id, sig(1));
    assert!(!again.hit);
    assert_eq!(again.miss_reason, Some(MissReason::NotCached));
    assert!(!cache.contains(id));
}

#[test]
fn test_refresh_replaces_signature() {
    let (cache, _clock) = make_cache(16);
    let id = NodeId::new();
    cache.cache_result(id, "old".to_string(), sig(1));
    cache.cache_result(id, "new".to_string(), sig(2));

    let lookup = cache.get_cached_result(id, sig(2));
    assert!(lookup.hit);
    assert_eq!(lookup.into_result().as_deref(), Some("new"));
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.get_statistics().memory_usage_bytes, 3);
}

#[test]
fn test_ttl_expiry() {
    let (cache, clock) = make_cache(16);
    let id = NodeId::new();
    cache.cache_result(id, "value".to_string(), sig(1));

    clock.advance(TTL - Duration::from_secs(1));
    assert!(cache.get_cached_result(id, sig(1)).hit);

    clock.advance(Duration::from_secs(2));
    let lookup = cache.get_cached_result(id, sig(1));
    assert!(!lookup.hit);
    assert_eq!(lookup.miss_reason, Some(MissReason::Expired));
    assert!(!cache.contains(id));
    assert_eq!(cache.get_statistics().expirations, 1);
}

#[test]
fn test_capacity_bound_evicts_least_recently_touched() {
    let capacity = 5;
    let extra = 3;
    let (cache, _clock) = make_cache(capacity);
    let ids: Vec<NodeId> = (0..capacity).map(|_| NodeId::new()).collect();
    for (i, id) in ids.iter().enumerate() {
        cache.cache_result(*id, format!("node {}", i), sig(i as u64));
    }
    // touch the first two so ids[2], ids[3], ids[4] become the oldest
    assert!(cache.get_cached_result(ids[0], sig(0)).hit);
    assert!(cache.get_cached_result(ids[1], sig(1)).hit);

    for i in 0..extra {
        cache.cache_result(NodeId::new(), format!("extra {}", i), sig(100 + i as u64));
        assert!(cache.len() <= capacity);
    }

    assert_eq!(cache.len(), capacity);
    assert!(cache.contains(ids[0]));
    assert!(cache.contains(ids[1]));
    for evicted in &ids[2..] {
        assert!(!cache.contains(*evicted));
    }
    let stats = cache.get_statistics();
    assert_eq!(stats.evictions, extra as u64);
    assert_eq!(stats.signature_count, capacity);
}

#[test]
fn test_lru_scenario_capacity_two() {
    let (cache, _clock) = make_cache(2);
    let (a, b, c, d) = (NodeId::new(), NodeId::new(), NodeId::new(), NodeId::new());

    cache.cache_result(a, "A".to_string(), sig(1));
    cache.cache_result(b, "B".to_string(), sig(2));
    cache.cache_result(c, "C".to_string(), sig(3));
    assert_eq!(cache.resident_nodes(), vec![c, b]);

    assert!(cache.get_cached_result(b, sig(2)).hit);
    cache.cache_result(d, "D".to_string(), sig(4));

    let mut resident = cache.resident_nodes();
    resident.sort();
    let mut expected = vec![b, d];
    expected.sort();
    assert_eq!(resident, expected);
}

#[test]
fn test_transitive_invalidation_chain() {
    let (cache, _clock) = make_cache(16);
    let (a, b, c, unrelated) = (NodeId::new(), NodeId::new(), NodeId::new(), NodeId::new());
    for (n, id) in [a, b, c, unrelated].iter().enumerate() {
        cache.cache_result(*id, format!("{}", n), sig(n as u64));
    }
    // C depends on B depends on A
    cache.add_dependency(a, b);
    cache.add_dependency(b, c);

    let visited = cache.invalidate_node_and_dependents(a, InvalidationReason::InputChanged);

    assert_eq!(visited, vec![a, b, c]);
    assert!(!cache.contains(a));
    assert!(!cache.contains(b));
    assert!(!cache.contains(c));
    assert!(cache.contains(unrelated));
    assert_eq!(cache.get_statistics().invalidations, 3);
}

#[test]
fn test_cycle_invalidation_terminates() {
    let (cache, _clock) = make_cache(16);
    let (x, y, z) = (NodeId::new(), NodeId::new(), NodeId::new());
    cache.cache_result(x, "x".to_string(), sig(1));
    cache.cache_result(y, "y".to_string(), sig(2));
    cache.cache_result(z, "z".to_string(), sig(3));
    cache.add_dependency(x, y);
    cache.add_dependency(y, x);

    let mut visited = cache.invalidate_node_and_dependents(x, InvalidationReason::TopologyChanged);
    visited.sort();
    let mut expected = vec![x, y];
    expected.sort();

    assert_eq!(visited, expected);
    assert!(!cache.contains(x));
    assert!(!cache.contains(y));
    assert!(cache.contains(z));
}

#[test]
fn test_invalidate_single_node_keeps_dependents() {
    let (cache, _clock) = make_cache(16);
    let (a, b) = (NodeId::new(), NodeId::new());
    cache.cache_result(a, "a".to_string(), sig(1));
    cache.cache_result(b, "b".to_string(), sig(2));
    cache.add_dependency(a, b);

    assert!(cache.invalidate_node(a, InvalidationReason::Manual));
    assert!(!cache.invalidate_node(a, InvalidationReason::Manual));
    assert!(cache.contains(b));
    assert_eq!(cache.dependents(a).len(), 1);
}

#[test]
fn test_remove_node_drops_entry_and_edges() {
    let (cache, _clock) = make_cache(16);
    let (a, b, c) = (NodeId::new(), NodeId::new(), NodeId::new());
    cache.cache_result(b, "b".to_string(), sig(2));
    cache.add_dependency(a, b);
    cache.add_dependency(b, c);

    cache.remove_node(b);

    assert!(!cache.contains(b));
    assert!(cache.dependents(a).is_empty());
    assert!(cache.dependents(b).is_empty());
    assert_eq!(cache.get_statistics().dependency_edges, 0);
}

#[test]
fn test_record_evaluation_is_readable() {
    let (cache, _clock) = make_cache(16);
    let id = NodeId::new();
    assert_eq!(cache.last_evaluation(id), None);
    cache.record_evaluation(id, sig(5));
    assert_eq!(cache.last_evaluation(id), Some(sig(5)));
}

#[test]
fn test_clear_cache_drops_everything() {
    let (cache, _clock) = make_cache(16);
    let (a, b) = (NodeId::new(), NodeId::new());
    cache.cache_result(a, "a".to_string(), sig(1));
    cache.cache_result(b, "b".to_string(), sig(2));
    cache.add_dependency(a, b);

    cache.clear_cache(InvalidationReason::Manual);

    assert!(cache.is_empty());
    let stats = cache.get_statistics();
    assert_eq!(stats.signature_count, 0);
    assert_eq!(stats.memory_usage_bytes, 0);
    assert_eq!(stats.dependency_edges, 0);
    assert!(!cache.get_cached_result(a, sig(1)).hit);
}

#[test]
fn test_prewarm_loads_all_entries() {
    let (cache, _clock) = make_cache(64);
    let entries: HashMap<NodeId, (String, NodeSignature)> = (0..32)
        .map(|i| (NodeId::new(), (format!("warm {}", i), sig(i))))
        .collect();
    let expected: Vec<(NodeId, NodeSignature)> =
        entries.iter().map(|(id, (_, s))| (*id, *s)).collect();

    cache.prewarm_cache(entries);

    assert_eq!(cache.len(), 32);
    for (id, signature) in expected {
        assert!(cache.get_cached_result(id, signature).hit);
    }
    let stats = cache.get_statistics();
    assert_eq!(stats.prewarmed, 32);
    assert_eq!(stats.writes, 32);
}

#[test]
fn test_statistics_track_hits_and_miss_reasons() {
    let (cache, clock) = make_cache(16);
    let (a, b) = (NodeId::new(), NodeId::new());
    cache.cache_result(a, "a".to_string(), sig(1));
    cache.cache_result(b, "b".to_string(), sig(1));

    cache.get_cached_result(a, sig(1));
    cache.get_cached_result(a, sig(1));
    cache.get_cached_result(a, sig(9));
    cache.get_cached_result(NodeId::new(), sig(1));
    clock.advance(TTL);
    cache.get_cached_result(b, sig(1));

    let stats = cache.get_statistics();
    assert_eq!(stats.hits, 2);
    assert_eq!(stats.misses, 3);
    assert!((stats.hit_rate - 0.4).abs() < 1e-9);
    assert_eq!(stats.miss_reasons.get("signature_changed"), Some(&1));
    assert_eq!(stats.miss_reasons.get("not_cached"), Some(&1));
    assert_eq!(stats.miss_reasons.get("expired"), Some(&1));
    assert!(stats.signature_validations >= 4);

    let json = stats.to_json().unwrap();
    assert!(json.contains("\"hit_rate\""));

    let performance = cache.get_performance_metrics();
    assert_eq!(performance.operation("hit").unwrap().count, 2);
    assert_eq!(performance.operation("write").unwrap().count, 2);
}

#[test]
fn test_reset_statistics_keeps_entries() {
    let (cache, _clock) = make_cache(16);
    let id = NodeId::new();
    cache.cache_result(id, "kept".to_string(), sig(1));
    cache.get_cached_result(id, sig(1));

    cache.reset_statistics();

    let stats = cache.get_statistics();
    assert_eq!(stats.hits, 0);
    assert_eq!(stats.writes, 0);
    assert_eq!(stats.entry_count, 1);
    assert!(cache.get_cached_result(id, sig(1)).hit);
}

#[test]
fn test_priority_report_orders_by_access() {
    let (cache, _clock) = make_cache(16);
    let (busy, idle) = (NodeId::new(), NodeId::new());
    cache.cache_result(idle, "idle".to_string(), sig(1));
    cache.cache_result(busy, "busy".to_string(), sig(2));
    cache.get_cached_result(busy, sig(2));
    cache.get_cached_result(busy, sig(2));

    let report = cache.get_cache_entries_by_priority();

    assert_eq!(report.len(), 2);
    assert_eq!(report[0].node_id, busy);
    assert_eq!(report[0].access_count, 3);
    assert_eq!(report[1].node_id, idle);
    assert_eq!(report[1].access_count, 1);
    assert!(report[0].priority > report[1].priority);
}

#[test]
fn test_aggressive_cleanup_under_memory_pressure() {
    init_logger();
    let config = CacheConfig::default()
        .with_max_cache_size(100)
        .with_memory_pressure_threshold(0.5)
        .with_maintenance(false);
    let options = CacheOptions::<String>::default()
        .with_memory_probe(FixedMemoryProbe(1000))
        .with_size_estimator(FixedSizeEstimator(100));
    let cache: EvaluationCache<String> = EvaluationCache::with_options(config, options).unwrap();

    let ids: Vec<NodeId> = (0..8).map(|_| NodeId::new()).collect();
    for (i, id) in ids.iter().enumerate() {
        cache.cache_result(*id, format!("{}", i), sig(i as u64));
    }

    // every write past 500 bytes tips the ratio over 0.5 and drops the oldest entry
    assert_eq!(cache.len(), 5);
    for dropped in &ids[..3] {
        assert!(!cache.contains(*dropped));
    }
    let info = cache.get_memory_pressure_info();
    assert_eq!(info.cache_memory_bytes, 500);
    assert_eq!(info.process_memory_bytes, 1000);
    assert!(!info.under_pressure);
    assert_eq!(info.pressure_events, 3);
    assert_eq!(info.aggressive_cleanups, 3);
    assert_eq!(info.entries_evicted_by_pressure, 3);
    assert_eq!(cache.get_statistics().signature_count, 5);
}

#[test]
fn test_invalid_config_is_rejected() {
    init_logger();
    let result = EvaluationCache::<String>::new(CacheConfig::default().with_max_cache_size(0));
    assert!(result.is_err());
    let result = EvaluationCache::<String>::new(CacheConfig::default().with_lock_shards(0));
    assert!(result.is_err());
}
