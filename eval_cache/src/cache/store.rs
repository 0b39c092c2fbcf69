//! Bounded recency-ordered store of cached node results.

use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use lru::LruCache;

use crate::model::{CachedEntry, NodeId};

/// Fixed-capacity map from node to cached entry, evicting the least recently
/// used entry when full. Keeps a running total of estimated entry sizes.
///
/// Not synchronized; the cache wraps it in a single mutex because every
/// access reorders the shared recency list.
pub struct LruStore<V> {
    entries: LruCache<NodeId, CachedEntry<V>>,
    memory_usage: usize,
}

impl<V> LruStore<V> {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: LruCache::new(capacity),
            memory_usage: 0,
        }
    }

    /// Look up an entry and mark it most recently used.
    pub fn try_get(&mut self, id: &NodeId) -> Option<&CachedEntry<V>> {
        self.entries.get(id)
    }

    /// Look up an entry without touching recency.
    pub fn peek(&self, id: &NodeId) -> Option<&CachedEntry<V>> {
        self.entries.peek(id)
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.entries.contains(id)
    }

    /// Insert or replace, promoting to most recently used. Returns the entry
    /// evicted to make room, if any.
    pub fn put(&mut self, id: NodeId, entry: CachedEntry<V>) -> Option<(NodeId, CachedEntry<V>)> {
        let added = entry.estimated_size;
        if let Some(previous) = self.entries.peek_mut(&id) {
            let replaced = std::mem::replace(previous, entry);
            self.memory_usage = self.memory_usage.saturating_sub(replaced.estimated_size) + added;
            self.entries.promote(&id);
            return None;
        }

        let evicted = if self.entries.len() >= self.entries.cap().get() {
            self.remove_oldest()
        } else {
            None
        };
        self.entries.put(id, entry);
        self.memory_usage += added;
        evicted
    }

    pub fn remove(&mut self, id: &NodeId) -> Option<CachedEntry<V>> {
        let removed = self.entries.pop(id)?;
        self.memory_usage = self.memory_usage.saturating_sub(removed.estimated_size);
        Some(removed)
    }

    pub fn remove_oldest(&mut self) -> Option<(NodeId, CachedEntry<V>)> {
        let (id, removed) = self.entries.pop_lru()?;
        self.memory_usage = self.memory_usage.saturating_sub(removed.estimated_size);
        Some((id, removed))
    }

    /// Remove up to `count` entries, least recently used first.
    pub fn remove_oldest_n(&mut self, count: usize) -> Vec<(NodeId, CachedEntry<V>)> {
        let mut removed = Vec::with_capacity(count.min(self.entries.len()));
        for _ in 0..count {
            match self.remove_oldest() {
                Some(pair) => removed.push(pair),
                None => break,
            }
        }
        removed
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.memory_usage = 0;
    }

    pub fn memory_usage(&self) -> usize {
        self.memory_usage
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }

    /// Ids of entries whose age has reached `ttl`, oldest recency first.
    pub fn expired_ids(&self, now: Instant, ttl: Duration) -> Vec<NodeId> {
        self.entries
            .iter()
            .rev()
            .filter(|(_, entry)| entry.is_expired(now, ttl))
            .map(|(id, _)| *id)
            .collect()
    }

    /// Ids in recency order, most recently used first.
    pub fn ids(&self) -> Vec<NodeId> {
        self.entries.iter().map(|(id, _)| *id).collect()
    }

    /// Iterate entries from most to least recently used without promoting.
    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, &CachedEntry<V>)> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeSignature;

    fn entry(size: usize) -> CachedEntry<&'static str> {
        CachedEntry::new("value", NodeSignature::from_raw(1), Instant::now(), size)
    }

    fn store(capacity: usize) -> LruStore<&'static str> {
        LruStore::new(NonZeroUsize::new(capacity).unwrap())
    }

    #[test]
    fn test_put_evicts_least_recently_used() {
        let mut store = store(2);
        let (a, b, c) = (NodeId::new(), NodeId::new(), NodeId::new());
        assert!(store.put(a, entry(10)).is_none());
        assert!(store.put(b, entry(20)).is_none());
        store.try_get(&a);

        let (evicted, _) = store.put(c, entry(30)).expect("b should be evicted");
        assert_eq!(evicted, b);
        assert!(store.contains(&a));
        assert!(store.contains(&c));
        assert_eq!(store.memory_usage(), 40);
    }

    #[test]
    fn test_replace_updates_memory_and_promotes() {
        let mut store = store(2);
        let (a, b, c) = (NodeId::new(), NodeId::new(), NodeId::new());
        store.put(a, entry(10));
        store.put(b, entry(10));
        assert!(store.put(a, entry(50)).is_none());
        assert_eq!(store.len(), 2);
        assert_eq!(store.memory_usage(), 60);

        let (evicted, _) = store.put(c, entry(1)).unwrap();
        assert_eq!(evicted, b);
    }

    #[test]
    fn test_remove_and_clear_track_memory() {
        let mut store = store(4);
        let ids: Vec<NodeId> = (0..4).map(|_| NodeId::new()).collect();
        for id in &ids {
            store.put(*id, entry(8));
        }
        assert_eq!(store.memory_usage(), 32);

        assert!(store.remove(&ids[1]).is_some());
        assert!(store.remove(&ids[1]).is_none());
        assert_eq!(store.memory_usage(), 24);

        let oldest = store.remove_oldest_n(2);
        assert_eq!(oldest.iter().map(|(id, _)| *id).collect::<Vec<_>>(), vec![ids[0], ids[2]]);
        assert_eq!(store.memory_usage(), 8);

        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.memory_usage(), 0);
    }

    #[test]
    fn test_expired_ids_respects_ttl() {
        let mut store = store(4);
        let now = Instant::now();
        let (old, fresh) = (NodeId::new(), NodeId::new());
        store.put(old, CachedEntry::new("a", NodeSignature::from_raw(1), now, 1));
        let later = now + Duration::from_secs(5);
        store.put(fresh, CachedEntry::new("b", NodeSignature::from_raw(1), later, 1));

        let expired = store.expired_ids(now + Duration::from_secs(6), Duration::from_secs(3));
        assert_eq!(expired, vec![old]);
    }
}
