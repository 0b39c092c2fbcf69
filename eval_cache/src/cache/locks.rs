use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Mutex, MutexGuard};

use crate::model::NodeId;

/// Per-node mutual exclusion over a fixed number of shards.
///
/// Each node hashes to one shard, so operations on the same node are always
/// serialized while most unrelated nodes land on different shards. The lock
/// count never grows with the number of nodes seen.
pub struct NodeLocks {
    shards: Box<[Mutex<()>]>,
}

impl NodeLocks {
    pub fn new(shard_count: usize) -> Self {
        let shards = (0..shard_count.max(1)).map(|_| Mutex::new(())).collect();
        Self { shards }
    }

    /// Hold the node's shard until the guard drops.
    ///
    /// The guarded data is `()`, so a poisoned shard carries no broken state
    /// and is simply reclaimed.
    pub fn lock(&self, id: &NodeId) -> MutexGuard<'_, ()> {
        self.shards[self.shard_index(id)]
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }

    pub fn shard_index(&self, id: &NodeId) -> usize {
        let mut hasher = DefaultHasher::new();
        id.hash(&mut hasher);
        (hasher.finish() % self.shards.len() as u64) as usize
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }
}
