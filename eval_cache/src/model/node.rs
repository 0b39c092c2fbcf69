//! Node identity and signatures as seen by the cache.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a node in the evaluation graph.
///
/// The cache never allocates ids on its own behalf; the engine passes the id
/// of the node it is about to evaluate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(Uuid);

impl NodeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for NodeId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Fingerprint of everything that can change a node's output: its inputs,
/// its parameters and the topology version it was evaluated against.
///
/// Two signatures compare equal iff re-evaluating the node would produce the
/// same result. The cache only ever compares them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeSignature(u64);

impl NodeSignature {
    pub fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// Fingerprint any hashable description of the node state.
    pub fn from_hash<T: Hash + ?Sized>(state: &T) -> Self {
        let mut hasher = DefaultHasher::new();
        state.hash(&mut hasher);
        Self(hasher.finish())
    }

    /// Combine separately computed input, parameter and topology hashes.
    pub fn from_parts(inputs: u64, parameters: u64, topology_version: u64) -> Self {
        Self::from_hash(&(inputs, parameters, topology_version))
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}
