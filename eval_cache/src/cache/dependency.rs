//! Reverse adjacency of the evaluation graph, used for invalidation fan-out.
//!
//! Edges are reported by the engine as it evaluates (`consumer` read the
//! output of `producer`). The tracker never decides evaluation order.

use std::collections::{HashMap, HashSet};

use crate::model::{NodeId, NodeSignature};

#[derive(Debug, Default)]
pub struct DependencyTracker {
    /// producer -> nodes that read its output
    dependents: HashMap<NodeId, HashSet<NodeId>>,
    /// consumer -> nodes it reads from
    producers: HashMap<NodeId, HashSet<NodeId>>,
    evaluations: HashMap<NodeId, NodeSignature>,
}

impl DependencyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `consumer` reads the output of `producer`. Self edges are
    /// ignored. Returns false if the edge was already known.
    pub fn add_dependency(&mut self, producer: NodeId, consumer: NodeId) -> bool {
        if producer == consumer {
            return false;
        }
        let inserted = self.dependents.entry(producer).or_default().insert(consumer);
        self.producers.entry(consumer).or_default().insert(producer);
        inserted
    }

    pub fn remove_dependency(&mut self, producer: &NodeId, consumer: &NodeId) -> bool {
        let removed = remove_from_row(&mut self.dependents, producer, consumer);
        remove_from_row(&mut self.producers, consumer, producer);
        removed
    }

    /// Remember the signature `id` was last evaluated with.
    pub fn record_evaluation(&mut self, id: NodeId, signature: NodeSignature) {
        self.evaluations.insert(id, signature);
    }

    pub fn last_evaluation(&self, id: &NodeId) -> Option<NodeSignature> {
        self.evaluations.get(id).copied()
    }

    /// Direct dependents of `id`, copied out so callers can hold them
    /// without keeping the tracker locked.
    pub fn dependents(&self, id: &NodeId) -> HashSet<NodeId> {
        self.dependents.get(id).cloned().unwrap_or_default()
    }

    pub fn producers(&self, id: &NodeId) -> HashSet<NodeId> {
        self.producers.get(id).cloned().unwrap_or_default()
    }

    /// Forget a node entirely: its own rows and every edge touching it.
    pub fn remove(&mut self, id: &NodeId) {
        if let Some(consumers) = self.dependents.remove(id) {
            for consumer in consumers {
                remove_from_row(&mut self.producers, &consumer, id);
            }
        }
        if let Some(producers) = self.producers.remove(id) {
            for producer in producers {
                remove_from_row(&mut self.dependents, &producer, id);
            }
        }
        self.evaluations.remove(id);
    }

    pub fn clear(&mut self) {
        self.dependents.clear();
        self.producers.clear();
        self.evaluations.clear();
    }

    /// Number of nodes that appear on either end of an edge.
    pub fn node_count(&self) -> usize {
        self.dependents
            .keys()
            .chain(self.producers.keys())
            .collect::<HashSet<_>>()
            .len()
    }

    pub fn edge_count(&self) -> usize {
        self.dependents.values().map(HashSet::len).sum()
    }
}

fn remove_from_row(
    rows: &mut HashMap<NodeId, HashSet<NodeId>>,
    key: &NodeId,
    value: &NodeId,
) -> bool {
    let Some(row) = rows.get_mut(key) else {
        return false;
    };
    let removed = row.remove(value);
    if row.is_empty() {
        rows.remove(key);
    }
    removed
}
