use std::collections::HashMap;

use crate::model::{NodeId, NodeSignature};

/// Last signature the cache validated against, per node.
///
/// Signature equality is the only thing that makes a cached result
/// reusable; the store only decides what stays resident.
#[derive(Debug, Default)]
pub struct SignatureIndex {
    signatures: HashMap<NodeId, NodeSignature>,
    validations: u64,
}

impl SignatureIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// True iff a signature is stored for `id` and equals `signature`.
    pub fn is_valid(&mut self, id: &NodeId, signature: &NodeSignature) -> bool {
        self.validations += 1;
        self.signatures.get(id) == Some(signature)
    }

    pub fn update(&mut self, id: NodeId, signature: NodeSignature) {
        self.signatures.insert(id, signature);
    }

    pub fn get(&self, id: &NodeId) -> Option<&NodeSignature> {
        self.signatures.get(id)
    }

    pub fn remove(&mut self, id: &NodeId) -> Option<NodeSignature> {
        self.signatures.remove(id)
    }

    pub fn clear(&mut self) {
        self.signatures.clear();
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }

    pub fn validations(&self) -> u64 {
        self.validations
    }

    /// Deferred re-validation run by the maintenance sweep: drops signatures
    /// whose node no longer has a resident entry. Returns how many were
    /// dropped.
    pub fn revalidate<F>(&mut self, is_resident: F) -> usize
    where
        F: Fn(&NodeId) -> bool,
    {
        let before = self.signatures.len();
        self.signatures.retain(|id, _| is_resident(id));
        before - self.signatures.len()
    }
}
