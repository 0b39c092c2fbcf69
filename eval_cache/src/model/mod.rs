pub mod entry;
pub mod node;
pub mod reason;

pub use entry::{CachedEntry, FixedSizeEstimator, SizeEstimator, DEFAULT_ENTRY_SIZE};
pub use node::{NodeId, NodeSignature};
pub use reason::{InvalidationReason, MissReason};
