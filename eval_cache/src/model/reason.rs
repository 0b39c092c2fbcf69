use std::fmt;

use serde::{Deserialize, Serialize};

/// Why a lookup did not produce a usable result.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MissReason {
    NotCached,
    SignatureChanged,
    Expired,
    /// An internal fault; the lookup degraded to a miss.
    Error,
}

impl MissReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            MissReason::NotCached => "not_cached",
            MissReason::SignatureChanged => "signature_changed",
            MissReason::Expired => "expired",
            MissReason::Error => "error",
        }
    }
}

impl fmt::Display for MissReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why entries were dropped from the cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum InvalidationReason {
    Manual,
    InputChanged,
    ParameterChanged,
    TopologyChanged,
    /// Propagated from an upstream node.
    DependencyChanged,
    SignatureMismatch,
    Expired,
    MemoryPressure,
    Shutdown,
}

impl InvalidationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvalidationReason::Manual => "manual",
            InvalidationReason::InputChanged => "input_changed",
            InvalidationReason::ParameterChanged => "parameter_changed",
            InvalidationReason::TopologyChanged => "topology_changed",
            InvalidationReason::DependencyChanged => "dependency_changed",
            InvalidationReason::SignatureMismatch => "signature_mismatch",
            InvalidationReason::Expired => "expired",
            InvalidationReason::MemoryPressure => "memory_pressure",
            InvalidationReason::Shutdown => "shutdown",
        }
    }
}

impl fmt::Display for InvalidationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
