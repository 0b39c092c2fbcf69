//! Cached entries and result size estimation.

use std::time::{Duration, Instant};

use super::node::NodeSignature;

/// Default size charged for a result when the caller gives no better estimate.
pub const DEFAULT_ENTRY_SIZE: usize = 1024;

/// A memoized node result together with the signature it was computed under.
#[derive(Clone, Debug)]
pub struct CachedEntry<V> {
    pub result: V,
    pub signature: NodeSignature,
    pub cached_at: Instant,
    pub estimated_size: usize,
}

impl<V> CachedEntry<V> {
    pub fn new(
        result: V,
        signature: NodeSignature,
        cached_at: Instant,
        estimated_size: usize,
    ) -> Self {
        Self {
            result,
            signature,
            cached_at,
            estimated_size,
        }
    }

    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.cached_at)
    }

    /// An entry stays valid while its age is strictly below the TTL.
    pub fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        self.age(now) >= ttl
    }
}

/// Estimates how many bytes a cached result occupies.
///
/// Used for memory accounting and the pressure ratio. Engines that know the
/// shape of their values should supply an exact estimator.
pub trait SizeEstimator<V>: Send + Sync {
    fn estimate(&self, value: &V) -> usize;
}

/// Charges the same size for every value.
#[derive(Clone, Copy, Debug)]
pub struct FixedSizeEstimator(pub usize);

impl Default for FixedSizeEstimator {
    fn default() -> Self {
        Self(DEFAULT_ENTRY_SIZE)
    }
}

impl<V> SizeEstimator<V> for FixedSizeEstimator {
    fn estimate(&self, _value: &V) -> usize {
        self.0
    }
}

impl<V, F> SizeEstimator<V> for F
where
    F: Fn(&V) -> usize + Send + Sync,
{
    fn estimate(&self, value: &V) -> usize {
        self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_expires_at_ttl_boundary() {
        let start = Instant::now();
        let entry = CachedEntry::new(1u32, NodeSignature::from_raw(7), start, 4);
        let ttl = Duration::from_secs(10);
        assert!(!entry.is_expired(start + Duration::from_secs(9), ttl));
        assert!(entry.is_expired(start + ttl, ttl));
    }

    #[test]
    fn test_closure_estimator() {
        let estimator = |v: &Vec<u8>| v.len();
        assert_eq!(SizeEstimator::estimate(&estimator, &vec![0u8; 42]), 42);
        let estimator = FixedSizeEstimator::default();
        assert_eq!(
            SizeEstimator::<String>::estimate(&estimator, &String::new()),
            DEFAULT_ENTRY_SIZE
        );
    }
}
