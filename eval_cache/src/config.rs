//! Cache configuration.
//!
//! Durations are stored as milliseconds in JSON so configuration files stay
//! readable (`"ttl_ms": 300000`).

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CacheError, CacheResult};

pub const DEFAULT_MAX_CACHE_SIZE: usize = 10_000;
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);
pub const DEFAULT_VALIDATION_INTERVAL: Duration = Duration::from_secs(30);
pub const DEFAULT_PRESSURE_THRESHOLD: f64 = 0.8;
pub const DEFAULT_CLEANUP_FRACTION: f64 = 0.25;
pub const DEFAULT_LOCK_SHARDS: usize = 64;
pub const DEFAULT_SWEEP_BATCH_SIZE: usize = 256;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of resident entries.
    pub max_cache_size: usize,
    #[serde(rename = "ttl_ms", with = "duration_ms")]
    pub ttl: Duration,
    /// Period of the background expiry sweep.
    #[serde(rename = "signature_validation_interval_ms", with = "duration_ms")]
    pub signature_validation_interval: Duration,
    /// Cache/process memory ratio above which writes trigger aggressive cleanup.
    pub memory_pressure_threshold: f64,
    /// Share of entries (oldest first) dropped by one aggressive cleanup.
    pub aggressive_cleanup_fraction: f64,
    pub lock_shards: usize,
    pub sweep_batch_size: usize,
    /// Spawn the background maintenance thread on construction.
    pub enable_maintenance: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_cache_size: DEFAULT_MAX_CACHE_SIZE,
            ttl: DEFAULT_TTL,
            signature_validation_interval: DEFAULT_VALIDATION_INTERVAL,
            memory_pressure_threshold: DEFAULT_PRESSURE_THRESHOLD,
            aggressive_cleanup_fraction: DEFAULT_CLEANUP_FRACTION,
            lock_shards: DEFAULT_LOCK_SHARDS,
            sweep_batch_size: DEFAULT_SWEEP_BATCH_SIZE,
            enable_maintenance: true,
        }
    }
}

impl CacheConfig {
    pub fn with_max_cache_size(mut self, max_cache_size: usize) -> Self {
        self.max_cache_size = max_cache_size;
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_validation_interval(mut self, interval: Duration) -> Self {
        self.signature_validation_interval = interval;
        self
    }

    pub fn with_memory_pressure_threshold(mut self, threshold: f64) -> Self {
        self.memory_pressure_threshold = threshold;
        self
    }

    pub fn with_lock_shards(mut self, lock_shards: usize) -> Self {
        self.lock_shards = lock_shards;
        self
    }

    pub fn with_maintenance(mut self, enabled: bool) -> Self {
        self.enable_maintenance = enabled;
        self
    }

    pub fn from_json_str(json: &str) -> CacheResult<Self> {
        let config: CacheConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> CacheResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            CacheError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&json)
    }

    /// Reject settings that can only come from a programming mistake.
    pub fn validate(&self) -> CacheResult<()> {
        if self.max_cache_size == 0 {
            return Err(CacheError::invalid_config("max_cache_size", "must be greater than zero"));
        }
        if self.ttl.is_zero() {
            return Err(CacheError::invalid_config("ttl", "must be greater than zero"));
        }
        if self.signature_validation_interval.is_zero() {
            return Err(CacheError::invalid_config(
                "signature_validation_interval",
                "must be greater than zero",
            ));
        }
        if !(self.memory_pressure_threshold > 0.0 && self.memory_pressure_threshold <= 1.0) {
            return Err(CacheError::invalid_config(
                "memory_pressure_threshold",
                format!("{} is outside (0, 1]", self.memory_pressure_threshold),
            ));
        }
        if !(self.aggressive_cleanup_fraction > 0.0 && self.aggressive_cleanup_fraction <= 1.0) {
            return Err(CacheError::invalid_config(
                "aggressive_cleanup_fraction",
                format!("{} is outside (0, 1]", self.aggressive_cleanup_fraction),
            ));
        }
        if self.lock_shards == 0 {
            return Err(CacheError::invalid_config("lock_shards", "must be greater than zero"));
        }
        if self.sweep_batch_size == 0 {
            return Err(CacheError::invalid_config("sweep_batch_size", "must be greater than zero"));
        }
        Ok(())
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
