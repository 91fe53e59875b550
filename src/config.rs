//! Configuration for the sharded LRU cache.
//!
//! Shard count, lock policy and hasher are type-level choices on
//! [`ShardedLru`](crate::ShardedLru). This builder covers the run-time knobs.

use crate::error::{CacheError, CacheResult};
use crate::shard::MIN_SHARD_CAPACITY;

/// Total capacity used when none is given.
pub const DEFAULT_MAX_CAPACITY: usize = 65_536;

/// Configuration for creating a new cache instance.
///
/// ```
/// use shard_lru::CacheConfig;
///
/// let config = CacheConfig::new()
///     .max_capacity(10_000)
///     .preallocate(false)
///     .build();
///
/// assert_eq!(config.get_max_capacity(), 10_000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Approximate bound on the total number of entries. It is split evenly
    /// across shards, so the real bound depends on how uniformly keys hash.
    pub(crate) max_capacity: usize,

    /// Reserve storage for `max_capacity` entries (plus slack) up front.
    pub(crate) preallocate: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: DEFAULT_MAX_CAPACITY,
            preallocate: true,
        }
    }
}

impl CacheConfig {
    /// Create a new configuration builder with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the total capacity of the cache.
    pub fn max_capacity(mut self, capacity: usize) -> Self {
        self.max_capacity = capacity;
        self
    }

    /// Enable or disable reserving storage at construction.
    pub fn preallocate(mut self, enabled: bool) -> Self {
        self.preallocate = enabled;
        self
    }

    /// Build the final configuration.
    pub fn build(self) -> Self {
        self
    }

    pub fn get_max_capacity(&self) -> usize {
        self.max_capacity
    }

    pub fn get_preallocate(&self) -> bool {
        self.preallocate
    }

    /// Check the configuration against a shard count and return the
    /// per-shard capacity.
    pub fn validate(&self, shards: usize) -> CacheResult<usize> {
        shard_capacity(self.max_capacity, shards)
    }
}

pub(crate) fn shard_capacity(capacity: usize, shards: usize) -> CacheResult<usize> {
    let per_shard = capacity / shards.max(1);
    if per_shard < MIN_SHARD_CAPACITY {
        return Err(CacheError::CapacityTooSmall {
            capacity,
            shards,
            per_shard,
        });
    }
    Ok(per_shard)
}
