//! Error types for the sharded LRU cache.
//!
//! Normal cache operations never fail: absence is reported through `Option`
//! or `bool`. The only errors are configuration errors, surfaced by the
//! fallible constructors (`try_with_config`, `try_resize`, `RecycleQueue::try_new`).

use thiserror::Error;

use crate::shard::MIN_SHARD_CAPACITY;

/// The error type for cache configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// The requested total capacity leaves fewer than
    /// [`MIN_SHARD_CAPACITY`] slots per shard.
    #[error(
        "capacity too small: {capacity} entries over {shards} shards gives {per_shard} per shard (min: {min})",
        min = MIN_SHARD_CAPACITY
    )]
    CapacityTooSmall {
        capacity: usize,
        shards: usize,
        per_shard: usize,
    },

    /// A recycle queue must be able to hold at least one record.
    #[error("recycle queue capacity must be non-zero")]
    InvalidQueueCapacity,
}

/// A specialized Result type for cache configuration.
pub type CacheResult<T> = Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CacheError::CapacityTooSmall {
            capacity: 8,
            shards: 4,
            per_shard: 2,
        };
        assert_eq!(
            err.to_string(),
            "capacity too small: 8 entries over 4 shards gives 2 per shard (min: 3)"
        );

        let err = CacheError::InvalidQueueCapacity;
        assert_eq!(err.to_string(), "recycle queue capacity must be non-zero");
    }
}
