//! Statistics for the cache.
//!
//! Lookup and insert counters live inside each shard and are bumped under the
//! shard lock the operation already holds, so threads working on different
//! shards never write to a shared counter. Only the recycle counters are
//! cache-wide atomics, because values are recycled after the lock is released.
//!
//! [`ShardedLru::stats`](crate::ShardedLru::stats) sums everything into a
//! [`StatsSnapshot`]. Shards are visited one at a time, so a snapshot taken
//! under concurrent use is approximate; it is exact once writers have quiesced.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::recycle::Disposal;

/// Counters owned by a single shard.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ShardStats {
    /// Lookups that found their key.
    hits: u64,

    /// Lookups that did not.
    misses: u64,

    /// Inserts of a key that was not resident.
    inserts: u64,

    /// Inserts that overwrote a resident key.
    updates: u64,

    /// Entries removed to stay within shard capacity.
    evictions: u64,
}

impl ShardStats {
    /// Record a lookup that found its key.
    pub(crate) fn record_hit(&mut self) {
        self.hits += 1;
    }

    /// Record a lookup that missed.
    pub(crate) fn record_miss(&mut self) {
        self.misses += 1;
    }

    /// Record an insert of a new key.
    pub(crate) fn record_insert(&mut self) {
        self.inserts += 1;
    }

    /// Record an insert that overwrote an existing key.
    pub(crate) fn record_update(&mut self) {
        self.updates += 1;
    }

    /// Record a capacity eviction.
    pub(crate) fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    /// Add this shard's counters into `snapshot`.
    pub(crate) fn add_to(&self, snapshot: &mut StatsSnapshot) {
        snapshot.hits += self.hits;
        snapshot.misses += self.misses;
        snapshot.inserts += self.inserts;
        snapshot.updates += self.updates;
        snapshot.evictions += self.evictions;
    }
}

/// Cache-wide counters for the recycle path.
#[derive(Debug, Default)]
pub(crate) struct RecycleStats {
    /// Displaced values accepted by the recycle queue.
    recycled: AtomicU64,

    /// Displaced values dropped because the recycle queue was full.
    recycle_dropped: AtomicU64,
}

impl RecycleStats {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Record what happened to a displaced value.
    pub(crate) fn record_disposal(&self, disposal: Disposal) {
        match disposal {
            Disposal::Dropped => {}
            Disposal::Queued => {
                self.recycled.fetch_add(1, Ordering::Relaxed);
            }
            Disposal::QueueFull => {
                self.recycle_dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Get the number of values accepted by the recycle queue.
    pub(crate) fn recycled(&self) -> u64 {
        self.recycled.load(Ordering::Relaxed)
    }

    /// Get the number of values dropped because the queue was full.
    pub(crate) fn recycle_dropped(&self) -> u64 {
        self.recycle_dropped.load(Ordering::Relaxed)
    }

    /// Add the recycle counters into `snapshot`.
    pub(crate) fn add_to(&self, snapshot: &mut StatsSnapshot) {
        snapshot.recycled += self.recycled();
        snapshot.recycle_dropped += self.recycle_dropped();
    }
}

/// A point-in-time sum of the cache's counters.
///
/// ```
/// use shard_lru::LruCache;
///
/// let cache: LruCache<u32, u32> = LruCache::new(8);
/// cache.insert(1, 10);
/// cache.get(&1);
/// cache.get(&2);
///
/// let stats = cache.stats();
/// assert_eq!((stats.hits, stats.misses, stats.inserts), (1, 1, 1));
/// assert_eq!(stats.hit_rate(), 50.0);
/// ```
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Lookups that found their key.
    pub hits: u64,
    /// Lookups that did not.
    pub misses: u64,
    /// Inserts of a key that was not resident.
    pub inserts: u64,
    /// Inserts that overwrote a resident key.
    pub updates: u64,
    /// Entries removed to stay within shard capacity.
    pub evictions: u64,
    /// Displaced values accepted by the recycle queue.
    pub recycled: u64,
    /// Displaced values dropped because the recycle queue was full.
    pub recycle_dropped: u64,
}

impl StatsSnapshot {
    /// Calculate the hit rate as a percentage (0.0 to 100.0).
    /// Returns 0.0 if no lookups have been performed.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }

    /// Total number of lookups.
    pub fn lookups(&self) -> u64 {
        self.hits + self.misses
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_stats() {
        let mut snapshot = StatsSnapshot::default();
        ShardStats::default().add_to(&mut snapshot);
        RecycleStats::new().add_to(&mut snapshot);
        assert_eq!(snapshot, StatsSnapshot::default());
        assert_eq!(snapshot.hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate() {
        let mut shard = ShardStats::default();
        shard.record_hit();
        shard.record_hit();
        shard.record_hit();
        shard.record_miss();

        let mut snapshot = StatsSnapshot::default();
        shard.add_to(&mut snapshot);
        assert_eq!(snapshot.lookups(), 4);
        assert!((snapshot.hit_rate() - 75.0).abs() < 0.01);
    }

    #[test]
    fn test_shard_counters_sum() {
        let mut first = ShardStats::default();
        first.record_insert();
        first.record_eviction();

        let mut second = ShardStats::default();
        second.record_insert();
        second.record_update();
        second.record_hit();

        let mut snapshot = StatsSnapshot::default();
        first.add_to(&mut snapshot);
        second.add_to(&mut snapshot);

        assert_eq!(snapshot.inserts, 2);
        assert_eq!(snapshot.updates, 1);
        assert_eq!(snapshot.evictions, 1);
        assert_eq!(snapshot.hits, 1);
        assert_eq!(snapshot.hit_rate(), 100.0);
    }

    #[test]
    fn test_disposal_counters() {
        let stats = RecycleStats::new();
        stats.record_disposal(Disposal::Dropped);
        stats.record_disposal(Disposal::Queued);
        stats.record_disposal(Disposal::Queued);
        stats.record_disposal(Disposal::QueueFull);

        assert_eq!(stats.recycled(), 2);
        assert_eq!(stats.recycle_dropped(), 1);

        let mut snapshot = StatsSnapshot::default();
        stats.add_to(&mut snapshot);
        assert_eq!((snapshot.recycled, snapshot.recycle_dropped), (2, 1));
    }
}
