//! The main cache interface.
//!
//! [`ShardedLru`] routes every key to one of `2^N` shards by hash. Each shard
//! keeps its own recency list, key index and counters behind its own lock, so
//! operations on keys in different shards never contend.

use std::borrow::Borrow;
use std::collections::hash_map::RandomState;
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::lock_api::{Mutex, RawMutex};
use tracing::debug;

use crate::config::{shard_capacity, CacheConfig, DEFAULT_MAX_CAPACITY};
use crate::error::CacheResult;
use crate::recycle::{RecycleQueue, RecycleSink};
use crate::shard::{Shard, Upsert, MIN_SHARD_CAPACITY};
use crate::stats::{RecycleStats, StatsSnapshot};

/// Extra room reserved on top of the requested entry count, in tenths.
const RESERVE_SLACK_DIVISOR: usize = 10;

/// A sharded, fixed-capacity LRU cache.
///
/// # Type parameters
/// - `K`, `V`: key and value types.
/// - `N`: shard exponent; the cache has `2^N` shards (`N <= 24`).
/// - `L`: per-shard lock, [`parking_lot::RawMutex`] or
///   [`RawLocalMutex`](crate::RawLocalMutex).
/// - `T`: type handed to the recycle queue, `V` itself or a member of it.
/// - `S`: hasher. Each key is hashed once per operation; the hash picks the
///   shard and is then reused by that shard's index.
///
/// # Capacity
/// The configured capacity is divided evenly across shards and each shard
/// evicts its own least recently used entry once it is over its share. The
/// total bound is therefore approximate: exact only if keys spread perfectly
/// evenly. Tests that count entries exactly should use a single shard.
///
/// # Example
/// ```
/// use shard_lru::LruCache;
///
/// let cache: LruCache<&str, i32> = LruCache::new(3);
/// cache.insert("a", 1);
/// cache.insert("b", 2);
/// cache.insert("c", 3);
///
/// assert_eq!(cache.get("a"), Some(1));
///
/// // "b" is now the least recently used entry.
/// cache.insert("d", 4);
/// assert!(!cache.exists("b"));
/// assert_eq!(cache.len(), 3);
/// ```
pub struct ShardedLru<
    K,
    V,
    const N: u32 = 4,
    L = parking_lot::RawMutex,
    T = V,
    S = RandomState,
> {
    shards: Box<[Mutex<L, Shard<K, V>>]>,
    hash_builder: S,
    shard_capacity: AtomicUsize,
    sink: RecycleSink<V, T>,
    recycle_stats: RecycleStats,
}

impl<K, V, const N: u32, L> ShardedLru<K, V, N, L, V, RandomState>
where
    K: Hash + Eq,
    L: RawMutex,
{
    /// Create a cache holding roughly `max_capacity` entries, with
    /// recycling disabled.
    ///
    /// # Panics
    /// Panics if `max_capacity / 2^N` is below
    /// [`MIN_SHARD_CAPACITY`](crate::MIN_SHARD_CAPACITY).
    pub fn new(max_capacity: usize) -> Self {
        Self::with_sink(max_capacity, RecycleSink::Disabled)
    }

    /// Create a cache that hands overwritten and evicted values to `queue`.
    pub fn with_recycle_queue(max_capacity: usize, queue: Arc<RecycleQueue<V>>) -> Self {
        Self::with_sink(max_capacity, RecycleSink::whole(queue))
    }
}

impl<K, V, const N: u32, L, T> ShardedLru<K, V, N, L, T, RandomState>
where
    K: Hash + Eq,
    L: RawMutex,
{
    pub fn with_sink(max_capacity: usize, sink: RecycleSink<V, T>) -> Self {
        let config = CacheConfig::new().max_capacity(max_capacity).build();
        Self::with_config(config, sink, RandomState::new())
    }
}

impl<K, V, const N: u32, L, T, S> ShardedLru<K, V, N, L, T, S>
where
    K: Hash + Eq,
    L: RawMutex,
    S: BuildHasher,
{
    /// Number of shards, `2^N`.
    pub const SHARD_COUNT: usize = {
        assert!(N <= 24, "shard exponent must be at most 24");
        1 << N
    };

    /// Create a cache from a full configuration.
    ///
    /// # Panics
    /// Panics if the configuration is rejected by [`CacheConfig::validate`].
    pub fn with_config(config: CacheConfig, sink: RecycleSink<V, T>, hash_builder: S) -> Self {
        match Self::try_with_config(config, sink, hash_builder) {
            Ok(cache) => cache,
            Err(err) => panic!("{err}"),
        }
    }

    pub fn try_with_config(
        config: CacheConfig,
        sink: RecycleSink<V, T>,
        hash_builder: S,
    ) -> CacheResult<Self> {
        let per_shard = config.validate(Self::SHARD_COUNT)?;
        let shards = (0..Self::SHARD_COUNT)
            .map(|_| Mutex::new(Shard::new()))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        let cache = Self {
            shards,
            hash_builder,
            shard_capacity: AtomicUsize::new(per_shard),
            sink,
            recycle_stats: RecycleStats::new(),
        };
        if config.preallocate {
            cache.reserve(config.max_capacity);
        }

        debug!(
            capacity = config.max_capacity,
            shards = Self::SHARD_COUNT,
            per_shard,
            recycling = cache.sink.is_enabled(),
            "created sharded lru cache"
        );
        Ok(cache)
    }

    /// Pick the shard for `hash`.
    ///
    /// Each shard's table uses the low bits for buckets and the top seven as
    /// control tags, so the shard comes from the bits in between.
    fn shard_index(hash: u64) -> usize {
        if Self::SHARD_COUNT == 1 {
            return 0;
        }
        (hash >> 32) as usize & (Self::SHARD_COUNT - 1)
    }

    /// Hash `key` and find its shard.
    fn locate<Q>(&self, key: &Q) -> (u64, &Mutex<L, Shard<K, V>>)
    where
        Q: Hash + ?Sized,
    {
        let hash = self.hash_builder.hash_one(key);
        (hash, &self.shards[Self::shard_index(hash)])
    }

    /// Check whether `key` is resident. Does not affect recency.
    pub fn exists<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let (hash, shard) = self.locate(key);
        shard.lock().contains(hash, key)
    }

    /// Get a copy of the value for `key` and mark it most recently used.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        let (hash, shard) = self.locate(key);
        shard.lock().read_and_promote(hash, key)
    }

    /// Insert or overwrite `key` with an expiry tag of 0.
    pub fn insert(&self, key: K, value: V) {
        self.insert_with_expiry(key, value, 0);
    }

    /// Insert or overwrite `key`.
    ///
    /// The entry becomes the most recently used in its shard. A value
    /// displaced by the insert (the previous value for `key`, or the value
    /// of an evicted entry) is handed to the recycle sink tagged with
    /// `expiry`, after the shard lock has been released.
    pub fn insert_with_expiry(&self, key: K, value: V, expiry: u32) {
        let capacity = self.shard_capacity.load(Ordering::Relaxed);
        let (hash, shard) = self.locate(&key);
        let outcome = shard.lock().upsert(hash, key, value, capacity);

        match outcome {
            Upsert::Inserted => {}
            Upsert::Replaced(old) | Upsert::Evicted(_, old) => {
                let disposal = self.sink.dispose(old, expiry);
                self.recycle_stats.record_disposal(disposal);
            }
        }
    }

    /// Remove every entry. Removed values are dropped, never recycled.
    pub fn clear(&self) {
        for shard in self.shards.iter() {
            shard.lock().clear();
        }
        debug!(shards = Self::SHARD_COUNT, "cleared sharded lru cache");
    }

    /// Reserve storage for about `entries` entries across all shards,
    /// plus ten percent slack for uneven hashing.
    pub fn reserve(&self, entries: usize) {
        let total = entries.saturating_add(entries / RESERVE_SLACK_DIVISOR);
        let per_shard = total.div_ceil(Self::SHARD_COUNT);
        for shard in self.shards.iter() {
            shard.lock().reserve_total(per_shard);
        }
        debug!(entries, per_shard, "reserved cache storage");
    }

    /// Change the total capacity.
    ///
    /// Nothing is evicted here. A shard left above its new share shrinks
    /// lazily, one eviction per insert of a new key.
    ///
    /// A total too small to give every shard
    /// [`MIN_SHARD_CAPACITY`](crate::MIN_SHARD_CAPACITY) entries is clamped to
    /// that minimum. Use [`ShardedLru::try_resize`] to reject it instead.
    pub fn resize(&self, max_capacity: usize) {
        let per_shard = match shard_capacity(max_capacity, Self::SHARD_COUNT) {
            Ok(per_shard) => per_shard,
            Err(err) => {
                debug!(%err, per_shard = MIN_SHARD_CAPACITY, "clamping resize");
                MIN_SHARD_CAPACITY
            }
        };
        self.shard_capacity.store(per_shard, Ordering::Relaxed);
        debug!(capacity = max_capacity, per_shard, "resized sharded lru cache");
    }

    /// Change the total capacity, rejecting a total that leaves any shard
    /// with fewer than [`MIN_SHARD_CAPACITY`](crate::MIN_SHARD_CAPACITY)
    /// entries. On error the capacity is unchanged.
    pub fn try_resize(&self, max_capacity: usize) -> CacheResult<()> {
        let per_shard = shard_capacity(max_capacity, Self::SHARD_COUNT)?;
        self.shard_capacity.store(per_shard, Ordering::Relaxed);
        debug!(capacity = max_capacity, per_shard, "resized sharded lru cache");
        Ok(())
    }

    /// Total number of resident entries.
    ///
    /// Shards are counted one at a time, so under concurrent mutation the
    /// result is approximate.
    pub fn len(&self) -> usize {
        self.shards.iter().map(|shard| shard.lock().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.shards.iter().all(|shard| shard.lock().len() == 0)
    }

    /// Effective total capacity: per-shard capacity times shard count.
    pub fn capacity(&self) -> usize {
        self.shard_capacity() * Self::SHARD_COUNT
    }

    pub fn shard_capacity(&self) -> usize {
        self.shard_capacity.load(Ordering::Relaxed)
    }

    pub fn shard_count(&self) -> usize {
        Self::SHARD_COUNT
    }

    pub fn recycle_sink(&self) -> &RecycleSink<V, T> {
        &self.sink
    }

    /// Sum the counters of every shard and the recycle path.
    ///
    /// Shards are locked one at a time, so under concurrent use the result
    /// is approximate.
    pub fn stats(&self) -> StatsSnapshot {
        let mut snapshot = StatsSnapshot::default();
        for shard in self.shards.iter() {
            shard.lock().stats().add_to(&mut snapshot);
        }
        self.recycle_stats.add_to(&mut snapshot);
        snapshot
    }
}

impl<K, V, const N: u32, L> Default for ShardedLru<K, V, N, L, V, RandomState>
where
    K: Hash + Eq,
    L: RawMutex,
{
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CAPACITY)
    }
}

impl<K, V, const N: u32, L, T, S> fmt::Debug for ShardedLru<K, V, N, L, T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShardedLru")
            .field("shards", &self.shards.len())
            .field(
                "shard_capacity",
                &self.shard_capacity.load(Ordering::Relaxed),
            )
            .field("sink", &self.sink)
            .finish_non_exhaustive()
    }
}
