//! # Shard LRU
//!
//! A fixed-capacity, thread-safe LRU cache split into independently locked
//! shards, with optional deferred recycling of displaced values.
//!
//! ## Features
//!
//! - **Sharded**: keys hash to one of `2^N` shards; each shard has its own
//!   lock, recency list and index, so different shards never contend.
//! - **O(1) LRU**: lookups and inserts splice entries to the front of an
//!   arena-backed list; eviction pops the back.
//! - **Deferred recycling**: overwritten and evicted values can be pushed to a
//!   caller-owned bounded queue instead of being dropped in place.
//! - **Compile-time lock policy**: `parking_lot` mutexes for shared caches, a
//!   non-atomic flag for caches confined to one thread.
//! - **Approximate capacity**: the total bound is split evenly across shards
//!   and is exact only when keys hash uniformly.
//!
//! ## Quick Start
//!
//! ```rust
//! use shard_lru::LruCache;
//!
//! let cache: LruCache<String, u64> = LruCache::new(1_000);
//!
//! cache.insert("user:123".to_string(), 42);
//!
//! if let Some(value) = cache.get("user:123") {
//!     println!("Found: {}", value);
//! }
//! assert!(cache.exists("user:123"));
//! ```
//!
//! ## Thread Safety
//!
//! The multi-threaded presets are `Sync` and can be shared through an `Arc`:
//!
//! ```rust
//! use shard_lru::MtLruCache;
//! use std::sync::Arc;
//! use std::thread;
//!
//! let cache: Arc<MtLruCache<u64, String>> = Arc::new(MtLruCache::new(10_000));
//!
//! let handles: Vec<_> = (0..4u64)
//!     .map(|i| {
//!         let cache = Arc::clone(&cache);
//!         thread::spawn(move || {
//!             cache.insert(i, format!("value_{}", i));
//!         })
//!     })
//!     .collect();
//!
//! for handle in handles {
//!     handle.join().unwrap();
//! }
//! assert_eq!(cache.len(), 4);
//! ```
//!
//! ## Recycling
//!
//! ```rust
//! use shard_lru::{LruCache, RecycleQueue};
//! use std::sync::Arc;
//!
//! let queue = Arc::new(RecycleQueue::new(1024));
//! let cache: LruCache<u32, Vec<u8>> = LruCache::with_recycle_queue(3, Arc::clone(&queue));
//!
//! cache.insert(1, vec![1]);
//! cache.insert_with_expiry(1, vec![2], 500);
//!
//! let record = queue.pop().unwrap();
//! assert_eq!((record.expiry, record.payload), (500, vec![1]));
//! ```

use std::collections::hash_map::RandomState;

pub mod cache;
pub mod config;
pub mod error;
pub mod lock;
pub mod recycle;
pub mod stats;

pub use cache::ShardedLru;
pub use config::{CacheConfig, DEFAULT_MAX_CAPACITY};
pub use error::{CacheError, CacheResult};
pub use lock::RawLocalMutex;
pub use recycle::{RecycleQueue, RecycleRecord, RecycleSink, DEFAULT_RECYCLE_QUEUE_CAPACITY};
pub use shard::MIN_SHARD_CAPACITY;
pub use stats::StatsSnapshot;

pub(crate) mod arena;
pub(crate) mod entry;
pub(crate) mod list;
pub(crate) mod shard;

/// Single-shard cache for use from one thread. Capacity is exact.
pub type LruCache<K, V, S = RandomState> = ShardedLru<K, V, 0, RawLocalMutex, V, S>;

/// 64-shard cache for shared use. Needs a capacity of at least 192.
pub type MtLruCache<K, V, S = RandomState> = ShardedLru<K, V, 6, parking_lot::RawMutex, V, S>;

/// 1024-shard cache that recycles whole values.
pub type SimpleShardLruCache<K, V, S = RandomState> =
    ShardedLru<K, V, 10, parking_lot::RawMutex, V, S>;

/// 1024-shard cache that recycles the `M` member of each value.
pub type ShardLruCache<K, V, M, S = RandomState> =
    ShardedLru<K, V, 10, parking_lot::RawMutex, M, S>;
