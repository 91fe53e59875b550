//! One partition of the cache: a recency list plus a key index.
//!
//! A shard is not synchronized on its own. The cache wraps each shard in a
//! `lock_api::Mutex` and every method here runs inside that critical section,
//! so the index, the list and the shard's counters are always updated together.
//!
//! The cache hashes each key once and passes the hash in. The index is a
//! `hashbrown::HashTable` of slot ids keyed by that hash; keys themselves are
//! stored only in the list entries.

use std::borrow::Borrow;

use hashbrown::hash_table::{self, HashTable};

use crate::arena::SlotId;
use crate::entry::Entry;
use crate::list::RecencyList;
use crate::stats::ShardStats;

/// Smallest per-shard capacity the cache accepts.
pub const MIN_SHARD_CAPACITY: usize = 3;

/// What an [`Shard::upsert`] did.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Upsert<K, V> {
    /// The key was new and the shard stayed within capacity.
    Inserted,
    /// The key existed; its previous value is handed back.
    Replaced(V),
    /// The key was new and the least recently used entry was evicted.
    Evicted(K, V),
}

pub(crate) struct Shard<K, V> {
    index: HashTable<SlotId>,
    order: RecencyList<K, V>,
    stats: ShardStats,
}

/// Hash of the entry at `id`, for rehashing the index as it grows.
fn stored_hash<K, V>(order: &RecencyList<K, V>, id: SlotId) -> u64 {
    order.get(id).map_or(0, |entry| entry.hash)
}

impl<K, V> Shard<K, V>
where
    K: Eq,
{
    pub(crate) fn new() -> Self {
        Self {
            index: HashTable::new(),
            order: RecencyList::new(),
            stats: ShardStats::default(),
        }
    }

    fn find<Q>(&self, hash: u64, key: &Q) -> Option<SlotId>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        let order = &self.order;
        self.index
            .find(hash, |&id| {
                order
                    .get(id)
                    .is_some_and(|entry| Q::eq(entry.key.borrow(), key))
            })
            .copied()
    }

    /// Membership test. Does not touch recency or counters.
    pub(crate) fn contains<Q>(&self, hash: u64, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        self.find(hash, key).is_some()
    }

    /// Clone the value out and promote its entry to most recently used.
    pub(crate) fn read_and_promote<Q>(&mut self, hash: u64, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
        V: Clone,
    {
        let value = self.find(hash, key).and_then(|id| {
            let value = self.order.get(id)?.value().clone();
            self.order.move_to_front(id);
            Some(value)
        });
        match value {
            Some(_) => self.stats.record_hit(),
            None => self.stats.record_miss(),
        }
        value
    }

    /// Insert or overwrite `key`, then evict at most one entry if the shard
    /// is over `capacity`.
    ///
    /// Overwriting never evicts: the entry count does not change.
    pub(crate) fn upsert(
        &mut self,
        hash: u64,
        key: K,
        value: V,
        capacity: usize,
    ) -> Upsert<K, V> {
        let order = &self.order;
        let slot = self.index.entry(
            hash,
            |&id| order.get(id).is_some_and(|entry| entry.key == key),
            |&id| stored_hash(order, id),
        );

        match slot {
            hash_table::Entry::Occupied(slot) => {
                let id = *slot.get();
                let old = match self.order.get_mut(id) {
                    Some(entry) => entry.replace_value(value),
                    None => unreachable!("indexed slot without a list entry"),
                };
                self.order.move_to_front(id);
                self.stats.record_update();
                Upsert::Replaced(old)
            }
            hash_table::Entry::Vacant(slot) => {
                let id = self.order.push_front(Entry::new(hash, key, value));
                slot.insert(id);
                self.stats.record_insert();
                self.evict_overflow(capacity)
            }
        }
    }

    fn evict_overflow(&mut self, capacity: usize) -> Upsert<K, V> {
        if self.order.len() <= capacity {
            return Upsert::Inserted;
        }
        let Some((id, entry)) = self.order.pop_back() else {
            return Upsert::Inserted;
        };
        if let Ok(slot) = self.index.find_entry(entry.hash, |&indexed| indexed == id) {
            slot.remove();
        }
        self.stats.record_eviction();
        let (key, value) = entry.into_parts();
        Upsert::Evicted(key, value)
    }

    /// Drop every entry. Nothing is handed back for recycling, and the
    /// counters keep their totals.
    pub(crate) fn clear(&mut self) {
        self.index.clear();
        self.order.clear();
    }

    pub(crate) fn reserve_total(&mut self, total: usize) {
        let order = &self.order;
        self.index.reserve(total.saturating_sub(self.index.len()), |&id| {
            stored_hash(order, id)
        });
        self.order.reserve_total(total);
    }

    pub(crate) fn len(&self) -> usize {
        self.order.len()
    }

    pub(crate) fn stats(&self) -> &ShardStats {
        &self.stats
    }

    #[cfg(test)]
    pub(crate) fn keys_by_recency(&self) -> Vec<K>
    where
        K: Clone,
    {
        self.order.iter().map(|entry| entry.key.clone()).collect()
    }

    #[cfg(test)]
    pub(crate) fn validate_invariants(&self) {
        self.order.validate_invariants();
        assert_eq!(self.index.len(), self.order.len());
        for entry in self.order.iter() {
            assert!(self.find(entry.hash, &entry.key).is_some());
        }
    }
}
