//! Recency-ordered doubly linked list of entries, backed by a [`SlotArena`].
//!
//! Nodes are linked by [`SlotId`] rather than by reference, so the shard
//! index can hold a node's handle and splice it to the front in O(1)
//! without aliasing.
//!
//! ```text
//!   head (most recent)                               tail (least recent)
//!      │                                                  │
//!      ▼                                                  ▼
//!   [id_3] ◄──► [id_0] ◄──► [id_2] ◄──► [id_1]
//! ```

use crate::arena::{SlotArena, SlotId};
use crate::entry::Entry;

#[derive(Debug)]
struct Node<K, V> {
    entry: Entry<K, V>,
    prev: Option<SlotId>,
    next: Option<SlotId>,
}

#[derive(Debug)]
pub(crate) struct RecencyList<K, V> {
    arena: SlotArena<Node<K, V>>,
    head: Option<SlotId>,
    tail: Option<SlotId>,
}

impl<K, V> RecencyList<K, V> {
    pub(crate) fn new() -> Self {
        Self {
            arena: SlotArena::new(),
            head: None,
            tail: None,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.arena.len()
    }

    pub(crate) fn reserve_total(&mut self, total: usize) {
        self.arena.reserve_total(total);
    }

    pub(crate) fn get(&self, id: SlotId) -> Option<&Entry<K, V>> {
        self.arena.get(id).map(|node| &node.entry)
    }

    pub(crate) fn get_mut(&mut self, id: SlotId) -> Option<&mut Entry<K, V>> {
        self.arena.get_mut(id).map(|node| &mut node.entry)
    }

    /// Insert a new entry as the most recently used one.
    pub(crate) fn push_front(&mut self, entry: Entry<K, V>) -> SlotId {
        let id = self.arena.insert(Node {
            entry,
            prev: None,
            next: None,
        });
        self.link_front(id);
        id
    }

    /// Remove the least recently used entry, along with the id it occupied.
    pub(crate) fn pop_back(&mut self) -> Option<(SlotId, Entry<K, V>)> {
        let id = self.tail?;
        self.unlink(id);
        let node = self.arena.remove(id)?;
        Some((id, node.entry))
    }

    /// Splice `id` to the front. Returns `false` if `id` is not resident.
    pub(crate) fn move_to_front(&mut self, id: SlotId) -> bool {
        if self.head == Some(id) {
            return true;
        }
        if !self.unlink(id) {
            return false;
        }
        self.link_front(id);
        true
    }

    pub(crate) fn clear(&mut self) {
        self.arena.clear();
        self.head = None;
        self.tail = None;
    }

    /// Iterate entries from most to least recently used.
    #[cfg(test)]
    pub(crate) fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            list: self,
            current: self.head,
        }
    }

    /// Take `id` out of the chain, leaving its own links empty.
    fn unlink(&mut self, id: SlotId) -> bool {
        let Some(node) = self.arena.get_mut(id) else {
            return false;
        };
        let prev = node.prev.take();
        let next = node.next.take();
        self.link(prev, next);
        true
    }

    fn link_front(&mut self, id: SlotId) {
        let old_head = self.head;
        self.link(Some(id), old_head);
        self.head = Some(id);
    }

    /// Make `prev` and `next` neighbours. `None` on either side stands for
    /// the matching end of the list.
    fn link(&mut self, prev: Option<SlotId>, next: Option<SlotId>) {
        match prev.and_then(|id| self.arena.get_mut(id)) {
            Some(node) => node.next = next,
            None => self.head = next,
        }
        match next.and_then(|id| self.arena.get_mut(id)) {
            Some(node) => node.prev = prev,
            None => self.tail = prev,
        }
    }

    #[cfg(test)]
    pub(crate) fn validate_invariants(&self) {
        let mut count = 0usize;
        let mut prev = None;
        let mut current = self.head;

        while let Some(id) = current {
            let node = self.arena.get(id).expect("linked node missing");
            assert_eq!(node.prev, prev);
            prev = Some(id);
            current = node.next;
            count += 1;
            assert!(count <= self.len(), "cycle in recency list");
        }

        assert_eq!(self.tail, prev);
        assert_eq!(count, self.len());
    }
}

impl<K, V> Default for RecencyList<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
pub(crate) struct Iter<'a, K, V> {
    list: &'a RecencyList<K, V>,
    current: Option<SlotId>,
}

#[cfg(test)]
impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = &'a Entry<K, V>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.list.arena.get(self.current?)?;
        self.current = node.next;
        Some(&node.entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(list: &RecencyList<&'static str, i32>) -> Vec<&'static str> {
        list.iter().map(|entry| entry.key).collect()
    }

    #[test]
    fn test_push_front_orders_most_recent_first() {
        let mut list = RecencyList::new();
        list.push_front(Entry::new(0, "a", 1));
        list.push_front(Entry::new(0, "b", 2));
        list.push_front(Entry::new(0, "c", 3));

        assert_eq!(keys(&list), vec!["c", "b", "a"]);
        list.validate_invariants();
    }

    #[test]
    fn test_move_to_front_from_middle_and_tail() {
        let mut list = RecencyList::new();
        let a = list.push_front(Entry::new(0, "a", 1));
        let b = list.push_front(Entry::new(0, "b", 2));
        let _c = list.push_front(Entry::new(0, "c", 3));

        assert!(list.move_to_front(b));
        assert_eq!(keys(&list), vec!["b", "c", "a"]);

        assert!(list.move_to_front(a));
        assert_eq!(keys(&list), vec!["a", "b", "c"]);

        // Already at the head.
        assert!(list.move_to_front(a));
        assert_eq!(keys(&list), vec!["a", "b", "c"]);
        list.validate_invariants();
    }

    #[test]
    fn test_pop_back_removes_least_recent() {
        let mut list = RecencyList::new();
        let a = list.push_front(Entry::new(0, "a", 1));
        list.push_front(Entry::new(0, "b", 2));

        let (id, entry) = list.pop_back().expect("list has a tail");
        assert_eq!(id, a);
        assert_eq!(entry.into_parts(), ("a", 1));
        assert!(!list.move_to_front(a));
        assert_eq!(list.len(), 1);

        list.pop_back();
        assert!(list.pop_back().is_none());
        assert_eq!(list.len(), 0);
        list.validate_invariants();
    }

    #[test]
    fn test_get_mut_and_clear() {
        let mut list = RecencyList::new();
        let a = list.push_front(Entry::new(0, "a", 1));
        if let Some(entry) = list.get_mut(a) {
            entry.replace_value(5);
        }
        assert_eq!(list.get(a).map(|entry| *entry.value()), Some(5));

        list.clear();
        assert_eq!(list.len(), 0);
        assert!(list.iter().next().is_none());
        list.validate_invariants();
    }
}
