//! Slot storage for the per-shard recency list.
//!
//! Values live in a `Vec` of slots addressed by [`SlotId`]. Vacated slots form
//! a chain threaded through the vector itself and are reused before the
//! vector grows, so an id stays valid for as long as its value is resident.

/// Handle to an occupied slot in a [`SlotArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct SlotId(usize);

#[derive(Debug)]
enum Slot<T> {
    Occupied(T),
    /// Index of the next vacant slot in the chain.
    Vacant(Option<usize>),
}

#[derive(Debug)]
pub(crate) struct SlotArena<T> {
    slots: Vec<Slot<T>>,
    next_vacant: Option<usize>,
    occupied: usize,
}

impl<T> SlotArena<T> {
    pub(crate) fn new() -> Self {
        Self {
            slots: Vec::new(),
            next_vacant: None,
            occupied: 0,
        }
    }

    pub(crate) fn insert(&mut self, value: T) -> SlotId {
        self.occupied += 1;
        match self.next_vacant {
            Some(index) => {
                let slot = std::mem::replace(&mut self.slots[index], Slot::Occupied(value));
                if let Slot::Vacant(next) = slot {
                    self.next_vacant = next;
                }
                SlotId(index)
            }
            None => {
                self.slots.push(Slot::Occupied(value));
                SlotId(self.slots.len() - 1)
            }
        }
    }

    pub(crate) fn remove(&mut self, id: SlotId) -> Option<T> {
        let slot = self.slots.get_mut(id.0)?;
        if let Slot::Vacant(_) = slot {
            return None;
        }
        match std::mem::replace(slot, Slot::Vacant(self.next_vacant)) {
            Slot::Occupied(value) => {
                self.next_vacant = Some(id.0);
                self.occupied -= 1;
                Some(value)
            }
            Slot::Vacant(_) => None,
        }
    }

    pub(crate) fn get(&self, id: SlotId) -> Option<&T> {
        match self.slots.get(id.0)? {
            Slot::Occupied(value) => Some(value),
            Slot::Vacant(_) => None,
        }
    }

    pub(crate) fn get_mut(&mut self, id: SlotId) -> Option<&mut T> {
        match self.slots.get_mut(id.0)? {
            Slot::Occupied(value) => Some(value),
            Slot::Vacant(_) => None,
        }
    }

    pub(crate) fn contains(&self, id: SlotId) -> bool {
        self.get(id).is_some()
    }

    pub(crate) fn len(&self) -> usize {
        self.occupied
    }

    /// Grow the backing vector so that `total` values fit without reallocating.
    pub(crate) fn reserve_total(&mut self, total: usize) {
        self.slots.reserve(total.saturating_sub(self.slots.len()));
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.next_vacant = None;
        self.occupied = 0;
    }
}

impl<T> Default for SlotArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_get_remove() {
        let mut arena = SlotArena::new();
        let a = arena.insert("a");
        let b = arena.insert("b");

        assert_eq!(arena.len(), 2);
        assert_eq!(arena.get(a), Some(&"a"));
        assert_eq!(arena.remove(a), Some("a"));
        assert_eq!(arena.remove(a), None);
        assert!(!arena.contains(a));
        assert!(arena.contains(b));
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn test_vacant_slots_are_reused_last_freed_first() {
        let mut arena = SlotArena::new();
        let a = arena.insert(1);
        let b = arena.insert(2);
        let _c = arena.insert(3);

        arena.remove(a);
        arena.remove(b);

        assert_eq!(arena.insert(4), b);
        assert_eq!(arena.insert(5), a);
        assert_eq!(arena.insert(6), SlotId(3));
        assert_eq!(arena.len(), 4);
    }

    #[test]
    fn test_get_mut_and_clear() {
        let mut arena = SlotArena::new();
        let a = arena.insert(String::from("x"));
        if let Some(value) = arena.get_mut(a) {
            value.push('y');
        }
        assert_eq!(arena.get(a).map(String::as_str), Some("xy"));

        arena.reserve_total(64);
        arena.clear();
        assert_eq!(arena.len(), 0);
        assert!(arena.get(a).is_none());
        assert_eq!(arena.insert(String::new()), SlotId(0));
    }
}
