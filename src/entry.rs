//! A resident cache entry: the key, its hash and the value stored under it.

/// A single cache entry.
///
/// Each entry lives in exactly one shard's recency list and is the only copy
/// of its key. The shard's index stores just the entry's slot id, so the hash
/// is kept here for the index to grow without hashing keys again.
#[derive(Debug, Clone)]
pub(crate) struct Entry<K, V> {
    pub(crate) hash: u64,
    pub(crate) key: K,
    pub(crate) value: V,
}

impl<K, V> Entry<K, V> {
    pub(crate) fn new(hash: u64, key: K, value: V) -> Self {
        Self { hash, key, value }
    }

    pub(crate) fn value(&self) -> &V {
        &self.value
    }

    /// Swap in a new value, returning the one it displaced.
    pub(crate) fn replace_value(&mut self, value: V) -> V {
        std::mem::replace(&mut self.value, value)
    }

    pub(crate) fn into_parts(self) -> (K, V) {
        (self.key, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_value_returns_old() {
        let mut entry = Entry::new(7, "k", 1);
        assert_eq!(entry.replace_value(2), 1);
        assert_eq!(*entry.value(), 2);
        assert_eq!(entry.into_parts(), ("k", 2));
    }
}
