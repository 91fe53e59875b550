//! Per-shard lock policies.
//!
//! Each shard sits behind a `lock_api::Mutex<L, _>`, where `L` is picked at
//! compile time:
//!
//! - [`parking_lot::RawMutex`] for caches shared between threads.
//! - [`RawLocalMutex`] for caches confined to one thread. It performs no
//!   atomic operations and is `!Sync`, so a cache built on it cannot be
//!   shared across threads:
//!
//! ```compile_fail
//! use shard_lru::LruCache;
//! use std::sync::Arc;
//!
//! let cache: Arc<LruCache<u32, u32>> = Arc::new(LruCache::new(16));
//! let handle = Arc::clone(&cache);
//! std::thread::spawn(move || handle.insert(1, 1));
//! ```

use std::cell::Cell;

use parking_lot::lock_api::{GuardNoSend, RawMutex};

/// Lock for single-threaded caches.
///
/// Only a flag records whether the shard is currently borrowed; re-locking a
/// held shard panics instead of aliasing it.
#[derive(Debug)]
pub struct RawLocalMutex {
    locked: Cell<bool>,
}

unsafe impl RawMutex for RawLocalMutex {
    #[allow(clippy::declare_interior_mutable_const)]
    const INIT: Self = Self {
        locked: Cell::new(false),
    };

    type GuardMarker = GuardNoSend;

    fn lock(&self) {
        assert!(self.try_lock(), "RawLocalMutex is not reentrant");
    }

    fn try_lock(&self) -> bool {
        !self.locked.replace(true)
    }

    unsafe fn unlock(&self) {
        self.locked.set(false);
    }

    fn is_locked(&self) -> bool {
        self.locked.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::lock_api::Mutex;

    #[test]
    fn test_local_mutex_guards_value() {
        let mutex: Mutex<RawLocalMutex, Vec<i32>> = Mutex::new(Vec::new());
        mutex.lock().push(1);
        mutex.lock().push(2);
        assert_eq!(*mutex.lock(), vec![1, 2]);
        assert!(!mutex.is_locked());
    }

    #[test]
    fn test_local_mutex_try_lock_while_held() {
        let mutex: Mutex<RawLocalMutex, i32> = Mutex::new(0);
        let guard = mutex.lock();
        assert!(mutex.is_locked());
        assert!(mutex.try_lock().is_none());
        drop(guard);
        assert!(mutex.try_lock().is_some());
    }

    #[test]
    #[should_panic(expected = "not reentrant")]
    fn test_local_mutex_rejects_reentry() {
        let mutex: Mutex<RawLocalMutex, i32> = Mutex::new(0);
        let _first = mutex.lock();
        let _second = mutex.lock();
    }
}
