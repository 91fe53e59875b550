//! Deferred disposal of values that leave the cache.
//!
//! When a value is overwritten or evicted, the cache can hand it to a
//! caller-owned [`RecycleQueue`] instead of dropping it on the spot. A
//! consumer outside the cache drains the queue and disposes of each payload
//! once it knows no reader still uses it. The `expiry` tag carried by each
//! record is opaque to the cache.
//!
//! Pushing is fail-fast: when the queue is full the record is dropped
//! synchronously on the inserting thread.

use std::fmt;
use std::sync::Arc;

use crossbeam_queue::ArrayQueue;

use crate::error::{CacheError, CacheResult};

/// Default number of records a [`RecycleQueue`] can hold.
pub const DEFAULT_RECYCLE_QUEUE_CAPACITY: usize = 1_000_000;

/// A value (or value member) waiting for deferred disposal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecycleRecord<T> {
    /// Caller-supplied tag from the insert that displaced the value.
    pub expiry: u32,
    /// The value to dispose of.
    pub payload: T,
}

impl<T> RecycleRecord<T> {
    pub fn new(expiry: u32, payload: T) -> Self {
        Self { expiry, payload }
    }
}

/// Bounded lock-free FIFO of [`RecycleRecord`]s.
///
/// Shared between the cache (producer) and the caller's consumer through an
/// `Arc`.
///
/// # Example
/// ```
/// use shard_lru::{RecycleQueue, RecycleRecord};
///
/// let queue = RecycleQueue::new(2);
/// assert!(queue.push(RecycleRecord::new(7, "a")).is_ok());
/// assert!(queue.push(RecycleRecord::new(7, "b")).is_ok());
///
/// // Full: the record comes back to the caller.
/// assert!(queue.push(RecycleRecord::new(7, "c")).is_err());
///
/// let drained: Vec<_> = queue.drain().map(|record| record.payload).collect();
/// assert_eq!(drained, vec!["a", "b"]);
/// ```
pub struct RecycleQueue<T> {
    inner: ArrayQueue<RecycleRecord<T>>,
}

impl<T> RecycleQueue<T> {
    /// Create a queue holding at most `capacity` records.
    ///
    /// # Panics
    /// Panics if `capacity` is zero. See [`RecycleQueue::try_new`].
    pub fn new(capacity: usize) -> Self {
        match Self::try_new(capacity) {
            Ok(queue) => queue,
            Err(err) => panic!("{err}"),
        }
    }

    pub fn try_new(capacity: usize) -> CacheResult<Self> {
        if capacity == 0 {
            return Err(CacheError::InvalidQueueCapacity);
        }
        Ok(Self {
            inner: ArrayQueue::new(capacity),
        })
    }

    /// Try to enqueue a record without blocking.
    ///
    /// Returns the record back if the queue is full.
    pub fn push(&self, record: RecycleRecord<T>) -> Result<(), RecycleRecord<T>> {
        self.inner.push(record)
    }

    pub fn pop(&self) -> Option<RecycleRecord<T>> {
        self.inner.pop()
    }

    /// Pop records until the queue is observed empty.
    pub fn drain(&self) -> impl Iterator<Item = RecycleRecord<T>> + '_ {
        std::iter::from_fn(move || self.pop())
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.inner.is_full()
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }
}

impl<T> Default for RecycleQueue<T> {
    fn default() -> Self {
        Self::new(DEFAULT_RECYCLE_QUEUE_CAPACITY)
    }
}

impl<T> fmt::Debug for RecycleQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecycleQueue")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}

/// Where values displaced from the cache go.
///
/// `V` is the cached value type and `T` the type placed in the queue. With
/// [`RecycleSink::whole`] the two are the same; [`RecycleSink::projected`]
/// keeps only one member of the value and drops the rest immediately.
pub enum RecycleSink<V, T = V> {
    /// Displaced values are dropped synchronously.
    Disabled,
    /// Displaced values are projected and pushed to `queue`.
    Enabled {
        queue: Arc<RecycleQueue<T>>,
        project: fn(V) -> T,
    },
}

/// Outcome of handing a value to a [`RecycleSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Disposal {
    Dropped,
    Queued,
    QueueFull,
}

fn whole_value<V>(value: V) -> V {
    value
}

impl<V> RecycleSink<V, V> {
    /// Recycle entire values.
    pub fn whole(queue: Arc<RecycleQueue<V>>) -> Self {
        RecycleSink::Enabled {
            queue,
            project: whole_value::<V>,
        }
    }
}

impl<V, T> RecycleSink<V, T> {
    pub fn disabled() -> Self {
        RecycleSink::Disabled
    }

    /// Recycle only the member of each value that `project` extracts.
    ///
    /// # Example
    /// ```
    /// use shard_lru::{RecycleQueue, RecycleSink};
    /// use std::sync::Arc;
    ///
    /// #[derive(Clone)]
    /// struct Session {
    ///     user: String,
    ///     buffer: Vec<u8>,
    /// }
    ///
    /// let queue = Arc::new(RecycleQueue::new(64));
    /// let sink = RecycleSink::projected(Arc::clone(&queue), |s: Session| s.buffer);
    /// assert!(sink.is_enabled());
    /// ```
    pub fn projected(queue: Arc<RecycleQueue<T>>, project: fn(V) -> T) -> Self {
        RecycleSink::Enabled { queue, project }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, RecycleSink::Enabled { .. })
    }

    pub fn queue(&self) -> Option<&Arc<RecycleQueue<T>>> {
        match self {
            RecycleSink::Disabled => None,
            RecycleSink::Enabled { queue, .. } => Some(queue),
        }
    }

    /// Dispose of `value`: queue its projection, or drop it now.
    ///
    /// A record rejected by a full queue is dropped here, on the caller's
    /// thread, exactly once.
    pub(crate) fn dispose(&self, value: V, expiry: u32) -> Disposal {
        match self {
            RecycleSink::Disabled => {
                drop(value);
                Disposal::Dropped
            }
            RecycleSink::Enabled { queue, project } => {
                let record = RecycleRecord::new(expiry, project(value));
                match queue.push(record) {
                    Ok(()) => Disposal::Queued,
                    Err(rejected) => {
                        tracing::trace!(
                            expiry = rejected.expiry,
                            capacity = queue.capacity(),
                            "recycle queue full, dropping payload"
                        );
                        drop(rejected);
                        Disposal::QueueFull
                    }
                }
            }
        }
    }
}

impl<V, T> Default for RecycleSink<V, T> {
    fn default() -> Self {
        RecycleSink::Disabled
    }
}

impl<V, T> Clone for RecycleSink<V, T> {
    fn clone(&self) -> Self {
        match self {
            RecycleSink::Disabled => RecycleSink::Disabled,
            RecycleSink::Enabled { queue, project } => RecycleSink::Enabled {
                queue: Arc::clone(queue),
                project: *project,
            },
        }
    }
}

impl<V, T> fmt::Debug for RecycleSink<V, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecycleSink::Disabled => f.write_str("Disabled"),
            RecycleSink::Enabled { queue, .. } => {
                f.debug_struct("Enabled").field("queue", queue).finish()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct DropCounter(Arc<AtomicUsize>);

    impl Drop for DropCounter {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_queue_is_fifo_and_bounded() {
        let queue = RecycleQueue::new(2);
        assert!(queue.is_empty());
        queue.push(RecycleRecord::new(1, "a")).unwrap();
        queue.push(RecycleRecord::new(2, "b")).unwrap();
        assert!(queue.is_full());

        let rejected = queue.push(RecycleRecord::new(3, "c")).unwrap_err();
        assert_eq!(rejected, RecycleRecord::new(3, "c"));

        assert_eq!(queue.pop(), Some(RecycleRecord::new(1, "a")));
        assert_eq!(queue.pop(), Some(RecycleRecord::new(2, "b")));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = RecycleQueue::<u32>::try_new(0).unwrap_err();
        assert_eq!(err, CacheError::InvalidQueueCapacity);
    }

    #[test]
    fn test_default_capacity() {
        let queue: RecycleQueue<u8> = RecycleQueue::default();
        assert_eq!(queue.capacity(), DEFAULT_RECYCLE_QUEUE_CAPACITY);
    }

    #[test]
    fn test_disabled_sink_drops_immediately() {
        let drops = Arc::new(AtomicUsize::new(0));
        let sink: RecycleSink<DropCounter> = RecycleSink::disabled();

        assert_eq!(
            sink.dispose(DropCounter(Arc::clone(&drops)), 0),
            Disposal::Dropped
        );
        assert_eq!(drops.load(Ordering::SeqCst), 1);
        assert!(sink.queue().is_none());
    }

    #[test]
    fn test_whole_sink_queues_value_with_tag() {
        let queue = Arc::new(RecycleQueue::new(4));
        let sink = RecycleSink::whole(Arc::clone(&queue));

        assert_eq!(sink.dispose(String::from("old"), 42), Disposal::Queued);
        assert_eq!(
            queue.pop(),
            Some(RecycleRecord::new(42, String::from("old")))
        );
    }

    #[test]
    fn test_projected_sink_keeps_member_only() {
        let drops = Arc::new(AtomicUsize::new(0));
        let queue = Arc::new(RecycleQueue::new(4));
        let sink = RecycleSink::projected(
            Arc::clone(&queue),
            |(counter, id): (DropCounter, u64)| {
                drop(counter);
                id
            },
        );

        sink.dispose((DropCounter(Arc::clone(&drops)), 9), 1);
        assert_eq!(drops.load(Ordering::SeqCst), 1);
        assert_eq!(queue.pop(), Some(RecycleRecord::new(1, 9)));
    }

    #[test]
    fn test_full_queue_drops_payload_once() {
        let drops = Arc::new(AtomicUsize::new(0));
        let queue = Arc::new(RecycleQueue::new(1));
        let sink = RecycleSink::whole(Arc::clone(&queue));

        assert_eq!(
            sink.dispose(DropCounter(Arc::clone(&drops)), 0),
            Disposal::Queued
        );
        assert_eq!(
            sink.dispose(DropCounter(Arc::clone(&drops)), 0),
            Disposal::QueueFull
        );
        assert_eq!(drops.load(Ordering::SeqCst), 1);

        drop(queue.pop());
        assert_eq!(drops.load(Ordering::SeqCst), 2);
    }
}
