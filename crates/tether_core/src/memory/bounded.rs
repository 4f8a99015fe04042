//! # Bounded Queue
//!
//! Fixed-capacity FIFO used for input queues and snapshot buffers.

use std::collections::VecDeque;

/// A FIFO queue that never grows past its capacity.
///
/// Storage is reserved once in [`BoundedQueue::new`]. When the queue is full
/// the caller picks the overflow policy:
///
/// - [`BoundedQueue::try_push`] rejects the newest value (producer-side drop)
/// - [`BoundedQueue::push_evicting`] discards the oldest value
///
/// # Example
///
/// ```rust
/// use tether_core::BoundedQueue;
///
/// let mut queue = BoundedQueue::new(2);
/// assert!(queue.try_push(1).is_ok());
/// assert!(queue.try_push(2).is_ok());
/// assert_eq!(queue.try_push(3), Err(3));
/// assert_eq!(queue.push_evicting(4), Some(1));
/// assert_eq!(queue.pop_front(), Some(2));
/// ```
#[derive(Clone, Debug)]
pub struct BoundedQueue<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedQueue<T> {
    /// Creates an empty queue holding at most `capacity` values.
    ///
    /// A capacity of zero is raised to one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Returns the maximum number of values.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of queued values.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if nothing is queued.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns true if another push would overflow.
    #[inline]
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    /// Appends `value`, or hands it back if the queue is full.
    ///
    /// # Errors
    ///
    /// Returns `Err(value)` when the queue is at capacity.
    pub fn try_push(&mut self, value: T) -> Result<(), T> {
        if self.is_full() {
            return Err(value);
        }
        self.items.push_back(value);
        Ok(())
    }

    /// Appends `value`, evicting and returning the oldest value if full.
    pub fn push_evicting(&mut self, value: T) -> Option<T> {
        let evicted = if self.is_full() {
            self.items.pop_front()
        } else {
            None
        };
        self.items.push_back(value);
        evicted
    }

    /// Removes and returns the oldest value.
    #[inline]
    pub fn pop_front(&mut self) -> Option<T> {
        self.items.pop_front()
    }

    /// Returns the oldest value.
    #[inline]
    #[must_use]
    pub fn front(&self) -> Option<&T> {
        self.items.front()
    }

    /// Returns the newest value.
    #[inline]
    #[must_use]
    pub fn back(&self) -> Option<&T> {
        self.items.back()
    }

    /// Returns the value at `index`, oldest first.
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    /// Iterates oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.items.iter()
    }

    /// Iterates from `index` to the newest value.
    pub fn iter_from(&self, index: usize) -> impl Iterator<Item = &T> {
        self.items.range(index.min(self.items.len())..)
    }

    /// Index of the first value matching `predicate`, oldest first.
    #[must_use]
    pub fn position<P>(&self, predicate: P) -> Option<usize>
    where
        P: FnMut(&T) -> bool,
    {
        self.items.iter().position(predicate)
    }

    /// Drops the `count` oldest values. Returns how many were dropped.
    pub fn drain_front(&mut self, count: usize) -> usize {
        let count = count.min(self.items.len());
        self.items.drain(..count);
        count
    }

    /// Drops everything. Capacity is kept.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}
