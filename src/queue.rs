//! A FIFO queue with separate locks for its two ends.
//!
//! The queue is a singly linked chain of heap allocated nodes that always
//! ends with an empty placeholder. `head` names the node holding the oldest
//! value, which a pop unlinks and reads; `tail` names the placeholder, which
//! the next push fills. The two
//! pointers are each guarded by their own [`parking_lot::Mutex`], so a producer
//! and a consumer only ever meet on the tail-lock, and only for the time it
//! takes the consumer to read the tail pointer.
//!
//! The only nested acquisition is head-lock, then tail-lock, inside
//! [`try_pop`] and [`is_empty`]. The producer end cannot reach the head-lock at
//! all, so the reverse order never happens and the queue cannot deadlock.
//!
//! [`try_pop`]: Queue::try_pop
//! [`is_empty`]: Queue::is_empty

use core::fmt::{self, Debug, Formatter};

use crate::inner::queue as inner;

#[cfg(test)]
use crate::test::Fifo;

/// A multi-producer, multi-consumer FIFO queue with fine-grained locking.
///
/// Producers serialize on the tail-lock, consumers serialize on the
/// head-lock, and the two sides proceed concurrently. Values pushed by one
/// thread are popped in the same relative order. Across threads, order follows
/// lock acquisition order.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::thread;
///
/// use finelock::Queue;
///
/// let queue = Arc::new(Queue::new());
/// let c_queue = Arc::clone(&queue);
///
/// thread::spawn(move || {
///     for value in 0..3 {
///         c_queue.push(value);
///     }
/// })
/// .join().expect("thread::spawn failed");
///
/// assert_eq!(queue.try_pop(), Some(0));
/// assert_eq!(queue.try_pop(), Some(1));
/// assert_eq!(queue.try_pop(), Some(2));
/// assert_eq!(queue.try_pop(), None);
/// ```
pub struct Queue<T> {
    inner: inner::Queue<T>,
}

impl<T> Queue<T> {
    /// Creates a new, empty queue.
    ///
    /// # Examples
    ///
    /// ```
    /// use finelock::Queue;
    ///
    /// let queue = Queue::<i32>::new();
    /// assert!(queue.is_empty());
    /// ```
    #[inline]
    pub fn new() -> Self {
        Self { inner: inner::Queue::new() }
    }

    /// Appends `value` at the back of the queue.
    ///
    /// The new node is allocated before any lock is taken. The call then holds
    /// the tail-lock only, so it never waits on a consumer that is unlinking
    /// a node.
    ///
    /// # Examples
    ///
    /// ```
    /// use finelock::Queue;
    ///
    /// let queue = Queue::new();
    /// queue.push("a");
    /// assert_eq!(queue.try_pop(), Some("a"));
    /// ```
    #[inline]
    pub fn push(&self, value: T) {
        self.inner.push(value);
    }

    /// Removes the value at the front of the queue, or returns `None` if the
    /// queue is empty.
    ///
    /// This function never waits for a value to arrive. It holds the head-lock
    /// and takes the tail-lock only to read the tail pointer. A push that has
    /// not yet released the tail-lock is not observed, and the call reports
    /// an empty queue.
    ///
    /// # Examples
    ///
    /// ```
    /// use finelock::Queue;
    ///
    /// let queue = Queue::new();
    /// assert_eq!(queue.try_pop(), None);
    /// queue.push(1);
    /// queue.push(2);
    /// assert_eq!(queue.try_pop(), Some(1));
    /// assert_eq!(queue.try_pop(), Some(2));
    /// assert_eq!(queue.try_pop(), None);
    /// ```
    #[inline]
    pub fn try_pop(&self) -> Option<T> {
        self.inner.try_pop()
    }

    /// Returns `true` if the queue holds no values.
    ///
    /// Other threads may push or pop right after this returns, so the result
    /// is only a snapshot.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl<T> Default for Queue<T> {
    /// Creates an empty `Queue<T>`.
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Debug for Queue<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Queue").finish_non_exhaustive()
    }
}

impl<T> FromIterator<T> for Queue<T> {
    /// Creates a queue that pops values in iteration order.
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let queue = Self::new();
        iter.into_iter().for_each(|value| queue.push(value));
        queue
    }
}

impl<T> Extend<T> for Queue<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        iter.into_iter().for_each(|value| self.push(value));
    }
}

#[cfg(test)]
impl<T> Fifo for Queue<T> {
    type Item = T;

    fn new() -> Self {
        Self::new()
    }

    fn push(&self, value: T) {
        self.push(value);
    }

    fn try_pop(&self) -> Option<T> {
        self.try_pop()
    }
}

#[cfg(all(not(loom), test))]
mod test {
    use crate::test::tests::{self, Coarse};
    use crate::Queue;

    #[test]
    fn smoke() {
        tests::smoke::<Queue<_>>();
        tests::smoke::<Coarse<_>>();
    }

    #[test]
    fn pop_empty_is_idempotent() {
        tests::pop_empty_is_idempotent::<Queue<_>>();
    }

    #[test]
    fn fifo_single_producer_consumer() {
        tests::fifo_single_producer_consumer::<Queue<_>>();
        tests::fifo_single_producer_consumer::<Coarse<_>>();
    }

    #[test]
    fn conservation_of_count() {
        tests::conservation_of_count::<Queue<_>>();
        tests::conservation_of_count::<Coarse<_>>();
    }

    #[test]
    fn producers_and_consumers() {
        tests::producers_and_consumers::<Queue<_>>();
    }

    #[test]
    fn drop_releases_values() {
        tests::drop_releases_values::<Queue<_>>();
    }

    #[test]
    fn is_empty_tracks_push_and_pop() {
        let queue = Queue::new();
        assert!(queue.is_empty());
        queue.push(1);
        assert!(!queue.is_empty());
        assert_eq!(queue.try_pop(), Some(1));
        assert!(queue.is_empty());
    }

    #[test]
    fn from_iter_and_extend_keep_order() {
        let mut queue: Queue<_> = (0..3).collect();
        queue.extend(3..5);
        let values: Vec<_> = core::iter::from_fn(|| queue.try_pop()).collect();
        assert_eq!(values, [0, 1, 2, 3, 4]);
    }

    #[test]
    fn debug_does_not_lock() {
        let queue = Queue::<i32>::default();
        assert_eq!(format!("{queue:?}"), "Queue { .. }");
    }

    #[test]
    fn long_queue_drops_without_recursion() {
        let queue: Queue<_> = (0..200_000).collect();
        drop(queue);
    }

    #[test]
    fn non_copy_values_move_through() {
        let queue = Queue::new();
        queue.push(String::from("one"));
        queue.push(String::from("two"));
        assert_eq!(queue.try_pop().as_deref(), Some("one"));
        assert_eq!(queue.try_pop().as_deref(), Some("two"));
    }
}

#[cfg(all(loom, test))]
mod model {
    use crate::loom::models;
    use crate::Queue;

    #[test]
    fn push_pop_race() {
        models::push_pop_race::<Queue<_>>();
    }

    #[test]
    fn producers_preserve_order() {
        models::producers_preserve_order::<Queue<_>>();
    }

    #[test]
    fn consumers_split_values() {
        models::consumers_split_values::<Queue<_>>();
    }
}
