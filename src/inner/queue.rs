use core::ptr::{self, NonNull};

use crate::cfg::cell::UnsafeCell;
use crate::cfg::sync::Mutex;

/// The heap allocated queue node.
///
/// A node is created empty as the queue's sentinel. The producer that later
/// appends through it writes the value and links the next sentinel, after
/// which the node belongs to the consumer end.
struct Node<T> {
    value: UnsafeCell<Option<T>>,
    next: UnsafeCell<*mut Node<T>>,
}

impl<T> Node<T> {
    /// Creates a new, heap allocated sentinel and returns a leaked pointer to
    /// it.
    ///
    /// Caller is responsible for freeing the node.
    fn sentinel() -> NonNull<Self> {
        let node = Self { value: UnsafeCell::new(None), next: UnsafeCell::new(ptr::null_mut()) };
        let ptr = Box::into_raw(Box::new(node));
        // SAFETY: The returned `ptr` is guarenteed to be properly aligned and
        // non-null by the `Box::into_raw` function contract.
        unsafe { NonNull::new_unchecked(ptr) }
    }

    /// Takes the value out of a node that has been unlinked from the chain.
    fn into_value(self: Box<Self>) -> Option<T> {
        // SAFETY: The node is uniquely owned by this box, no other thread can
        // reach it anymore.
        self.value.with_mut(|value| unsafe { (*value).take() })
    }
}

/// The producer end of the queue.
///
/// Owns the tail-lock, which protects the `last` pointer and the cells of the
/// node it points to. `Tail` has no way to reach the head-lock, so no thread
/// ever waits on the head-lock while holding the tail-lock.
struct Tail<T> {
    last: Mutex<NonNull<Node<T>>>,
}

impl<T> Tail<T> {
    /// Reads the current tail pointer, holding the tail-lock for the read only.
    fn snapshot(&self) -> NonNull<Node<T>> {
        *self.last.lock()
    }

    /// Stores `value` into the current sentinel and makes `sentinel` the new
    /// tail.
    fn append(&self, value: T, sentinel: NonNull<Node<T>>) {
        let mut last = self.last.lock();
        // SAFETY: The tail always points to a live node owned by the chain.
        // The consumer end only reads the cells of nodes it has observed to
        // differ from a tail snapshot, and snapshots are taken under this
        // same lock, so we hold exclusive access to these cells.
        let node = unsafe { last.as_ref() };
        // SAFETY: Exclusive access, see above.
        node.value.with_mut(|slot| unsafe { *slot = Some(value) });
        // SAFETY: Exclusive access, see above.
        node.next.with_mut(|next| unsafe { *next = sentinel.as_ptr() });
        *last = sentinel;
    }
}

/// The consumer end of the queue.
///
/// Owns the head-lock, which protects the `first` pointer. The first node owns
/// the rest of the chain through its `next` pointers.
struct Head<T> {
    first: Mutex<NonNull<Node<T>>>,
}

impl<T> Head<T> {
    /// Unlinks the first node, returning it if the queue was not empty.
    ///
    /// The tail-lock is taken, briefly, while the head-lock is held. Never the
    /// other way around.
    fn unlink(&self, tail: &Tail<T>) -> Option<Box<Node<T>>> {
        let mut first = self.first.lock();
        if *first == tail.snapshot() {
            return None;
        }
        let old = *first;
        // SAFETY: `old` is not the tail, so a producer has already written its
        // `next` cell, and that write happened before the tail-lock release
        // we synchronized with when taking the snapshot. Producers never touch
        // a node again once the tail has moved past it.
        let next = unsafe { old.as_ref() }.next.with(|next| unsafe { *next });
        // SAFETY: A node that has been passed by the tail always has a
        // non-null successor.
        *first = unsafe { NonNull::new_unchecked(next) };
        drop(first);
        // SAFETY: The node was allocated through the Box API and is no longer
        // reachable from the chain, so this is the only pointer to it.
        Some(unsafe { Box::from_raw(old.as_ptr()) })
    }

    /// Checks whether the first node is also the last one.
    fn is_last(&self, tail: &Tail<T>) -> bool {
        let first = self.first.lock();
        *first == tail.snapshot()
    }
}

/// A FIFO queue with independent locks for its consumer and producer ends.
pub struct Queue<T> {
    head: Head<T>,
    tail: Tail<T>,
}

// SAFETY: Values are moved in and out by value, and every access to the shared
// chain is serialized by one of the two locks.
unsafe impl<T: Send> Send for Queue<T> {}
unsafe impl<T: Send> Sync for Queue<T> {}

impl<T> Queue<T> {
    /// Creates an empty queue: one sentinel node, pointed by both ends.
    pub fn new() -> Self {
        let sentinel = Node::sentinel();
        let head = Head { first: Mutex::new(sentinel) };
        let tail = Tail { last: Mutex::new(sentinel) };
        Self { head, tail }
    }

    /// Appends `value` at the producer end.
    pub fn push(&self, value: T) {
        // Allocate outside of the critical section.
        let sentinel = Node::sentinel();
        self.tail.append(value, sentinel);
    }

    /// Removes the value at the consumer end, if any.
    pub fn try_pop(&self) -> Option<T> {
        self.head.unlink(&self.tail).and_then(Node::into_value)
    }

    /// Returns `true` if the consumer end has reached the producer end.
    pub fn is_empty(&self) -> bool {
        self.head.is_last(&self.tail)
    }
}

impl<T> Drop for Queue<T> {
    fn drop(&mut self) {
        let mut released = 0usize;
        let mut node = self.head.first.lock().as_ptr();
        while !node.is_null() {
            // SAFETY: Every node reachable from the head was allocated through
            // the Box API and is owned by the chain; `&mut self` guarantees no
            // other thread holds any pointer into it.
            let boxed = unsafe { Box::from_raw(node) };
            // SAFETY: The box owns the node.
            node = boxed.next.with(|next| unsafe { *next });
            released += usize::from(boxed.into_value().is_some());
        }
        tracing::trace!(released, "queue released");
    }
}
