//! Lock-based concurrent collections built on hand managed node chains.
//!
//! This crate provides two in-memory, multi-threaded collections that show
//! two different ways of synchronizing a linked structure with blocking
//! locks:
//!
//! - [`Queue`]: a FIFO queue over a singly linked chain that always holds a
//!   sentinel node. Its consumer end and its producer end are guarded by two
//!   independent mutexes, so a pushing thread and a popping thread do not
//!   contend on the same lock. This is fine-grained locking.
//! - [`List`]: a singly linked list with cached head, tail and length, guarded
//!   by one reader-writer lock. Any number of readers proceed together, every
//!   writer runs alone.
//!
//! Both collections are synchronous. Every operation either runs to completion
//! or blocks until its lock is available; there are no timeouts and nothing
//! is retried. Popping from an empty queue or deleting past the end of the
//! list are ordinary outcomes, reported through `Option` rather than errors.
//!
//! ## Fine-grained locking and the sentinel node
//!
//! The queue keeps a placeholder node at the end of its chain. Pushing writes
//! the value into the current placeholder and appends a fresh one, so the
//! producer only touches the tail. Popping unlinks the head node and returns
//! the value stored in that node; its successor becomes the new head, so the
//! consumer only touches the head. The head and tail name the same node
//! exactly when the queue is empty, and that identity check is the only point
//! where the consumer reads the tail.
//!
//! ```
//! use std::sync::Arc;
//! use std::thread;
//!
//! use finelock::Queue;
//!
//! let queue = Arc::new(Queue::new());
//! let producer = {
//!     let queue = Arc::clone(&queue);
//!     thread::spawn(move || (0..100).for_each(|value| queue.push(value)))
//! };
//!
//! let mut popped = Vec::new();
//! while popped.len() < 100 {
//!     popped.extend(queue.try_pop());
//! }
//! producer.join().expect("thread::spawn failed");
//!
//! // Values from a single producer keep their order.
//! assert!(popped.windows(2).all(|pair| pair[0] < pair[1]));
//! ```
//!
//! ## Reader-writer locking
//!
//! Deleting arbitrary nodes from the middle of a chain would need
//! hand-over-hand locking to be done with per-node locks. The list instead
//! takes one lock for the whole structure: exclusive for every mutation,
//! shared for every inspection.
//!
//! ```
//! use finelock::List;
//!
//! let list = List::new();
//! list.append_node(2);
//! list.prepend_node(1);
//! list.append_node(2);
//! assert_eq!(list.delete_nodes_by_value(&2), 2);
//! assert_eq!(list.to_string(), "1 -> nil");
//! assert!(list.check_consistency());
//! ```
//!
//! ## Logging
//!
//! The crate emits [`tracing`] events at `trace` level when a collection is
//! released and when a list deletion is a no-op, and at `warn` level when
//! [`List::check_consistency`] fails. No subscriber is installed.
//!
//! [`tracing`]: https://docs.rs/tracing

#![allow(clippy::doc_markdown)]
#![allow(clippy::module_name_repetitions)]
#![warn(missing_docs)]
#![warn(rust_2024_compatibility)]
#![warn(clippy::undocumented_unsafe_blocks)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod list;
mod queue;

pub use list::{List, ReadGuard};
pub use queue::Queue;

pub use inner::list::Iter;

pub(crate) mod cfg;
pub(crate) mod inner;

#[cfg(test)]
pub(crate) mod test;

#[cfg(all(loom, test))]
#[cfg(not(tarpaulin))]
pub(crate) mod loom;
