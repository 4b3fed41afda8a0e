//! A singly linked list guarded by one reader-writer lock.
//!
//! Every mutating operation takes the lock exclusively, every inspection takes
//! it shared. There is no finer granularity: deleting by value or by index
//! touches arbitrary parts of the chain, and one lock over the whole structure
//! keeps those operations simple and strongly consistent.

use core::fmt::{self, Debug, Display, Formatter};

use crate::cfg::sync::{RwLock, RwLockReadGuard};
use crate::inner::list::{Chain, Iter};

/// A concurrent singly linked list with O(1) prepend and append.
///
/// The list keeps a cached length and a pointer to its last node. Both are
/// always in sync with the chain itself, which [`check_consistency`] verifies
/// by walking it.
///
/// Writers ([`prepend_node`], [`append_node`], [`delete_nodes_by_value`],
/// [`delete_node_by_index`]) are mutually exclusive with everything else.
/// Readers ([`len`], [`is_empty`], [`check_consistency`], [`read`]) run
/// concurrently with each other.
///
/// Every reader takes the shared lock recursively: it is granted while another
/// shared lock is held, even if a writer is already waiting. A thread holding a
/// [`ReadGuard`] can therefore call any reader on the same list without
/// deadlocking. The flip side is that a steady stream of overlapping readers
/// can keep a writer waiting.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::thread;
///
/// use finelock::List;
///
/// let list = Arc::new(List::new());
/// let handles: Vec<_> = (0..4)
///     .map(|id| {
///         let list = Arc::clone(&list);
///         thread::spawn(move || list.append_node(id))
///     })
///     .collect();
///
/// for handle in handles {
///     handle.join().expect("thread::spawn failed");
/// }
///
/// assert_eq!(list.len(), 4);
/// assert!(list.check_consistency());
/// ```
/// [`prepend_node`]: List::prepend_node
/// [`append_node`]: List::append_node
/// [`delete_nodes_by_value`]: List::delete_nodes_by_value
/// [`delete_node_by_index`]: List::delete_node_by_index
/// [`len`]: List::len
/// [`is_empty`]: List::is_empty
/// [`check_consistency`]: List::check_consistency
/// [`read`]: List::read
pub struct List<T> {
    chain: RwLock<Chain<T>>,
}

impl<T> List<T> {
    /// Creates a new, empty list.
    ///
    /// # Examples
    ///
    /// ```
    /// use finelock::List;
    ///
    /// let list = List::<i32>::new();
    /// assert!(list.is_empty());
    /// ```
    #[inline]
    pub fn new() -> Self {
        Self::from_chain(Chain::new())
    }

    fn from_chain(chain: Chain<T>) -> Self {
        Self { chain: RwLock::new(chain) }
    }

    /// Inserts `value` at the front of the list.
    ///
    /// # Examples
    ///
    /// ```
    /// use finelock::List;
    ///
    /// let list = List::new();
    /// list.prepend_node(2);
    /// list.prepend_node(1);
    /// assert_eq!(list.to_vec(), [1, 2]);
    /// ```
    pub fn prepend_node(&self, value: T) {
        self.chain.write().push_front(value);
    }

    /// Inserts `value` at the back of the list.
    ///
    /// # Examples
    ///
    /// ```
    /// use finelock::List;
    ///
    /// let list = List::new();
    /// list.append_node(1);
    /// list.append_node(2);
    /// assert_eq!(list.to_vec(), [1, 2]);
    /// ```
    pub fn append_node(&self, value: T) {
        self.chain.write().push_back(value);
    }

    /// Removes the node at the 0-based `index` and returns its value.
    ///
    /// If the list is empty or `index` is out of range, the list is left
    /// untouched and `None` is returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use finelock::List;
    ///
    /// let list: List<_> = (0..4).collect();
    /// assert_eq!(list.delete_node_by_index(2), Some(2));
    /// assert_eq!(list.delete_node_by_index(9), None);
    /// assert_eq!(list.to_vec(), [0, 1, 3]);
    /// ```
    pub fn delete_node_by_index(&self, index: usize) -> Option<T> {
        let mut chain = self.chain.write();
        let removed = chain.remove_at(index);
        if removed.is_none() {
            tracing::trace!(index, len = chain.len(), "index out of range, list untouched");
        }
        removed
    }

    /// Returns `true` if the list contains no nodes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of nodes in the list.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Walks the whole list and checks that the cached length and the last
    /// node pointer match what is actually reachable from the head.
    ///
    /// This is a verification aid, O(n) under the shared lock.
    pub fn check_consistency(&self) -> bool {
        let guard = self.read();
        match guard.chain.verify() {
            Ok(()) => true,
            Err(counted) => {
                tracing::warn!(counted, cached = guard.len(), "list is inconsistent");
                false
            }
        }
    }

    /// Locks the list for reading and returns a guard to inspect it.
    ///
    /// The shared lock is held until the guard is dropped, so writers block
    /// for that long. Readers, including ones on the thread holding the guard,
    /// still get through: the lock is taken with `read_recursive`, which does
    /// not queue behind a waiting writer.
    ///
    /// # Examples
    ///
    /// ```
    /// use finelock::List;
    ///
    /// let list: List<_> = (1..=3).collect();
    /// let guard = list.read();
    /// let sum: i32 = guard.iter().sum();
    /// assert_eq!(sum, 6);
    /// ```
    pub fn read(&self) -> ReadGuard<'_, T> {
        ReadGuard { chain: self.chain.read_recursive() }
    }
}

impl<T: PartialEq> List<T> {
    /// Removes every node equal to `value` and returns how many were removed.
    ///
    /// # Examples
    ///
    /// ```
    /// use finelock::List;
    ///
    /// let list: List<_> = [3, 3, 1, 3, 2, 3].into_iter().collect();
    /// assert_eq!(list.delete_nodes_by_value(&3), 4);
    /// assert_eq!(list.to_vec(), [1, 2]);
    /// ```
    pub fn delete_nodes_by_value(&self, value: &T) -> usize {
        let mut chain = self.chain.write();
        let removed = chain.remove_if(|other| other == value);
        tracing::trace!(removed, len = chain.len(), "deleted nodes by value");
        removed
    }
}

impl<T: Clone> List<T> {
    /// Clones the values into a vector, head first.
    pub fn to_vec(&self) -> Vec<T> {
        self.read().iter().cloned().collect()
    }
}

impl<T: Display> List<T> {
    /// Prints the list to the standard output, as in `1 -> 2 -> nil`.
    pub fn print_list(&self) {
        println!("{self}");
    }
}

impl<T> Drop for List<T> {
    fn drop(&mut self) {
        let released = self.chain.write().clear();
        tracing::trace!(released, "list released");
    }
}

impl<T> Default for List<T> {
    /// Creates an empty `List<T>`.
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<T> for List<T> {
    /// Creates a list holding the values in iteration order.
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_chain(iter.into_iter().collect())
    }
}

impl<T> Extend<T> for List<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let mut chain = self.chain.write();
        iter.into_iter().for_each(|value| chain.push_back(value));
    }
}

impl<T: Debug> Debug for List<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.read(), f)
    }
}

impl<T: Display> Display for List<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.read(), f)
    }
}

/// An RAII implementation of a shared lock over a [`List`]. When this
/// structure is dropped (falls out of scope), the lock is released.
///
/// This structure is returned by the [`read`] method on [`List`].
///
/// [`read`]: List::read
#[must_use = "if unused the List will immediately unlock"]
pub struct ReadGuard<'a, T> {
    chain: RwLockReadGuard<'a, Chain<T>>,
}

impl<T> ReadGuard<'_, T> {
    /// Returns an iterator over the values, head first.
    ///
    /// The iterator visits every value once and then ends.
    pub fn iter(&self) -> Iter<'_, T> {
        self.chain.iter()
    }

    /// Returns the number of nodes in the list.
    pub fn len(&self) -> usize {
        self.chain.len()
    }

    /// Returns `true` if the list contains no nodes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<'b, T> IntoIterator for &'b ReadGuard<'_, T> {
    type Item = &'b T;
    type IntoIter = Iter<'b, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: Debug> Debug for ReadGuard<'_, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: Display> Display for ReadGuard<'_, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for value in self.iter() {
            write!(f, "{value} -> ")?;
        }
        f.write_str("nil")
    }
}

#[cfg(all(not(loom), test))]
mod test {
    use std::collections::VecDeque;

    use proptest::prelude::*;

    use crate::test::tests;
    use crate::List;

    #[test]
    fn concurrent_append() {
        tests::concurrent_append();
    }

    #[test]
    fn concurrent_prepend() {
        tests::concurrent_prepend();
    }

    #[test]
    fn append_then_delete_by_value() {
        tests::append_then_delete_by_value();
    }

    #[test]
    fn readers_and_writers() {
        tests::readers_and_writers();
    }

    #[test]
    fn readers_nest_past_a_waiting_writer() {
        tests::readers_nest_past_a_waiting_writer();
    }

    #[test]
    fn delete_by_index_out_of_range_is_noop() {
        let list: List<_> = (0..3).collect();
        assert_eq!(list.delete_node_by_index(3), None);
        assert_eq!(list.to_vec(), [0, 1, 2]);
        assert_eq!(list.len(), 3);
        assert!(list.check_consistency());
        let empty = List::<i32>::new();
        assert_eq!(empty.delete_node_by_index(0), None);
        assert!(empty.is_empty());
    }

    #[test]
    fn delete_last_node_then_append() {
        let list: List<_> = (0..3).collect();
        assert_eq!(list.delete_node_by_index(2), Some(2));
        list.append_node(7);
        assert_eq!(list.to_vec(), [0, 1, 7]);
        assert!(list.check_consistency());
    }

    #[test]
    fn delete_by_value_removes_all() {
        let list: List<_> = [4, 4, 4].into_iter().collect();
        assert_eq!(list.delete_nodes_by_value(&4), 3);
        assert!(list.is_empty());
        assert!(list.check_consistency());
        assert_eq!(list.delete_nodes_by_value(&4), 0);
        list.prepend_node(1);
        assert_eq!(list.to_vec(), [1]);
    }

    #[test]
    fn display_and_debug() {
        let list: List<_> = (1..=3).collect();
        assert_eq!(list.to_string(), "1 -> 2 -> 3 -> nil");
        assert_eq!(format!("{list:?}"), "[1, 2, 3]");
        assert_eq!(List::<i32>::new().to_string(), "nil");
    }

    #[test]
    fn read_guard_iterates_once() {
        let list: List<_> = (0..5).collect();
        let guard = list.read();
        let mut iter = guard.iter();
        assert_eq!(iter.len(), 5);
        assert_eq!(iter.by_ref().copied().collect::<Vec<_>>(), [0, 1, 2, 3, 4]);
        assert_eq!(iter.next(), None);
        let doubled: Vec<_> = (&guard).into_iter().map(|v| v * 2).collect();
        assert_eq!(doubled, [0, 2, 4, 6, 8]);
    }

    #[test]
    fn extend_appends() {
        let mut list: List<_> = (0..2).collect();
        list.extend(2..4);
        assert_eq!(list.to_vec(), [0, 1, 2, 3]);
        assert!(list.check_consistency());
    }

    #[test]
    fn print_list_does_not_panic() {
        let list: List<_> = (0..3).collect();
        list.print_list();
    }

    #[derive(Clone, Debug)]
    enum Op {
        Prepend(u8),
        Append(u8),
        DeleteValue(u8),
        DeleteIndex(usize),
    }

    fn op() -> impl Strategy<Value = Op> {
        // Small value and index domains, so deletions actually hit.
        prop_oneof![
            (0..8u8).prop_map(Op::Prepend),
            (0..8u8).prop_map(Op::Append),
            (0..8u8).prop_map(Op::DeleteValue),
            (0..12usize).prop_map(Op::DeleteIndex),
        ]
    }

    proptest! {
        #[test]
        fn matches_vec_deque_model(ops in proptest::collection::vec(op(), 0..64)) {
            let list = List::new();
            let mut model = VecDeque::new();
            for op in ops {
                match op {
                    Op::Prepend(v) => {
                        list.prepend_node(v);
                        model.push_front(v);
                    }
                    Op::Append(v) => {
                        list.append_node(v);
                        model.push_back(v);
                    }
                    Op::DeleteValue(v) => {
                        let before = model.len();
                        model.retain(|other| *other != v);
                        prop_assert_eq!(list.delete_nodes_by_value(&v), before - model.len());
                    }
                    Op::DeleteIndex(i) => {
                        prop_assert_eq!(list.delete_node_by_index(i), model.remove(i));
                    }
                }
                prop_assert!(list.check_consistency());
                prop_assert_eq!(list.len(), model.len());
                prop_assert_eq!(list.is_empty(), model.is_empty());
            }
            prop_assert_eq!(list.to_vec(), Vec::from(model));
        }
    }
}

#[cfg(all(loom, test))]
mod model {
    use crate::loom::models;

    #[test]
    fn writers_exclude_readers() {
        models::writers_exclude_readers();
    }

    #[test]
    fn concurrent_deletes() {
        models::concurrent_deletes();
    }
}
