use core::iter::FusedIterator;
use core::marker::PhantomData;
use core::ptr::NonNull;

/// A link to the next node, `None` at the end of the chain.
type Link<T> = Option<NonNull<Node<T>>>;

/// The heap allocated list node.
struct Node<T> {
    value: T,
    next: Link<T>,
}

impl<T> Node<T> {
    /// Allocates a new node and returns a leaked pointer to it.
    ///
    /// Caller is responsible for freeing the node.
    fn alloc(value: T, next: Link<T>) -> NonNull<Self> {
        let ptr = Box::into_raw(Box::new(Self { value, next }));
        // SAFETY: The returned `ptr` is guarenteed to be properly aligned and
        // non-null by the `Box::into_raw` function contract.
        unsafe { NonNull::new_unchecked(ptr) }
    }

    /// Reclaims ownership of a node that has been unlinked from the chain.
    ///
    /// # Safety
    ///
    /// The pointer must have been returned by [`Node::alloc`], and it must no
    /// longer be reachable from any chain.
    unsafe fn reclaim(node: NonNull<Self>) -> Box<Self> {
        // SAFETY: Caller guaranteed the Box allocation and unique ownership.
        unsafe { Box::from_raw(node.as_ptr()) }
    }
}

/// An unsynchronized singly linked chain with a cached tail and length.
///
/// `head` owns the first node and every node owns its successor. `tail` is a
/// non-owning pointer to the last node. Every method leaves `head`, `tail` and
/// `len` consistent before it drops a removed value, so a panic out of
/// `PartialEq` or `Drop` never exposes a torn chain.
pub struct Chain<T> {
    head: Link<T>,
    tail: Link<T>,
    len: usize,
    marker: PhantomData<Box<Node<T>>>,
}

// SAFETY: The chain owns its nodes exclusively, the same as a `Box<T>` chain.
unsafe impl<T: Send> Send for Chain<T> {}
unsafe impl<T: Sync> Sync for Chain<T> {}

impl<T> Chain<T> {
    /// Creates an empty chain.
    pub const fn new() -> Self {
        Self { head: None, tail: None, len: 0, marker: PhantomData }
    }

    /// The cached number of nodes.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Inserts `value` in front of the current head.
    pub fn push_front(&mut self, value: T) {
        let node = Node::alloc(value, self.head);
        if self.head.is_none() {
            self.tail = Some(node);
        }
        self.head = Some(node);
        self.len += 1;
    }

    /// Inserts `value` after the current tail.
    pub fn push_back(&mut self, value: T) {
        let node = Node::alloc(value, None);
        match self.tail {
            // SAFETY: The tail always points to a live node owned by this
            // chain, and `&mut self` gives us exclusive access to it.
            Some(mut tail) => unsafe { tail.as_mut().next = Some(node) },
            None => self.head = Some(node),
        }
        self.tail = Some(node);
        self.len += 1;
    }

    /// Removes every node whose value matches `f`, returning how many were
    /// removed.
    pub fn remove_if<F>(&mut self, mut f: F) -> usize
    where
        F: FnMut(&T) -> bool,
    {
        let mut removed = 0;
        // Leading run, the head moves along with it.
        while let Some(node) = self.head {
            // SAFETY: Nodes reachable from the head are live and owned by the
            // chain.
            if !f(unsafe { &node.as_ref().value }) {
                break;
            }
            // SAFETY: Same as above.
            self.head = unsafe { node.as_ref().next };
            if self.head.is_none() {
                self.tail = None;
            }
            self.len -= 1;
            removed += 1;
            // SAFETY: The node has just been unlinked from the head.
            drop(unsafe { Node::reclaim(node) });
        }
        let Some(mut prev) = self.head else {
            return removed;
        };
        // SAFETY: `prev` is always a live node kept in the chain.
        while let Some(node) = unsafe { prev.as_ref().next } {
            // SAFETY: Nodes reachable from the head are live and owned by the
            // chain.
            if f(unsafe { &node.as_ref().value }) {
                // SAFETY: `&mut self` gives us exclusive access to both nodes.
                unsafe { prev.as_mut().next = node.as_ref().next };
                if self.tail == Some(node) {
                    self.tail = Some(prev);
                }
                self.len -= 1;
                removed += 1;
                // SAFETY: The node has just been unlinked from `prev`.
                drop(unsafe { Node::reclaim(node) });
            } else {
                prev = node;
            }
        }
        removed
    }

    /// Removes the node at the 0-based `index`, if it exists.
    pub fn remove_at(&mut self, index: usize) -> Option<T> {
        if index >= self.len {
            return None;
        }
        let node = if index == 0 {
            let node = self.head?;
            // SAFETY: The head is a live node owned by the chain.
            self.head = unsafe { node.as_ref().next };
            if self.head.is_none() {
                self.tail = None;
            }
            node
        } else {
            let mut prev = self.head?;
            for _ in 1..index {
                // SAFETY: `index < len`, so every node up to `index - 1` is
                // live and has a successor.
                prev = unsafe { prev.as_ref().next }?;
            }
            // SAFETY: `prev` sits at `index - 1 < len - 1`, so it has a
            // successor.
            let node = unsafe { prev.as_ref().next }?;
            // SAFETY: `&mut self` gives us exclusive access to both nodes.
            unsafe { prev.as_mut().next = node.as_ref().next };
            if self.tail == Some(node) {
                self.tail = Some(prev);
            }
            node
        };
        self.len -= 1;
        // SAFETY: The node has just been unlinked from the chain.
        let node = unsafe { Node::reclaim(node) };
        Some(node.value)
    }

    /// Walks the chain and checks that the cached length and tail match the
    /// nodes actually reachable from the head.
    ///
    /// Returns the number of reachable nodes in the error case.
    pub fn verify(&self) -> Result<(), usize> {
        let mut count = 0;
        let mut last = None;
        let mut cursor = self.head;
        while let Some(node) = cursor {
            count += 1;
            last = Some(node);
            // SAFETY: Nodes reachable from the head are live and owned by the
            // chain.
            cursor = unsafe { node.as_ref().next };
        }
        if count == self.len && last == self.tail {
            Ok(())
        } else {
            Err(count)
        }
    }

    /// Returns an iterator over shared references to the values, head first.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter { next: self.head, remaining: self.len, marker: PhantomData }
    }

    /// Frees every node, returning how many were released.
    pub fn clear(&mut self) -> usize {
        let released = self.len;
        let mut cursor = self.head.take();
        self.tail = None;
        self.len = 0;
        while let Some(node) = cursor {
            // SAFETY: The whole chain was detached from the head above, each
            // node is reclaimed exactly once while walking it.
            let boxed = unsafe { Node::reclaim(node) };
            cursor = boxed.next;
        }
        released
    }
}

impl<T> Drop for Chain<T> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T> FromIterator<T> for Chain<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut chain = Self::new();
        iter.into_iter().for_each(|value| chain.push_back(value));
        chain
    }
}

/// An iterator over the values of a list, from head to tail.
///
/// This struct is created by [`ReadGuard::iter`]. The shared lock is held by
/// the guard for as long as the iterator lives.
///
/// The iterator is single-pass and cannot be cloned to replay it from a saved
/// position; call [`ReadGuard::iter`] again for a fresh pass.
///
/// ```compile_fail
/// use finelock::List;
///
/// let list: List<_> = (0..3).collect();
/// let guard = list.read();
/// fn replay<I: Clone + Iterator>(iter: &I) -> I {
///     iter.clone()
/// }
///
/// let mut iter = guard.iter();
/// iter.next();
/// let _ = replay(&iter);
/// ```
///
/// [`ReadGuard::iter`]: crate::ReadGuard::iter
pub struct Iter<'a, T> {
    next: Link<T>,
    remaining: usize,
    marker: PhantomData<&'a T>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.next?;
        self.remaining = self.remaining.saturating_sub(1);
        // SAFETY: The iterator borrows the chain for `'a`, which keeps every
        // node alive and unmodified for that long.
        let node = unsafe { &*node.as_ptr() };
        self.next = node.next;
        Some(&node.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}

// SAFETY: The iterator only hands out `&T`, the same as `core::slice::Iter`.
unsafe impl<T: Sync> Send for Iter<'_, T> {}
unsafe impl<T: Sync> Sync for Iter<'_, T> {}

#[cfg(all(not(loom), test))]
mod test {
    use super::Chain;

    fn values(chain: &Chain<u32>) -> Vec<u32> {
        chain.iter().copied().collect()
    }

    #[test]
    fn push_front_and_back() {
        let mut chain = Chain::new();
        chain.push_back(2);
        chain.push_front(1);
        chain.push_back(3);
        assert_eq!(values(&chain), [1, 2, 3]);
        assert_eq!(chain.len(), 3);
        assert_eq!(chain.verify(), Ok(()));
    }

    #[test]
    fn remove_if_leading_run_and_tail() {
        let mut chain: Chain<u32> = [7, 7, 1, 7, 2, 7].into_iter().collect();
        assert_eq!(chain.remove_if(|v| *v == 7), 4);
        assert_eq!(values(&chain), [1, 2]);
        assert_eq!(chain.verify(), Ok(()));
        // The tail moved back to `2`, appending must land after it.
        chain.push_back(3);
        assert_eq!(values(&chain), [1, 2, 3]);
        assert_eq!(chain.verify(), Ok(()));
    }

    #[test]
    fn remove_if_everything() {
        let mut chain: Chain<u32> = [5, 5, 5].into_iter().collect();
        assert_eq!(chain.remove_if(|v| *v == 5), 3);
        assert_eq!(chain.len(), 0);
        assert!(chain.iter().next().is_none());
        assert_eq!(chain.verify(), Ok(()));
        chain.push_back(1);
        assert_eq!(values(&chain), [1]);
    }

    #[test]
    fn remove_at_positions() {
        let mut chain: Chain<u32> = (0..5).collect();
        assert_eq!(chain.remove_at(4), Some(4));
        assert_eq!(chain.remove_at(0), Some(0));
        assert_eq!(chain.remove_at(1), Some(2));
        assert_eq!(values(&chain), [1, 3]);
        assert_eq!(chain.verify(), Ok(()));
        chain.push_back(9);
        assert_eq!(values(&chain), [1, 3, 9]);
    }

    #[test]
    fn remove_at_last_element_resets_tail() {
        let mut chain = Chain::new();
        chain.push_back(1);
        assert_eq!(chain.remove_at(0), Some(1));
        assert_eq!(chain.verify(), Ok(()));
        chain.push_back(2);
        assert_eq!(values(&chain), [2]);
    }

    #[test]
    fn remove_at_out_of_range() {
        let mut chain: Chain<u32> = (0..3).collect();
        assert_eq!(chain.remove_at(3), None);
        assert_eq!(chain.remove_at(usize::MAX), None);
        assert_eq!(values(&chain), [0, 1, 2]);
        let mut empty = Chain::<u32>::new();
        assert_eq!(empty.remove_at(0), None);
    }

    #[test]
    fn verify_reports_count_on_mismatch() {
        let mut chain: Chain<u32> = (0..3).collect();
        chain.len = 5;
        assert_eq!(chain.verify(), Err(3));
        chain.len = 3;
        chain.tail = chain.head;
        assert_eq!(chain.verify(), Err(3));
        assert_eq!(chain.clear(), 3);
    }

    #[test]
    fn iter_is_exact_size() {
        let chain: Chain<u32> = (0..4).collect();
        let mut iter = chain.iter();
        assert_eq!(iter.len(), 4);
        iter.next();
        assert_eq!(iter.len(), 3);
        assert_eq!(iter.by_ref().count(), 3);
        assert!(iter.next().is_none());
    }

    #[test]
    fn long_chain_drops_without_recursion() {
        let chain: Chain<u32> = (0..200_000).collect();
        drop(chain);
    }
}
