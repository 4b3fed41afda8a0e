use core::iter;

use crate::cfg::sync::Arc;

/// A trait for FIFO types that can be shared among threads.
pub trait Fifo {
    /// The type of the values this queue holds.
    type Item;

    /// Creates a new, empty queue.
    fn new() -> Self;

    /// Appends a value at the producer end.
    fn push(&self, value: Self::Item);

    /// Removes a value from the consumer end, if there is any.
    fn try_pop(&self) -> Option<Self::Item>;
}

/// Pops values until the queue reports empty.
pub fn drain<Q: Fifo>(queue: &Q) -> Vec<Q::Item> {
    iter::from_fn(|| queue.try_pop()).collect()
}

/// Pushes `count` values tagged with the `producer` id, in sequence order.
pub fn produce<Q: Fifo<Item = (Int, Int)>>(queue: &Arc<Q>, producer: Int, count: Int) {
    for seq in 0..count {
        queue.push((producer, seq));
    }
}

/// An arbitrary unsigned integer type.
pub type Int = u32;

#[cfg(all(not(loom), test))]
pub mod tests {
    use std::collections::{HashSet, VecDeque};
    use std::sync::{mpsc, Arc, Barrier};
    use std::thread;
    use std::time::Duration;

    use parking_lot::Mutex;

    use super::{drain, produce, Fifo, Int};
    use crate::List;

    const ITERS: Int = 1000;
    const CONCURRENCY: Int = 4;

    /// The coarse, single lock queue the fine-grained one is checked against.
    pub type Coarse<T> = Mutex<VecDeque<T>>;

    impl<T> Fifo for Coarse<T> {
        type Item = T;

        fn new() -> Self {
            Mutex::new(VecDeque::new())
        }

        fn push(&self, value: T) {
            self.lock().push_back(value);
        }

        fn try_pop(&self) -> Option<T> {
            self.lock().pop_front()
        }
    }

    /// Asserts that every producer's values show up in the order they were
    /// pushed, and that no value is lost or duplicated.
    fn assert_per_producer_order(values: &[(Int, Int)], producers: Int, count: Int) {
        let mut next = vec![0; producers as usize];
        for &(producer, seq) in values {
            let expected = &mut next[producer as usize];
            assert_eq!(*expected, seq, "producer {producer} out of order");
            *expected += 1;
        }
        assert!(next.iter().all(|&seen| seen == count));
    }

    pub fn smoke<Q: Fifo<Item = Int>>() {
        let queue = Q::new();
        assert_eq!(queue.try_pop(), None);
        queue.push(1);
        queue.push(2);
        assert_eq!(queue.try_pop(), Some(1));
        queue.push(3);
        assert_eq!(drain(&queue), [2, 3]);
        assert_eq!(queue.try_pop(), None);
    }

    pub fn pop_empty_is_idempotent<Q: Fifo<Item = Int>>() {
        let queue = Q::new();
        for _ in 0..10 {
            assert_eq!(queue.try_pop(), None);
        }
        queue.push(7);
        assert_eq!(queue.try_pop(), Some(7));
        for _ in 0..10 {
            assert_eq!(queue.try_pop(), None);
        }
    }

    pub fn fifo_single_producer_consumer<Q>()
    where
        Q: Fifo<Item = (Int, Int)> + Send + Sync + 'static,
    {
        let queue = Arc::new(Q::new());
        let producer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || produce(&queue, 0, ITERS))
        };
        let mut seen = Vec::with_capacity(ITERS as usize);
        while seen.len() < ITERS as usize {
            match queue.try_pop() {
                Some(value) => seen.push(value),
                None => thread::yield_now(),
            }
        }
        producer.join().unwrap();
        assert_per_producer_order(&seen, 1, ITERS);
        assert!(queue.try_pop().is_none());
    }

    pub fn conservation_of_count<Q>()
    where
        Q: Fifo<Item = (Int, Int)> + Send + Sync + 'static,
    {
        let queue = Arc::new(Q::new());
        let handles: Vec<_> = (0..CONCURRENCY)
            .map(|producer| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || produce(&queue, producer, ITERS))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        let values = drain(&*queue);
        assert_eq!(values.len(), (CONCURRENCY * ITERS) as usize);
        let unique: HashSet<_> = values.iter().collect();
        assert_eq!(unique.len(), values.len());
        assert_per_producer_order(&values, CONCURRENCY, ITERS);
    }

    pub fn producers_and_consumers<Q>()
    where
        Q: Fifo<Item = (Int, Int)> + Send + Sync + 'static,
    {
        let queue = Arc::new(Q::new());
        let barrier = Arc::new(Barrier::new(2 * CONCURRENCY as usize));
        let producers: Vec<_> = (0..CONCURRENCY)
            .map(|producer| {
                let (queue, barrier) = (Arc::clone(&queue), Arc::clone(&barrier));
                thread::spawn(move || {
                    barrier.wait();
                    produce(&queue, producer, ITERS);
                })
            })
            .collect();
        let consumers: Vec<_> = (0..CONCURRENCY)
            .map(|_| {
                let (queue, barrier) = (Arc::clone(&queue), Arc::clone(&barrier));
                thread::spawn(move || {
                    barrier.wait();
                    let mut popped = Vec::new();
                    for _ in 0..ITERS {
                        popped.extend(queue.try_pop());
                    }
                    popped
                })
            })
            .collect();
        for handle in producers {
            handle.join().unwrap();
        }
        let mut values = Vec::new();
        for handle in consumers {
            let popped = handle.join().unwrap();
            // A single consumer still sees each producer in order.
            let mut last = vec![None; CONCURRENCY as usize];
            for &(producer, seq) in &popped {
                let prev = last[producer as usize].replace(seq);
                assert!(prev.map_or(true, |prev| prev < seq));
            }
            values.extend(popped);
        }
        values.extend(drain(&*queue));
        assert_eq!(values.len(), (CONCURRENCY * ITERS) as usize);
        let unique: HashSet<_> = values.iter().collect();
        assert_eq!(unique.len(), values.len());
    }

    pub fn drop_releases_values<Q: Fifo<Item = Arc<()>>>() {
        let value = Arc::new(());
        let queue = Q::new();
        for _ in 0..10 {
            queue.push(Arc::clone(&value));
        }
        drop(queue.try_pop());
        assert_eq!(Arc::strong_count(&value), 10);
        drop(queue);
        assert_eq!(Arc::strong_count(&value), 1);
    }

    /// Spawns `threads` workers running `f(list, id)` and joins them all.
    fn spawn_join<F>(list: &Arc<List<Int>>, threads: Int, f: F)
    where
        F: Fn(&List<Int>, Int) + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        let handles: Vec<_> = (0..threads)
            .map(|id| {
                let (list, f) = (Arc::clone(list), Arc::clone(&f));
                thread::spawn(move || f(&list, id))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
    }

    pub fn concurrent_append() {
        const THREADS: Int = 10;
        const APPENDS: Int = 1000;
        let list = Arc::new(List::new());
        spawn_join(&list, THREADS, |list, id| {
            let start = id * APPENDS;
            (start..start + APPENDS).for_each(|value| list.append_node(value));
        });
        assert_eq!(list.len(), (THREADS * APPENDS) as usize);
        assert!(list.check_consistency());
        let unique: HashSet<_> = list.to_vec().into_iter().collect();
        assert_eq!(unique.len(), (THREADS * APPENDS) as usize);
    }

    pub fn concurrent_prepend() {
        const THREADS: Int = 10;
        const PREPENDS: Int = 500;
        let list = Arc::new(List::new());
        spawn_join(&list, THREADS, |list, id| {
            (0..PREPENDS).for_each(|_| list.prepend_node(id));
        });
        assert_eq!(list.len(), (THREADS * PREPENDS) as usize);
        assert!(list.check_consistency());
    }

    pub fn append_then_delete_by_value() {
        const THREADS: Int = 10;
        const APPENDS: Int = 100;
        let list = Arc::new(List::new());
        spawn_join(&list, THREADS, |list, id| {
            (0..APPENDS).for_each(|_| list.append_node(id));
        });
        assert_eq!(list.len(), (THREADS * APPENDS) as usize);
        spawn_join(&list, THREADS, |list, id| {
            assert_eq!(list.delete_nodes_by_value(&id), APPENDS as usize);
            assert!(list.check_consistency());
        });
        assert!(list.is_empty());
        assert!(list.check_consistency());
    }

    pub fn readers_and_writers() {
        const WRITERS: Int = 5;
        const READERS: Int = 5;
        const OPS: Int = 200;
        let list = Arc::new(List::new());
        let barrier = Arc::new(Barrier::new((WRITERS + READERS) as usize));
        let writers: Vec<_> = (0..WRITERS)
            .map(|id| {
                let (list, barrier) = (Arc::clone(&list), Arc::clone(&barrier));
                thread::spawn(move || {
                    barrier.wait();
                    for op in 0..OPS {
                        let value = id * OPS + op;
                        match op % 4 {
                            0 | 1 => list.append_node(value),
                            2 => list.prepend_node(value),
                            _ => {
                                list.delete_node_by_index(op as usize % 7);
                            }
                        }
                    }
                })
            })
            .collect();
        let readers: Vec<_> = (0..READERS)
            .map(|_| {
                let (list, barrier) = (Arc::clone(&list), Arc::clone(&barrier));
                thread::spawn(move || {
                    barrier.wait();
                    for _ in 0..OPS {
                        let _ = (list.len(), list.is_empty());
                        assert!(list.check_consistency());
                        let guard = list.read();
                        assert_eq!(guard.is_empty(), guard.len() == 0);
                        assert_eq!(guard.iter().count(), guard.len());
                    }
                })
            })
            .collect();
        for handle in writers.into_iter().chain(readers) {
            handle.join().unwrap();
        }
        assert!(list.check_consistency());
    }

    /// A thread holding a read guard calls every reader again while a writer
    /// is parked on the lock. None of them may wait for that writer.
    pub fn readers_nest_past_a_waiting_writer() {
        let list: Arc<List<Int>> = Arc::new((0..3).collect());
        let (held_tx, held_rx) = mpsc::channel();
        let (done_tx, done_rx) = mpsc::channel();
        let reader = {
            let list = Arc::clone(&list);
            thread::spawn(move || {
                let guard = list.read();
                held_tx.send(()).unwrap();
                // Give the writer time to park on the lock.
                thread::sleep(Duration::from_millis(100));
                let seen = (
                    list.len(),
                    list.is_empty(),
                    list.check_consistency(),
                    list.to_vec(),
                    list.to_string(),
                    list.read().len(),
                );
                done_tx.send(seen).unwrap();
                drop(guard);
            })
        };
        held_rx.recv().unwrap();
        let writer = {
            let list = Arc::clone(&list);
            thread::spawn(move || list.append_node(9))
        };
        let seen = done_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("nested reader blocked behind the waiting writer");
        assert_eq!(seen, (3, false, true, vec![0, 1, 2], "0 -> 1 -> 2 -> nil".to_owned(), 3));
        reader.join().unwrap();
        writer.join().unwrap();
        assert_eq!(list.to_vec(), [0, 1, 2, 9]);
        assert!(list.check_consistency());
    }
}
