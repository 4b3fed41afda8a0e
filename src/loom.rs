pub mod models {
    use std::collections::HashSet;

    use loom::{model, thread};

    use crate::cfg::sync::Arc;
    use crate::test::{drain, produce, Fifo, Int};
    use crate::List;

    /// Evaluates that a pop racing with a push either sees the value or sees an
    /// empty queue, and that the value is never lost nor observed twice.
    pub fn push_pop_race<Q>()
    where
        Q: Fifo<Item = Int> + Send + Sync + 'static,
    {
        model(|| {
            let queue = Arc::new(Q::new());
            let c_queue = Arc::clone(&queue);
            let handle = thread::spawn(move || c_queue.push(1));
            let popped = queue.try_pop();
            handle.join().unwrap();
            let rest = drain(&*queue);
            match popped {
                Some(value) => {
                    assert_eq!(value, 1);
                    assert!(rest.is_empty());
                }
                None => assert_eq!(rest, [1]),
            }
        });
    }

    /// Evaluates that values from each producer are popped in push order,
    /// while a consumer runs concurrently with both producers.
    pub fn producers_preserve_order<Q>()
    where
        Q: Fifo<Item = (Int, Int)> + Send + Sync + 'static,
    {
        model(|| {
            let queue = Arc::new(Q::new());
            let handles = [(0, 2), (1, 1)].map(|(producer, count)| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || produce(&queue, producer, count))
            });
            let mut values: Vec<_> = queue.try_pop().into_iter().collect();
            for handle in handles {
                handle.join().unwrap();
            }
            values.extend(drain(&*queue));
            assert_eq!(values.len(), 3);
            let first: Vec<_> = values.iter().filter(|(p, _)| *p == 0).map(|(_, s)| *s).collect();
            assert_eq!(first, [0, 1]);
        });
    }

    /// Evaluates that concurrent consumers split the queued values between
    /// them, with no value popped twice.
    pub fn consumers_split_values<Q>()
    where
        Q: Fifo<Item = Int> + Send + Sync + 'static,
    {
        model(|| {
            let queue = Arc::new(Q::new());
            queue.push(0);
            queue.push(1);
            let handles = [(); 2].map(|()| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || queue.try_pop())
            });
            let popped: Vec<_> = handles.into_iter().filter_map(|h| h.join().unwrap()).collect();
            let unique: HashSet<_> = popped.iter().copied().collect();
            assert_eq!(popped.len(), 2);
            assert_eq!(unique, HashSet::from([0, 1]));
            assert!(queue.try_pop().is_none());
        });
    }

    /// Evaluates that a reader never observes a writer half way through a
    /// structural change.
    pub fn writers_exclude_readers() {
        model(|| {
            let list = Arc::new(List::new());
            list.append_node(0);
            let appender = {
                let list = Arc::clone(&list);
                thread::spawn(move || list.append_node(1))
            };
            let deleter = {
                let list = Arc::clone(&list);
                thread::spawn(move || list.delete_nodes_by_value(&0))
            };
            assert!(list.check_consistency());
            appender.join().unwrap();
            assert_eq!(deleter.join().unwrap(), 1);
            assert!(list.check_consistency());
            assert_eq!(list.to_vec(), [1]);
        });
    }

    /// Evaluates that deletions by index and by value commute on a list where
    /// they touch different nodes.
    pub fn concurrent_deletes() {
        model(|| {
            let list: Arc<List<Int>> = Arc::new((0..3).collect());
            let by_index = {
                let list = Arc::clone(&list);
                thread::spawn(move || list.delete_node_by_index(0))
            };
            let by_value = {
                let list = Arc::clone(&list);
                thread::spawn(move || list.delete_nodes_by_value(&2))
            };
            assert_eq!(by_index.join().unwrap(), Some(0));
            assert_eq!(by_value.join().unwrap(), 1);
            assert!(list.check_consistency());
            assert_eq!(list.to_vec(), [1]);
        });
    }
}
