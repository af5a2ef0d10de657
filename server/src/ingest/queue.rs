use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use tokio::sync::Notify;

use super::RawEvent;

/// Unbounded FIFO queue shared between producers (request handlers) and
/// the single batch worker. Pushing never blocks and carries no
/// backpressure signal; each item is handed to exactly one drain.
#[derive(Clone, Default)]
pub struct EventQueue {
    inner: Arc<Mutex<VecDeque<RawEvent>>>,
    notify: Arc<Notify>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(VecDeque::new())),
            notify: Arc::new(Notify::new()),
        }
    }

    pub fn push(&self, event: RawEvent) {
        {
            let mut queue = self.inner.lock().unwrap();
            queue.push_back(event);
        }
        self.notify.notify_one();
    }

    /// Atomically remove exactly `n` items, oldest first. Returns `None`
    /// when fewer than `n` items are queued.
    pub fn take_batch(&self, n: usize) -> Option<Vec<RawEvent>> {
        let mut queue = self.inner.lock().unwrap();
        if queue.len() < n {
            return None;
        }
        Some(queue.drain(..n).collect())
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().is_empty()
    }

    /// Wait until a producer pushes. The worker combines this with its
    /// poll interval so a missed notification only delays one tick.
    pub(crate) async fn notified(&self) {
        self.notify.notified().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::common::raw_event;

    #[test]
    fn test_take_batch_is_fifo() {
        let queue = EventQueue::new();
        for i in 0..10 {
            queue.push(raw_event(i));
        }

        let batch = queue.take_batch(4).unwrap();
        let queries: Vec<_> = batch.iter().map(|e| e.query.as_str()).collect();
        assert_eq!(queries, vec!["query 0", "query 1", "query 2", "query 3"]);

        let batch = queue.take_batch(4).unwrap();
        assert_eq!(batch[0].query, "query 4");
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_take_batch_below_threshold() {
        let queue = EventQueue::new();
        for i in 0..3 {
            queue.push(raw_event(i));
        }

        // Not enough for a batch of 4; nothing is removed
        assert!(queue.take_batch(4).is_none());
        assert_eq!(queue.len(), 3);
    }

    #[test]
    fn test_concurrent_producers() {
        let queue = EventQueue::new();

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let queue = queue.clone();
                std::thread::spawn(move || {
                    for i in 0..50 {
                        queue.push(raw_event(t * 100 + i));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(queue.len(), 400);
    }
}
