//! Document queue
//!
//! A FIFO shared between producers (a file reader, a stdin listener) and the
//! single consumer that dequeues from it. Access is serialized by a mutex;
//! the consumer suspends on a [`Notify`] while the queue is empty.
//!
//! A bounded queue refuses new items when full instead of dropping them.
//! Producers close the queue once their stream ends.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::Notify;

use crate::error::{ConfigError, QueueError};

#[derive(Debug)]
struct Inner<T> {
    items: Mutex<VecDeque<T>>,
    capacity: Option<usize>,
    closed: AtomicBool,
    notify: Notify,
}

/// Thread-safe FIFO with an optional capacity; clones share the same queue
#[derive(Debug)]
pub struct DocumentQueue<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for DocumentQueue<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for DocumentQueue<T> {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl<T> DocumentQueue<T> {
    pub fn unbounded() -> Self {
        Self::with_capacity(None)
    }

    /// Queue holding at most `capacity` items
    pub fn bounded(capacity: usize) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::NonPositive {
                field: "queue.capacity",
                value: 0.0,
            });
        }
        Ok(Self::with_capacity(Some(capacity)))
    }

    fn with_capacity(capacity: Option<usize>) -> Self {
        Self {
            inner: Arc::new(Inner {
                items: Mutex::new(VecDeque::new()),
                capacity,
                closed: AtomicBool::new(false),
                notify: Notify::new(),
            }),
        }
    }

    fn items(&self) -> MutexGuard<'_, VecDeque<T>> {
        // A panicking producer cannot leave the deque half-written
        self.inner
            .items
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn capacity(&self) -> Option<usize> {
        self.inner.capacity
    }

    /// Append an item to the back of the queue
    pub fn enqueue(&self, item: T) -> Result<(), QueueError> {
        if self.is_closed() {
            return Err(QueueError::Closed);
        }
        {
            let mut items = self.items();
            if let Some(capacity) = self.inner.capacity {
                if items.len() >= capacity {
                    return Err(QueueError::Full { capacity });
                }
            }
            items.push_back(item);
        }
        self.inner.notify.notify_one();
        Ok(())
    }

    /// Remove the item at the front of the queue
    pub fn dequeue(&self) -> Option<T> {
        self.items().pop_front()
    }

    /// Remove every queued item, oldest first
    pub fn dequeue_all(&self) -> Vec<T> {
        self.items().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }

    /// Mark the end of the stream; queued items can still be dequeued
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
        self.inner.notify.notify_one();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Closed and fully drained
    pub fn is_exhausted(&self) -> bool {
        self.is_closed() && self.is_empty()
    }

    /// Wake a consumer suspended in [`wait_for_input`](Self::wait_for_input)
    pub fn wake(&self) {
        self.inner.notify.notify_one();
    }

    /// Suspend until items are available, the queue is woken, or `timeout` elapses
    ///
    /// Returns whether items are available.
    pub async fn wait_for_input(&self, timeout: Duration) -> bool {
        if !self.is_empty() {
            return true;
        }
        if !self.is_closed() {
            let _ = tokio::time::timeout(timeout, self.inner.notify.notified()).await;
        }
        !self.is_empty()
    }
}

impl<T: Clone> DocumentQueue<T> {
    /// Copy of the oldest item
    pub fn head(&self) -> Option<T> {
        self.items().front().cloned()
    }

    /// Copy of the newest item
    pub fn tail(&self) -> Option<T> {
        self.items().back().cloned()
    }
}
