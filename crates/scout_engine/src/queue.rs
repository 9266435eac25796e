//! Ordered hand-off between the discovery worker and the batch writer.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use scout_core::{next_batch, Batch, BatchPolicy, Record};
use tokio::sync::Notify;

use crate::QueueClosed;

#[derive(Debug, Default)]
struct QueueState {
    items: VecDeque<Record>,
    closed: bool,
}

#[derive(Debug)]
struct Shared {
    state: Mutex<QueueState>,
    changed: Notify,
    capacity: usize,
}

/// FIFO record queue with a capacity limit.
///
/// `put` suspends while the queue is at capacity. Consumers wake on every
/// change instead of polling. After [`close`](RecordQueue::close) producers
/// get their record back as [`QueueClosed`] and consumers drain what is left.
#[derive(Debug, Clone)]
pub struct RecordQueue {
    shared: Arc<Shared>,
}

impl RecordQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(QueueState::default()),
                changed: Notify::new(),
                capacity: capacity.max(1),
            }),
        }
    }

    pub fn unbounded() -> Self {
        Self::new(usize::MAX)
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Stop accepting records; pending ones stay available to consumers.
    pub fn close(&self) {
        self.lock().closed = true;
        self.shared.changed.notify_waiters();
    }

    pub async fn put(&self, record: Record) -> Result<(), QueueClosed> {
        let capacity = self.shared.capacity;
        let mut slot = Some(record);
        self.wait_until(|state| {
            let record = slot.take()?;
            if state.closed {
                return Some(Err(QueueClosed(record)));
            }
            if state.items.len() < capacity {
                state.items.push_back(record);
                return Some(Ok(()));
            }
            slot = Some(record);
            None
        })
        .await
    }

    /// Next record in FIFO order; `None` once closed and empty.
    pub async fn get(&self) -> Option<Record> {
        self.wait_until(|state| match state.items.pop_front() {
            Some(record) => Some(Some(record)),
            None if state.closed => Some(None),
            None => None,
        })
        .await
    }

    /// Wait for the next batch `policy` allows. Once the queue is closed the
    /// remainder is flushed in short batches; `None` means closed and drained.
    /// A full queue also releases a short batch, since no producer could
    /// ever complete it.
    pub async fn next_batch(&self, size: usize, policy: BatchPolicy) -> Option<Batch> {
        let capacity = self.shared.capacity;
        self.wait_until(|state| {
            let flush = state.closed || state.items.len() >= capacity;
            match next_batch(&mut state.items, size, policy, flush) {
                Some(batch) => Some(Some(batch)),
                None if state.closed && state.items.is_empty() => Some(None),
                None => None,
            }
        })
        .await
    }

    /// Run `attempt` under the lock until it yields a value, sleeping on the
    /// change notification in between. Waiters are registered before the
    /// check so a change between check and sleep is never missed.
    async fn wait_until<T>(&self, mut attempt: impl FnMut(&mut QueueState) -> Option<T>) -> T {
        loop {
            let notified = self.shared.changed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let outcome = {
                let mut state = self.lock();
                attempt(&mut state)
            };
            if let Some(value) = outcome {
                self.shared.changed.notify_waiters();
                return value;
            }
            notified.await;
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
