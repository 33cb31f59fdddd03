// src/queue/memory.rs
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::Notify;

use super::MessageQueue;
use crate::error::QueueError;

/// In-process FIFO queue. Closing it lets consumers drain what is left and stop.
pub struct MemoryQueue {
    name: String,
    items: Mutex<VecDeque<Vec<u8>>>,
    ready: Notify,
    closed: AtomicBool,
}

impl MemoryQueue {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            items: Mutex::new(VecDeque::new()),
            ready: Notify::new(),
            closed: AtomicBool::new(false),
        }
    }

    /// Reject further publishes; consumers see `None` after the backlog.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.ready.notify_waiters();
        self.ready.notify_one();
    }

    pub fn len(&self) -> usize {
        self.items.lock().map(|q| q.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn pop(&self) -> Option<Vec<u8>> {
        self.items.lock().ok().and_then(|mut q| q.pop_front())
    }
}

#[async_trait]
impl MessageQueue for MemoryQueue {
    async fn publish(&self, body: Vec<u8>) -> Result<(), QueueError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(QueueError::Closed);
        }
        self.items
            .lock()
            .map_err(|_| QueueError::Closed)?
            .push_back(body);
        self.ready.notify_one();
        Ok(())
    }

    async fn try_receive(&self) -> Result<Option<Vec<u8>>, QueueError> {
        Ok(self.pop())
    }

    async fn wait(&self) {
        let notified = self.ready.notified();
        tokio::pin!(notified);
        // Register before checking so a publish or close in between still wakes us.
        notified.as_mut().enable();
        if self.is_closed() || !self.is_empty() {
            return;
        }
        notified.await;
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
