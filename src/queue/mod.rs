// src/queue/mod.rs
pub mod memory;
pub mod sqlite;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};

use crate::error::QueueError;

pub use memory::MemoryQueue;
pub use sqlite::SqliteQueue;

/// Content type stamped on every published message.
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// A named FIFO queue with auto-acknowledged delivery.
///
/// A body handed out by `try_receive` has already left the queue; nothing is
/// redelivered if the consumer fails afterwards. Callers must not cancel
/// `try_receive` once started. `wait` holds no message and is safe to drop.
#[async_trait::async_trait]
pub trait MessageQueue: Send + Sync {
    async fn publish(&self, body: Vec<u8>) -> Result<(), QueueError>;
    /// Take the head of the queue, if any, without waiting.
    async fn try_receive(&self) -> Result<Option<Vec<u8>>, QueueError>;
    /// Resolve once new messages may be available (or the queue closed).
    async fn wait(&self);
    /// Closed queues accept no publishes; once empty they stay empty.
    fn is_closed(&self) -> bool {
        false
    }
    fn name(&self) -> &str;

    /// Wait for the next body. `Ok(None)` once the queue is closed and empty.
    async fn receive(&self) -> Result<Option<Vec<u8>>, QueueError> {
        loop {
            let closed = self.is_closed();
            if let Some(body) = self.try_receive().await? {
                return Ok(Some(body));
            }
            if closed {
                return Ok(None);
            }
            self.wait().await;
        }
    }
}

/// Open the queue named by `uri` (`sqlite:...` or `memory:`).
pub async fn connect(uri: &str, queue: &str, poll: Duration) -> Result<Arc<dyn MessageQueue>> {
    if uri.starts_with("memory:") {
        return Ok(Arc::new(MemoryQueue::new(queue)));
    }
    if uri.starts_with("sqlite:") {
        let q = SqliteQueue::connect(uri, queue, poll).await?;
        return Ok(Arc::new(q));
    }
    bail!("unsupported queue uri scheme: {uri}")
}
