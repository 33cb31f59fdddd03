// src/gateway.rs
use std::sync::Arc;

use metrics::counter;

use crate::error::EnqueueError;
use crate::ingest::types::IngestionRequest;
use crate::queue::MessageQueue;

/// Hands ingestion requests to the queue instead of running them inline.
#[derive(Clone)]
pub struct PublishGateway {
    queue: Arc<dyn MessageQueue>,
}

impl PublishGateway {
    pub fn new(queue: Arc<dyn MessageQueue>) -> Self {
        Self { queue }
    }

    /// Returns once the broker has accepted the message.
    pub async fn publish(&self, request: &IngestionRequest) -> Result<(), EnqueueError> {
        let body = serde_json::to_vec(request)?;
        match self.queue.publish(body).await {
            Ok(()) => {
                counter!("queue_published_total").increment(1);
                tracing::info!(queue = self.queue.name(), feed_url = %request.url, "request enqueued");
                Ok(())
            }
            Err(e) => {
                counter!("queue_publish_errors_total").increment(1);
                tracing::error!(error = %e, queue = self.queue.name(), "enqueue failed");
                Err(e.into())
            }
        }
    }
}
