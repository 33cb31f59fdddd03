// src/error.rs
//! Error taxonomy for the ingestion pipeline and its collaborators.

use thiserror::Error;

/// Errors raised while retrieving feed content.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection, DNS or TLS failure before a response arrived
    #[error("request failed: {0}")]
    Network(#[source] reqwest::Error),
    /// The fetch deadline elapsed
    #[error("request timed out")]
    Timeout,
    /// Response with a non-2xx status code
    #[error("HTTP error: status {0}")]
    Status(u16),
    /// The response stream could not be read to completion
    #[error("reading response body failed: {0}")]
    Body(#[source] reqwest::Error),
    /// Response body exceeded the configured size limit
    #[error("response too large: {size} bytes (limit {limit})")]
    TooLarge { size: u64, limit: u64 },
}

/// Feed bytes could not be decoded into entries.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed feed markup: {0}")]
    Markup(#[from] quick_xml::DeError),
}

/// Failures reported by a [`crate::store::RecipeStore`] backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("document encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("write rejected: {0}")]
    Rejected(String),
}

/// A single record could not be written. Never aborts the rest of a batch.
#[derive(Debug, Error)]
#[error("persisting entry #{index} failed: {source}")]
pub struct PersistError {
    pub index: usize,
    #[source]
    pub source: StoreError,
}

/// Failures reported by a [`crate::queue::MessageQueue`] backend.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("queue is closed")]
    Closed,
}

/// A request could not be handed to the queue.
#[derive(Debug, Error)]
pub enum EnqueueError {
    #[error("serializing request failed: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("broker rejected publish: {0}")]
    Broker(#[from] QueueError),
}

/// First failure that aborts an ingestion run.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl IngestError {
    /// Short machine-readable tag used in API error bodies and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            IngestError::Fetch(_) => "fetch",
            IngestError::Parse(_) => "parse",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_mentions_code() {
        let e = IngestError::from(FetchError::Status(503));
        assert_eq!(e.kind(), "fetch");
        assert_eq!(e.to_string(), "HTTP error: status 503");
    }

    #[test]
    fn persist_error_carries_index() {
        let e = PersistError {
            index: 3,
            source: StoreError::Rejected("disk full".into()),
        };
        assert_eq!(
            e.to_string(),
            "persisting entry #3 failed: write rejected: disk full"
        );
    }
}
