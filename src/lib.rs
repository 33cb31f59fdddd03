// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod gateway;
pub mod ingest;
pub mod metrics;
pub mod queue;
pub mod store;
pub mod worker;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::ingest::{IngestReport, Ingestor};
pub use crate::worker::{IngestWorker, WorkerHandle, WorkerStats};

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::AppConfig;
use crate::gateway::PublishGateway;
use crate::ingest::fetcher::HttpFeedFetcher;
use crate::queue::MessageQueue;

/// Everything the HTTP surface and the worker share.
pub struct Services {
    pub state: AppState,
    pub queue: Arc<dyn MessageQueue>,
}

/// Connect the store and queue and build the shared pipeline.
///
/// Any connection failure is returned as an error; callers treat it as fatal.
pub async fn connect_services(cfg: &AppConfig) -> Result<Services> {
    let store = store::connect(&cfg.store_uri, &cfg.store_database)
        .await
        .with_context(|| format!("connecting document store ({})", cfg.store_uri))?;
    let queue = queue::connect(&cfg.queue_uri, &cfg.queue_name, cfg.queue_poll)
        .await
        .with_context(|| format!("connecting queue ({})", cfg.queue_uri))?;
    let fetcher = HttpFeedFetcher::new(cfg.fetcher.clone()).context("building feed http client")?;

    info!(
        store = store.name(),
        database = %cfg.store_database,
        queue = queue.name(),
        "backends connected"
    );

    let ingestor = Arc::new(Ingestor::new(Arc::new(fetcher), store));
    let state = AppState {
        ingestor,
        gateway: PublishGateway::new(queue.clone()),
        assets_dir: cfg.assets_dir.clone(),
    };
    Ok(Services { state, queue })
}
