// src/worker.rs
//! Background consumer: drains the queue and runs each request through the
//! same [`Ingestor`] the HTTP trigger uses, one message at a time.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::ingest::types::IngestionRequest;
use crate::ingest::Ingestor;
use crate::queue::MessageQueue;

pub const DEFAULT_BUFFER: usize = 32;
const RECEIVE_BACKOFF: Duration = Duration::from_secs(1);

#[derive(Clone, Copy, Debug)]
pub struct WorkerConfig {
    /// Capacity of the hand-off between the queue pump and the processor.
    pub buffer: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            buffer: DEFAULT_BUFFER,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WorkerStats {
    pub received: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub rejected: u64,
    pub persisted: u64,
}

#[derive(Default)]
struct Counters {
    received: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    rejected: AtomicU64,
    persisted: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> WorkerStats {
        WorkerStats {
            received: self.received.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            persisted: self.persisted.load(Ordering::Relaxed),
        }
    }
}

pub struct IngestWorker;

impl IngestWorker {
    /// Start the pump and processor tasks.
    pub fn spawn(
        queue: Arc<dyn MessageQueue>,
        ingestor: Arc<Ingestor>,
        cfg: WorkerConfig,
    ) -> WorkerHandle {
        let (stop_tx, stop_rx) = watch::channel(false);
        let (tx, rx) = mpsc::channel::<Vec<u8>>(cfg.buffer.max(1));
        let counters = Arc::new(Counters::default());

        tracing::info!(queue = queue.name(), buffer = cfg.buffer, "ingest worker started");

        let pump = tokio::spawn(pump(queue, tx, stop_rx));
        let processor = tokio::spawn(process(rx, ingestor, counters.clone()));

        WorkerHandle {
            stop: stop_tx,
            pump,
            processor,
            counters,
        }
    }
}

pub struct WorkerHandle {
    stop: watch::Sender<bool>,
    pump: JoinHandle<()>,
    processor: JoinHandle<()>,
    counters: Arc<Counters>,
}

impl WorkerHandle {
    pub fn stats(&self) -> WorkerStats {
        self.counters.snapshot()
    }

    /// Stop pulling from the queue, finish what is already buffered, and return
    /// the final counters.
    pub async fn shutdown(self) -> WorkerStats {
        let _ = self.stop.send(true);
        self.join().await
    }

    /// Wait until the queue closes and the buffer is drained.
    pub async fn join(self) -> WorkerStats {
        if let Err(e) = self.pump.await {
            tracing::error!(error = %e, "queue pump task panicked");
        }
        if let Err(e) = self.processor.await {
            tracing::error!(error = %e, "ingest processor task panicked");
        }
        let stats = self.counters.snapshot();
        tracing::info!(?stats, "ingest worker stopped");
        stats
    }
}

async fn pump(queue: Arc<dyn MessageQueue>, tx: mpsc::Sender<Vec<u8>>, mut stop: watch::Receiver<bool>) {
    loop {
        if *stop.borrow() {
            break;
        }
        // A pop that has started always completes: its message is already acked.
        // Only the idle wait races the stop signal.
        let closed = queue.is_closed();
        match queue.try_receive().await {
            Ok(Some(body)) => {
                // Waits here while the processor is busy and the buffer is full.
                if tx.send(body).await.is_err() {
                    break;
                }
            }
            Ok(None) if closed => {
                tracing::info!(queue = queue.name(), "queue closed");
                break;
            }
            Ok(None) => {
                tokio::select! {
                    biased;
                    _ = stop.changed() => break,
                    _ = queue.wait() => {}
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, queue = queue.name(), "queue receive failed");
                tokio::select! {
                    _ = stop.changed() => break,
                    _ = tokio::time::sleep(RECEIVE_BACKOFF) => {}
                }
            }
        }
    }
}

async fn process(mut rx: mpsc::Receiver<Vec<u8>>, ingestor: Arc<Ingestor>, counters: Arc<Counters>) {
    while let Some(body) = rx.recv().await {
        counters.received.fetch_add(1, Ordering::Relaxed);
        counter!("worker_messages_total").increment(1);
        tracing::debug!(body = %String::from_utf8_lossy(&body), "received message");

        let request: IngestionRequest = match serde_json::from_slice(&body) {
            Ok(r) => r,
            Err(e) => {
                counters.rejected.fetch_add(1, Ordering::Relaxed);
                counter!("worker_rejected_total").increment(1);
                tracing::warn!(error = %e, "dropping undecodable message");
                continue;
            }
        };
        if let Err(reason) = request.validate() {
            counters.rejected.fetch_add(1, Ordering::Relaxed);
            counter!("worker_rejected_total").increment(1);
            tracing::warn!(feed_url = %request.url, reason = %reason, "dropping invalid request");
            continue;
        }

        match ingestor.run(&request.url).await {
            Ok(report) => {
                counters.succeeded.fetch_add(1, Ordering::Relaxed);
                counters
                    .persisted
                    .fetch_add(report.persisted() as u64, Ordering::Relaxed);
            }
            Err(e) => {
                counters.failed.fetch_add(1, Ordering::Relaxed);
                counter!("worker_failures_total").increment(1);
                tracing::error!(error = %e, kind = e.kind(), feed_url = %request.url, "queued ingestion failed");
            }
        }
    }
}
