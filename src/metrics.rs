// src/metrics.rs
use anyhow::{Context, Result};
use axum::{routing::get, Router};
use metrics::{describe_counter, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global Prometheus recorder. Call once, from the binary.
    pub fn init(worker_buffer: usize) -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;

        describe_counter!("queue_published_total", "Requests accepted by the queue.");
        describe_counter!("queue_publish_errors_total", "Requests the queue refused.");
        describe_counter!("worker_messages_total", "Messages taken off the queue.");
        describe_counter!("worker_rejected_total", "Messages dropped as undecodable or invalid.");
        describe_counter!("worker_failures_total", "Queued ingestion runs that failed.");

        // Static gauge with the worker hand-off capacity
        gauge!("worker_buffer_capacity").set(worker_buffer as f64);

        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
