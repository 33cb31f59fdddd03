//! Recipe ingest service — binary entrypoint.
//! Loads config, connects the store and queue, starts the queue worker and
//! serves the HTTP routes until Ctrl-C / SIGTERM.

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use recipe_ingest::config::{AppConfig, LogFormat};
use recipe_ingest::metrics::Metrics;
use recipe_ingest::{connect_services, router, IngestWorker};

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("recipe_ingest=info,ingest=info,tower_http=info,warn"));

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Compact => registry.with(fmt::layer().compact()).init(),
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "ctrl-c handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();

    let cfg = AppConfig::from_env().context("loading configuration")?;
    init_tracing(cfg.log_format);

    let metrics = Metrics::init(cfg.worker.buffer)?;
    let services = connect_services(&cfg).await?;

    let worker = IngestWorker::spawn(
        services.queue.clone(),
        services.state.ingestor.clone(),
        cfg.worker,
    );

    let app = router(services.state).merge(metrics.router());
    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr)
        .await
        .with_context(|| format!("binding {}", cfg.bind_addr))?;
    tracing::info!(addr = %cfg.bind_addr, "listening; waiting for messages");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server")?;

    let stats = worker.shutdown().await;
    tracing::info!(?stats, "shutdown complete");
    Ok(())
}
