// src/ingest/fetcher.rs
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::StreamExt;
use metrics::{counter, histogram};

use crate::error::FetchError;
use crate::ingest::types::FeedSource;

pub const DEFAULT_USER_AGENT: &str = "recipe-ingest/0.1 (feed fetcher; +https://github.com/recipe-ingest)";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub user_agent: String,
    pub timeout: Duration,
    pub max_bytes: u64,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: DEFAULT_TIMEOUT,
            max_bytes: DEFAULT_MAX_BYTES,
        }
    }
}

/// Fetches feeds over plain HTTP/1.1 with a fixed client identity.
#[derive(Clone)]
pub struct HttpFeedFetcher {
    client: reqwest::Client,
    max_bytes: u64,
}

impl HttpFeedFetcher {
    pub fn new(cfg: FetcherConfig) -> Result<Self, FetchError> {
        // http1_only: never negotiate h2 via ALPN, the body is always a plain HTTP/1.1 stream
        let client = reqwest::Client::builder()
            .user_agent(cfg.user_agent)
            .http1_only()
            .timeout(cfg.timeout)
            .connect_timeout(cfg.timeout)
            .build()
            .map_err(FetchError::Network)?;
        Ok(Self {
            client,
            max_bytes: cfg.max_bytes,
        })
    }

    async fn fetch_inner(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let resp = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout
            } else {
                FetchError::Network(e)
            }
        })?;

        // Early returns drop `resp`, which releases the connection.
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        if let Some(len) = resp.content_length() {
            if len > self.max_bytes {
                return Err(FetchError::TooLarge {
                    size: len,
                    limit: self.max_bytes,
                });
            }
        }

        read_limited(resp, self.max_bytes).await
    }
}

/// Read the body chunk by chunk, giving up as soon as it grows past `limit`.
/// Chunked responses carry no Content-Length, so the header check alone is
/// not enough.
async fn read_limited(resp: reqwest::Response, limit: u64) -> Result<Vec<u8>, FetchError> {
    let mut body = Vec::new();
    let mut stream = resp.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout
            } else {
                FetchError::Body(e)
            }
        })?;
        let size = (body.len() as u64).saturating_add(chunk.len() as u64);
        if size > limit {
            return Err(FetchError::TooLarge { size, limit });
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

#[async_trait]
impl FeedSource for HttpFeedFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        tracing::debug!(feed_url = url, "fetching feed");
        let t0 = Instant::now();
        let res = self.fetch_inner(url).await;
        histogram!("ingest_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        if let Err(e) = &res {
            tracing::warn!(error = %e, feed_url = url, "feed fetch failed");
            counter!("ingest_fetch_errors_total").increment(1);
        }
        res
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
