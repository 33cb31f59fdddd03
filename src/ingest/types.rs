// src/ingest/types.rs
use crate::error::FetchError;
use serde::{Deserialize, Serialize};

/// One item parsed out of a feed. Lives for a single ingestion run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct FeedEntry {
    pub title: String,
    pub link: String,
    pub thumbnail: String,
}

/// The only payload both triggers accept: `{ "url": "..." }`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IngestionRequest {
    pub url: String,
}

impl IngestionRequest {
    /// Checks the URL is an absolute http(s) URL. Returns a human message on failure.
    pub fn validate(&self) -> Result<(), String> {
        let trimmed = self.url.trim();
        if trimmed.is_empty() {
            return Err("url must not be empty".to_string());
        }
        let parsed =
            reqwest::Url::parse(trimmed).map_err(|e| format!("url is not valid: {e}"))?;
        match parsed.scheme() {
            "http" | "https" => Ok(()),
            other => Err(format!("unsupported url scheme '{other}'")),
        }
    }
}

/// Anything that can hand back raw feed bytes for a URL.
#[async_trait::async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
    fn name(&self) -> &'static str;
}
