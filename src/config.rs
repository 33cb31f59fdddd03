// src/config.rs
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};

use crate::ingest::fetcher::{FetcherConfig, DEFAULT_MAX_BYTES, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT};
use crate::worker::{WorkerConfig, DEFAULT_BUFFER};

pub const ENV_STORE_URI: &str = "STORE_URI";
pub const ENV_STORE_DATABASE: &str = "STORE_DATABASE";
pub const ENV_QUEUE_URI: &str = "QUEUE_URI";
pub const ENV_QUEUE_NAME: &str = "QUEUE_NAME";

const ENV_BIND_ADDR: &str = "BIND_ADDR";
const ENV_FETCH_TIMEOUT_SECS: &str = "FETCH_TIMEOUT_SECS";
const ENV_FETCH_USER_AGENT: &str = "FETCH_USER_AGENT";
const ENV_FETCH_MAX_BYTES: &str = "FETCH_MAX_BYTES";
const ENV_WORKER_BUFFER: &str = "WORKER_BUFFER";
const ENV_QUEUE_POLL_MS: &str = "QUEUE_POLL_MS";
const ENV_ASSETS_DIR: &str = "ASSETS_DIR";
const ENV_LOG_FORMAT: &str = "LOG_FORMAT";

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5500";
const DEFAULT_QUEUE_POLL_MS: u64 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub store_uri: String,
    pub store_database: String,
    pub queue_uri: String,
    pub queue_name: String,
    pub bind_addr: String,
    pub fetcher: FetcherConfig,
    pub worker: WorkerConfig,
    pub queue_poll: Duration,
    pub assets_dir: PathBuf,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Read configuration through `lookup`; missing required keys are an error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| lookup(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let required = |k: &str| get(k).ok_or_else(|| anyhow!("missing required env var {k}"));

        let timeout = match get(ENV_FETCH_TIMEOUT_SECS) {
            Some(v) => Duration::from_secs(parse_num(ENV_FETCH_TIMEOUT_SECS, &v)?),
            None => DEFAULT_TIMEOUT,
        };
        let max_bytes = match get(ENV_FETCH_MAX_BYTES) {
            Some(v) => parse_num(ENV_FETCH_MAX_BYTES, &v)?,
            None => DEFAULT_MAX_BYTES,
        };
        let buffer = match get(ENV_WORKER_BUFFER) {
            Some(v) => parse_num(ENV_WORKER_BUFFER, &v)? as usize,
            None => DEFAULT_BUFFER,
        };
        let poll_ms = match get(ENV_QUEUE_POLL_MS) {
            Some(v) => parse_num(ENV_QUEUE_POLL_MS, &v)?,
            None => DEFAULT_QUEUE_POLL_MS,
        };
        let log_format = match get(ENV_LOG_FORMAT).as_deref().map(str::to_ascii_lowercase) {
            None => LogFormat::Compact,
            Some(v) if v == "compact" => LogFormat::Compact,
            Some(v) if v == "json" => LogFormat::Json,
            Some(other) => return Err(anyhow!("{ENV_LOG_FORMAT} must be 'compact' or 'json', got '{other}'")),
        };

        Ok(Self {
            store_uri: required(ENV_STORE_URI)?,
            store_database: required(ENV_STORE_DATABASE)?,
            queue_uri: required(ENV_QUEUE_URI)?,
            queue_name: required(ENV_QUEUE_NAME)?,
            bind_addr: get(ENV_BIND_ADDR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            fetcher: FetcherConfig {
                user_agent: get(ENV_FETCH_USER_AGENT).unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
                timeout,
                max_bytes,
            },
            worker: WorkerConfig { buffer: buffer.max(1) },
            queue_poll: Duration::from_millis(poll_ms.max(1)),
            assets_dir: PathBuf::from(get(ENV_ASSETS_DIR).unwrap_or_else(|| "assets".to_string())),
            log_format,
        })
    }
}

fn parse_num(key: &str, v: &str) -> Result<u64> {
    v.parse::<u64>()
        .with_context(|| format!("{key} must be a non-negative integer, got '{v}'"))
}
