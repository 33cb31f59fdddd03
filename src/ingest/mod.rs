// src/ingest/mod.rs
pub mod fetcher;
pub mod parser;
pub mod selector;
pub mod sink;
pub mod types;

use std::sync::Arc;

use metrics::{counter, describe_counter, describe_histogram};
use once_cell::sync::OnceCell;

use crate::error::{IngestError, PersistError};
use crate::ingest::selector::{select_entries, SKIP_LEADING_ENTRIES};
use crate::ingest::types::{FeedEntry, FeedSource};
use crate::store::RecipeStore;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_runs_total", "Ingestion runs started.");
        describe_counter!("ingest_fetch_errors_total", "Feed fetches that failed.");
        describe_counter!("ingest_parse_errors_total", "Feeds that failed to parse.");
        describe_counter!(
            "ingest_entries_skipped_total",
            "Leading entries dropped before persistence."
        );
        describe_counter!("ingest_persisted_total", "Recipe documents written.");
        describe_counter!(
            "ingest_persist_errors_total",
            "Recipe documents that failed to write."
        );
        describe_histogram!("ingest_fetch_ms", "Feed fetch time in milliseconds.");
    });
}

/// Result of one successful ingestion run.
#[derive(Debug)]
pub struct IngestReport {
    /// Entries that reached storage, in feed order.
    pub entries: Vec<FeedEntry>,
    pub parsed: usize,
    pub eligible: usize,
    pub failed: usize,
    pub failures: Vec<PersistError>,
}

impl IngestReport {
    pub fn persisted(&self) -> usize {
        self.entries.len()
    }
}

/// Fetch → parse → select → persist, shared by the HTTP and queue triggers.
pub struct Ingestor {
    source: Arc<dyn FeedSource>,
    store: Arc<dyn RecipeStore>,
    skip: usize,
}

impl Ingestor {
    pub fn new(source: Arc<dyn FeedSource>, store: Arc<dyn RecipeStore>) -> Self {
        Self {
            source,
            store,
            skip: SKIP_LEADING_ENTRIES,
        }
    }

    pub fn store(&self) -> &Arc<dyn RecipeStore> {
        &self.store
    }

    /// Run the pipeline for `feed_url`. A fetch or parse failure stops the run
    /// before anything is written; insert failures are counted, not raised.
    pub async fn run(&self, feed_url: &str) -> Result<IngestReport, IngestError> {
        ensure_metrics_described();
        counter!("ingest_runs_total").increment(1);

        let bytes = self.source.fetch(feed_url).await?;

        let parsed = parser::parse_feed(&bytes).map_err(|e| {
            tracing::warn!(error = %e, feed_url, "feed parse failed");
            counter!("ingest_parse_errors_total").increment(1);
            e
        })?;
        let parsed_len = parsed.len();

        let eligible = select_entries(parsed, self.skip);
        let eligible_len = eligible.len();
        counter!("ingest_entries_skipped_total")
            .increment(parsed_len.saturating_sub(eligible_len) as u64);

        let outcome = sink::persist_entries(self.store.as_ref(), eligible).await;

        tracing::info!(
            target: "ingest",
            feed_url,
            source = self.source.name(),
            parsed = parsed_len,
            eligible = eligible_len,
            persisted = outcome.persisted.len(),
            failed = outcome.failures.len(),
            "ingestion run finished"
        );

        Ok(IngestReport {
            entries: outcome.persisted,
            parsed: parsed_len,
            eligible: eligible_len,
            failed: outcome.failures.len(),
            failures: outcome.failures,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::store::MemoryStore;

    struct Fixed(Result<String, u16>);

    #[async_trait::async_trait]
    impl FeedSource for Fixed {
        async fn fetch(&self, _url: &str) -> Result<Vec<u8>, FetchError> {
            match &self.0 {
                Ok(s) => Ok(s.clone().into_bytes()),
                Err(code) => Err(FetchError::Status(*code)),
            }
        }
        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    fn feed_with(n: usize) -> String {
        let entries: String = (0..n)
            .map(|i| {
                format!(
                    "<entry><title>r{i}</title><link href=\"https://example.test/{i}\"/></entry>"
                )
            })
            .collect();
        format!("<feed>{entries}</feed>")
    }

    fn ingestor(source: Fixed) -> (Ingestor, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (Ingestor::new(Arc::new(source), store.clone()), store)
    }

    #[tokio::test]
    async fn five_entries_persist_three() {
        let (ing, store) = ingestor(Fixed(Ok(feed_with(5))));
        let report = ing.run("https://example.test/feed").await.unwrap();

        assert_eq!(report.parsed, 5);
        assert_eq!(report.persisted(), 3);
        assert_eq!(report.failed, 0);
        assert_eq!(report.entries[0].title, "r2");
        assert_eq!(store.len(), 3);
    }

    #[tokio::test]
    async fn short_feed_is_a_no_op() {
        let (ing, store) = ingestor(Fixed(Ok(feed_with(1))));
        let report = ing.run("https://example.test/feed").await.unwrap();
        assert_eq!(report.persisted(), 0);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn fetch_failure_writes_nothing() {
        let (ing, store) = ingestor(Fixed(Err(503)));
        let err = ing.run("https://example.test/feed").await.unwrap_err();
        assert_eq!(err.kind(), "fetch");
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn parse_failure_writes_nothing() {
        let (ing, store) = ingestor(Fixed(Ok(
            "<feed><entry><title>a</title></entry><entry><title>b</title></entry><entry><title>c</entry></feed>"
                .to_string(),
        )));
        let err = ing.run("https://example.test/feed").await.unwrap_err();
        assert_eq!(err.kind(), "parse");
        assert!(store.is_empty());
    }
}
