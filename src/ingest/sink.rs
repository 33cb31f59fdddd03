// src/ingest/sink.rs
use metrics::counter;

use crate::error::PersistError;
use crate::ingest::types::FeedEntry;
use crate::store::{PersistedRecipe, RecipeStore};

/// What happened to each entry handed to the sink.
#[derive(Debug, Default)]
pub struct PersistOutcome {
    pub persisted: Vec<FeedEntry>,
    pub failures: Vec<PersistError>,
}

impl PersistOutcome {
    pub fn attempted(&self) -> usize {
        self.persisted.len() + self.failures.len()
    }
}

/// One insert per entry. A failed insert is recorded and the loop moves on.
pub async fn persist_entries(store: &dyn RecipeStore, entries: Vec<FeedEntry>) -> PersistOutcome {
    let mut out = PersistOutcome::default();
    for (index, entry) in entries.into_iter().enumerate() {
        let doc = PersistedRecipe::from(&entry);
        match store.insert_recipe(&doc).await {
            Ok(()) => out.persisted.push(entry),
            Err(source) => {
                tracing::warn!(error = %source, index, store = store.name(), "insert failed");
                out.failures.push(PersistError { index, source });
            }
        }
    }

    counter!("ingest_persisted_total").increment(out.persisted.len() as u64);
    counter!("ingest_persist_errors_total").increment(out.failures.len() as u64);
    out
}
