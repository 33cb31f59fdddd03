// src/store/mod.rs
pub mod memory;
pub mod sqlite;

use std::sync::Arc;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::ingest::types::FeedEntry;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Collection every recipe document lives in.
pub const RECIPES_COLLECTION: &str = "recipes";

/// Stored projection of a feed entry: `{ title, thumbnail, url }`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PersistedRecipe {
    pub title: String,
    pub thumbnail: String,
    pub url: String,
}

impl From<&FeedEntry> for PersistedRecipe {
    fn from(e: &FeedEntry) -> Self {
        Self {
            title: e.title.clone(),
            thumbnail: e.thumbnail.clone(),
            url: e.link.clone(),
        }
    }
}

/// Document collection of recipes. Inserts are independent; no uniqueness.
#[async_trait::async_trait]
pub trait RecipeStore: Send + Sync {
    async fn insert_recipe(&self, recipe: &PersistedRecipe) -> Result<(), StoreError>;
    /// All records in insertion order.
    async fn list_recipes(&self) -> Result<Vec<PersistedRecipe>, StoreError>;
    fn name(&self) -> &'static str;
}

/// Open the store named by `uri` (`sqlite:...` or `memory:`).
pub async fn connect(uri: &str, database: &str) -> Result<Arc<dyn RecipeStore>> {
    if uri.starts_with("memory:") {
        return Ok(Arc::new(MemoryStore::new()));
    }
    if uri.starts_with("sqlite:") {
        let store = SqliteStore::connect(uri, database).await?;
        return Ok(Arc::new(store));
    }
    bail!("unsupported store uri scheme: {uri}")
}
