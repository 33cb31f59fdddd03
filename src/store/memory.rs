// src/store/memory.rs
use std::sync::Mutex;

use async_trait::async_trait;

use super::{PersistedRecipe, RecipeStore};
use crate::error::StoreError;

/// Process-local store. Non-durable; used for `memory:` URIs and tests.
#[derive(Default)]
pub struct MemoryStore {
    docs: Mutex<Vec<PersistedRecipe>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.docs.lock().map(|d| d.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RecipeStore for MemoryStore {
    async fn insert_recipe(&self, recipe: &PersistedRecipe) -> Result<(), StoreError> {
        let mut docs = self
            .docs
            .lock()
            .map_err(|_| StoreError::Rejected("lock poisoned".into()))?;
        docs.push(recipe.clone());
        Ok(())
    }

    async fn list_recipes(&self) -> Result<Vec<PersistedRecipe>, StoreError> {
        let docs = self
            .docs
            .lock()
            .map_err(|_| StoreError::Rejected("lock poisoned".into()))?;
        Ok(docs.clone())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
