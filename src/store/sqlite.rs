// src/store/sqlite.rs
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use super::{PersistedRecipe, RecipeStore, RECIPES_COLLECTION};
use crate::error::StoreError;

/// Open a pool for a `sqlite:` URI, creating the file if needed.
///
/// In-memory databases are pinned to a single long-lived connection, otherwise
/// every pooled connection would see its own empty database.
pub(crate) async fn open_pool(uri: &str) -> Result<SqlitePool, sqlx::Error> {
    let opts = SqliteConnectOptions::from_str(uri)?.create_if_missing(true);
    let in_memory = uri.contains(":memory:") || uri.contains("mode=memory");
    let pool = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect_with(opts)
            .await?
    } else {
        SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await?
    };
    Ok(pool)
}

/// JSON documents in a single `documents` table, namespaced by collection.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
    collection: String,
}

impl SqliteStore {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, StoreError> {
        let pool = open_pool(uri).await?;
        let store = Self {
            pool,
            collection: format!("{database}.{RECIPES_COLLECTION}"),
        };
        store.migrate().await?;
        tracing::info!(collection = %store.collection, "sqlite document store ready");
        Ok(store)
    }

    async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                collection TEXT NOT NULL,
                body TEXT NOT NULL,
                created_at INTEGER NOT NULL
            )
        "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection, id)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl RecipeStore for SqliteStore {
    async fn insert_recipe(&self, recipe: &PersistedRecipe) -> Result<(), StoreError> {
        let body = serde_json::to_string(recipe)?;
        sqlx::query("INSERT INTO documents (collection, body, created_at) VALUES (?, ?, ?)")
            .bind(&self.collection)
            .bind(body)
            .bind(chrono::Utc::now().timestamp())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_recipes(&self) -> Result<Vec<PersistedRecipe>, StoreError> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT body FROM documents WHERE collection = ? ORDER BY id")
                .bind(&self.collection)
                .fetch_all(&self.pool)
                .await?;
        rows.into_iter()
            .map(|(body,)| serde_json::from_str(&body).map_err(StoreError::from))
            .collect()
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }
}
