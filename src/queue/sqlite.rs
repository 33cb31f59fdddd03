// src/queue/sqlite.rs
use std::time::Duration;

use async_trait::async_trait;
use sqlx::SqlitePool;
use tokio::sync::Notify;

use super::{MessageQueue, CONTENT_TYPE_JSON};
use crate::error::QueueError;
use crate::store::sqlite::open_pool;

/// Durable queue on a `queue_messages` table.
///
/// Delivery deletes the row in the same statement that reads it (auto-ack).
/// Publishes from this process wake a waiting consumer at once; publishes from
/// other processes are picked up on the next poll.
pub struct SqliteQueue {
    pool: SqlitePool,
    name: String,
    poll: Duration,
    ready: Notify,
}

impl SqliteQueue {
    pub async fn connect(uri: &str, name: &str, poll: Duration) -> Result<Self, QueueError> {
        let pool = open_pool(uri).await?;
        let q = Self {
            pool,
            name: name.to_string(),
            poll,
            ready: Notify::new(),
        };
        q.migrate().await?;
        tracing::info!(queue = %q.name, poll_ms = poll.as_millis() as u64, "sqlite queue ready");
        Ok(q)
    }

    async fn migrate(&self) -> Result<(), QueueError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS queue_messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                queue TEXT NOT NULL,
                content_type TEXT NOT NULL,
                body BLOB NOT NULL,
                enqueued_at INTEGER NOT NULL
            )
        "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_queue_messages_queue ON queue_messages(queue, id)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn try_pop(&self) -> Result<Option<Vec<u8>>, QueueError> {
        let row: Option<(Vec<u8>,)> = sqlx::query_as(
            r#"
            DELETE FROM queue_messages
            WHERE id = (
                SELECT id FROM queue_messages WHERE queue = ? ORDER BY id LIMIT 1
            )
            RETURNING body
        "#,
        )
        .bind(&self.name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(body,)| body))
    }

    /// Messages waiting in this queue.
    pub async fn depth(&self) -> Result<i64, QueueError> {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM queue_messages WHERE queue = ?")
            .bind(&self.name)
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }
}

#[async_trait]
impl MessageQueue for SqliteQueue {
    async fn publish(&self, body: Vec<u8>) -> Result<(), QueueError> {
        sqlx::query(
            "INSERT INTO queue_messages (queue, content_type, body, enqueued_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&self.name)
        .bind(CONTENT_TYPE_JSON)
        .bind(body)
        .bind(chrono::Utc::now().timestamp())
        .execute(&self.pool)
        .await?;
        self.ready.notify_one();
        Ok(())
    }

    async fn try_receive(&self) -> Result<Option<Vec<u8>>, QueueError> {
        self.try_pop().await
    }

    async fn wait(&self) {
        tokio::select! {
            _ = self.ready.notified() => {}
            _ = tokio::time::sleep(self.poll) => {}
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
