// SQLite QueueRepository Implementation

use async_trait::async_trait;
use sqlx::SqlitePool;

use qgate_core::domain::{EntryId, Queue, QueueEntry, QueueId};
use qgate_core::error::Result;
use qgate_core::port::QueueRepository;

use crate::map_sqlx_error;

/// Bounded result set size for list operations (no pagination).
const LIST_LIMIT: i64 = 1000;

pub struct SqliteQueueRepository {
    pool: SqlitePool,
}

impl SqliteQueueRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QueueRepository for SqliteQueueRepository {
    async fn insert_queue(&self, queue: &Queue) -> Result<()> {
        sqlx::query("INSERT INTO queue (id, description) VALUES (?, ?)")
            .bind(&queue.id)
            .bind(&queue.description)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn delete_queue(&self, id: &QueueId) -> Result<()> {
        sqlx::query("DELETE FROM queue WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn list_queues(&self) -> Result<Vec<Queue>> {
        let rows: Vec<QueueRow> =
            sqlx::query_as("SELECT id, description FROM queue ORDER BY id LIMIT ?")
                .bind(LIST_LIMIT)
                .fetch_all(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(|r| Queue::new(r.id, r.description)).collect())
    }

    async fn insert_entry(&self, entry: &QueueEntry) -> Result<()> {
        sqlx::query("INSERT INTO queue_entry (id, queue_id, data, created) VALUES (?, ?, ?, ?)")
            .bind(&entry.id)
            .bind(&entry.queue_id)
            .bind(&entry.data)
            .bind(entry.created_at)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn oldest_entry(&self, queue_id: &QueueId) -> Result<Option<QueueEntry>> {
        let row: Option<EntryRow> = sqlx::query_as(
            r#"
            SELECT id, queue_id, data, created FROM queue_entry
            WHERE queue_id = ?
            ORDER BY created ASC, seq ASC
            LIMIT 1
            "#,
        )
        .bind(queue_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(EntryRow::into_entry))
    }

    async fn delete_entry(&self, queue_id: &QueueId, entry_id: &EntryId) -> Result<()> {
        sqlx::query("DELETE FROM queue_entry WHERE queue_id = ? AND id = ?")
            .bind(queue_id)
            .bind(entry_id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn has_entries(&self, queue_id: &QueueId) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM queue_entry WHERE queue_id = ?")
            .bind(queue_id)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(count > 0)
    }

    async fn delete_entries_older_than(
        &self,
        queue_id: &QueueId,
        cutoff_millis: i64,
    ) -> Result<u64> {
        let result = sqlx::query("DELETE FROM queue_entry WHERE queue_id = ? AND created < ?")
            .bind(queue_id)
            .bind(cutoff_millis)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(result.rows_affected())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct QueueRow {
    id: String,
    description: String,
}

#[derive(Debug, sqlx::FromRow)]
struct EntryRow {
    id: String,
    queue_id: String,
    data: String,
    created: i64,
}

impl EntryRow {
    fn into_entry(self) -> QueueEntry {
        QueueEntry {
            id: self.id,
            queue_id: self.queue_id,
            data: self.data,
            created_at: self.created,
        }
    }
}
