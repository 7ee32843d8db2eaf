// Queue Service - ordered, queue-scoped entry operations

use std::sync::Arc;

use tracing::debug;

use crate::domain::{EntryId, QueueEntry, QueueId};
use crate::error::Result;
use crate::port::{IdProvider, QueueRepository, TimeProvider};

pub struct QueueService {
    queue_repo: Arc<dyn QueueRepository>,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
}

impl QueueService {
    pub fn new(
        queue_repo: Arc<dyn QueueRepository>,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            queue_repo,
            id_provider,
            time_provider,
        }
    }

    /// Append a payload to the queue. No-op when queue id or payload is empty.
    pub async fn write(&self, queue_id: &str, payload: &str) -> Result<()> {
        if queue_id.trim().is_empty() || payload.trim().is_empty() {
            return Ok(());
        }
        let entry = QueueEntry::new(
            self.id_provider.generate_id(),
            queue_id,
            payload,
            self.time_provider.now_millis(),
        );
        self.queue_repo.insert_entry(&entry).await
    }

    /// Select the single oldest entry. With `remove`, the found entry is
    /// deleted *by its id* as a follow-up step - never "delete oldest" -
    /// so a concurrent write cannot redefine which entry gets removed
    /// between the select and the delete.
    pub async fn poll(&self, queue_id: &str, remove: bool) -> Result<Option<QueueEntry>> {
        if queue_id.trim().is_empty() {
            return Ok(None);
        }
        let queue_id = queue_id.to_string();
        let entry = self.queue_repo.oldest_entry(&queue_id).await?;
        if remove {
            if let Some(entry) = &entry {
                self.queue_repo.delete_entry(&queue_id, &entry.id).await?;
                debug!(queue_id = %queue_id, entry_id = %entry.id, "entry delivered and removed");
            }
        }
        Ok(entry)
    }

    /// Poll without removal.
    pub async fn peek(&self, queue_id: &str) -> Result<Option<QueueEntry>> {
        self.poll(queue_id, false).await
    }

    /// True iff at least one entry remains, independent of any poll.
    pub async fn has_more(&self, queue_id: &str) -> Result<bool> {
        if queue_id.trim().is_empty() {
            return Ok(false);
        }
        self.queue_repo.has_entries(&queue_id.to_string()).await
    }

    /// Delete a specific entry. No-op when either id is empty.
    pub async fn remove(&self, queue_id: &str, entry_id: &str) -> Result<()> {
        if queue_id.trim().is_empty() || entry_id.trim().is_empty() {
            return Ok(());
        }
        self.queue_repo
            .delete_entry(&queue_id.to_string(), &EntryId::from(entry_id))
            .await
    }

    /// Delete every entry in the queue older than `max_age_secs`.
    pub async fn cleanup(&self, queue_id: &str, max_age_secs: i64) -> Result<u64> {
        if queue_id.trim().is_empty() {
            return Ok(0);
        }
        let cutoff = self.time_provider.now_millis() - max_age_secs * 1000;
        let removed = self
            .queue_repo
            .delete_entries_older_than(&QueueId::from(queue_id), cutoff)
            .await?;
        if removed > 0 {
            debug!(queue_id = %queue_id, removed, "cleanup removed aged entries");
        }
        Ok(removed)
    }
}
