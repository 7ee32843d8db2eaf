// Queue Repository Port (Interface)

use crate::domain::{EntryId, Queue, QueueEntry, QueueId};
use crate::error::Result;
use async_trait::async_trait;

/// Repository interface for queues and their entries.
///
/// The leaf component of the system: no dependency on identity or
/// authorization.
#[async_trait]
pub trait QueueRepository: Send + Sync {
    /// Insert a new queue
    async fn insert_queue(&self, queue: &Queue) -> Result<()>;

    /// Delete a queue (entries cascade). No-op on missing id.
    async fn delete_queue(&self, id: &QueueId) -> Result<()>;

    /// List queues (bounded result set)
    async fn list_queues(&self) -> Result<Vec<Queue>>;

    /// Append an entry
    async fn insert_entry(&self, entry: &QueueEntry) -> Result<()>;

    /// Select the single oldest entry for the queue: lowest `created_at`,
    /// ties broken by insertion sequence. Does not remove it.
    async fn oldest_entry(&self, queue_id: &QueueId) -> Result<Option<QueueEntry>>;

    /// Delete a specific entry by id. No-op on missing id.
    async fn delete_entry(&self, queue_id: &QueueId, entry_id: &EntryId) -> Result<()>;

    /// True iff at least one entry remains for the queue.
    async fn has_entries(&self, queue_id: &QueueId) -> Result<bool>;

    /// Delete every entry in the queue created before `cutoff_millis`.
    /// Returns the number of deleted entries.
    async fn delete_entries_older_than(
        &self,
        queue_id: &QueueId,
        cutoff_millis: i64,
    ) -> Result<u64>;
}
