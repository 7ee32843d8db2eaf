// Queue Domain Model

use serde::{Deserialize, Serialize};

/// Queue identifier (UUID v4, opaque)
pub type QueueId = String;

/// Entry identifier (UUID v4, unique within a queue)
pub type EntryId = String;

/// A named queue. Entries belong to exactly one queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Queue {
    pub id: QueueId,
    pub description: String,
}

impl Queue {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
        }
    }
}

/// One opaque payload awaiting delivery.
///
/// Entries within a queue are totally ordered by `created_at` (epoch ms),
/// ties broken by the store-assigned insertion sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueEntry {
    pub id: EntryId,
    pub queue_id: QueueId,
    /// Opaque payload. The collaborator layer serializes structured data
    /// before handing it down; this core never interprets it.
    pub data: String,
    pub created_at: i64, // epoch ms
}

impl QueueEntry {
    pub fn new(
        id: impl Into<String>,
        queue_id: impl Into<String>,
        data: impl Into<String>,
        created_at: i64,
    ) -> Self {
        Self {
            id: id.into(),
            queue_id: queue_id.into(),
            data: data.into(),
            created_at,
        }
    }
}

/// The two grantable queue operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueOperation {
    Read,
    Write,
}

impl std::fmt::Display for QueueOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueueOperation::Read => write!(f, "read"),
            QueueOperation::Write => write!(f, "write"),
        }
    }
}
