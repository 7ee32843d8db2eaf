// Domain Layer - Pure entities, no behavior beyond construction

pub mod identity;
pub mod queue;

// Re-exports
pub use identity::{GrantView, QueueGrant, TokenId, TokenSummary, User, UserAccount, UserId, UserToken};
pub use queue::{EntryId, Queue, QueueEntry, QueueId, QueueOperation};
