// Identity Domain Model - users, tokens, grants

use serde::{Deserialize, Serialize};

use crate::domain::queue::QueueId;

/// User identifier (UUID v4)
pub type UserId = String;

/// Token identifier (UUID v4)
pub type TokenId = String;

/// A queue user. Inactive users fail every authorization check, regardless
/// of otherwise-valid tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub display_name: String,
    pub active: bool,
}

impl User {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        display_name: impl Into<String>,
        active: bool,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            display_name: display_name.into(),
            active,
        }
    }
}

/// A bearer token, stored only as its salted hash. The plaintext exists once,
/// at creation time, and is never retrievable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserToken {
    pub id: TokenId,
    pub token_hash: String,
    pub user_id: UserId,
    pub description: String,
    /// Epoch ms. A token whose expiration has passed is treated as absent.
    pub expiration: Option<i64>,
}

/// Token view for listings: never includes the hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenSummary {
    pub id: TokenId,
    pub description: String,
    pub expiration: Option<i64>,
}

/// Per-user, per-queue read/write permission. At most one grant exists per
/// (user, queue) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueGrant {
    pub queue_id: QueueId,
    pub user_id: UserId,
    pub read: bool,
    pub write: bool,
}

/// Grant view for listings, joined with the queue description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrantView {
    pub queue_id: QueueId,
    pub description: String,
    pub read: bool,
    pub write: bool,
}

/// A user plus their tokens and queue access, as returned by the admin
/// user listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccount {
    #[serde(flatten)]
    pub user: User,
    pub tokens: Vec<TokenSummary>,
    pub queues: Vec<GrantView>,
}
