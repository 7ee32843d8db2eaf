// Access Repository Port (Interface) - users, tokens, grants

use crate::domain::{
    GrantView, QueueGrant, QueueId, QueueOperation, TokenId, TokenSummary, User, UserId, UserToken,
};
use crate::error::Result;
use async_trait::async_trait;

/// Repository interface for the identity/grant registry.
#[async_trait]
pub trait AccessRepository: Send + Sync {
    /// Insert a new user
    async fn insert_user(&self, user: &User) -> Result<()>;

    /// Delete a user (tokens and grants cascade). No-op on missing id.
    async fn delete_user(&self, id: &UserId) -> Result<()>;

    /// List users (bounded result set)
    async fn list_users(&self) -> Result<Vec<User>>;

    /// Insert a new token (hash already computed by the caller)
    async fn insert_token(&self, token: &UserToken) -> Result<()>;

    /// Delete a token. No-op on missing id.
    async fn delete_token(&self, id: &TokenId) -> Result<()>;

    /// Token summaries for a user: id, description, expiration - never the hash.
    async fn tokens_for_user(&self, user_id: &UserId) -> Result<Vec<TokenSummary>>;

    /// Queue access rows for a user, joined with queue descriptions.
    async fn grants_for_user(&self, user_id: &UserId) -> Result<Vec<GrantView>>;

    /// Create or update the grant for (queue, user). At most one row per pair.
    async fn set_grant(&self, grant: &QueueGrant) -> Result<()>;

    /// Remove the grant for (queue, user). No-op when absent.
    async fn unset_grant(&self, queue_id: &QueueId, user_id: &UserId) -> Result<()>;

    /// True iff an active user holds a non-expired token matching
    /// `token_hash` and a grant for `queue_id` with the requested operation
    /// flag set. `now_millis` is the expiry comparison instant.
    async fn grant_matches(
        &self,
        queue_id: &QueueId,
        token_hash: &str,
        operation: QueueOperation,
        now_millis: i64,
    ) -> Result<bool>;

    /// Tokens still stored without the expected hash prefix, as
    /// (id, stored value) pairs. Used by the legacy rehash migration.
    async fn unhashed_tokens(&self) -> Result<Vec<(TokenId, String)>>;

    /// Replace the stored hash for a token.
    async fn update_token_hash(&self, id: &TokenId, token_hash: &str) -> Result<()>;
}
