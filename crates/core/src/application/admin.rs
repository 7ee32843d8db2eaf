// Admin Service - management surface behind the admin credential
//
// Transport and authentication of the caller are the collaborator layer's
// concern; these methods assume the admin credential was already checked
// via AuthorizationService::authorize_admin.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::credential;
use crate::config::ConfigHandle;
use crate::domain::{Queue, QueueGrant, User, UserAccount, UserToken};
use crate::error::{AppError, Result};
use crate::port::{AccessRepository, IdProvider, QueueRepository};

/// Length of generated bearer tokens.
const TOKEN_LENGTH: usize = 64;

/// Returned once at token creation. The plaintext is never retrievable again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedToken {
    pub id: String,
    pub token: String,
}

pub struct AdminService {
    queue_repo: Arc<dyn QueueRepository>,
    access_repo: Arc<dyn AccessRepository>,
    id_provider: Arc<dyn IdProvider>,
    config: Arc<ConfigHandle>,
}

impl AdminService {
    pub fn new(
        queue_repo: Arc<dyn QueueRepository>,
        access_repo: Arc<dyn AccessRepository>,
        id_provider: Arc<dyn IdProvider>,
        config: Arc<ConfigHandle>,
    ) -> Self {
        Self {
            queue_repo,
            access_repo,
            id_provider,
            config,
        }
    }

    // --- queues ---

    pub async fn list_queues(&self) -> Result<Vec<Queue>> {
        self.queue_repo.list_queues().await
    }

    /// Create a queue with a minted id. Not safely retried without caller
    /// deduplication: every call creates a fresh queue.
    pub async fn create_queue(&self, description: &str) -> Result<Queue> {
        let queue = Queue::new(self.id_provider.generate_id(), description);
        self.queue_repo.insert_queue(&queue).await?;
        info!(queue_id = %queue.id, "queue created");
        Ok(queue)
    }

    /// Delete a queue and (via the store) its entries. No-op on empty id.
    pub async fn delete_queue(&self, id: &str) -> Result<()> {
        if id.trim().is_empty() {
            return Ok(());
        }
        self.queue_repo.delete_queue(&id.to_string()).await
    }

    // --- users ---

    /// List users with their token summaries and queue access.
    pub async fn list_users(&self) -> Result<Vec<UserAccount>> {
        let users = self.access_repo.list_users().await?;
        let mut accounts = Vec::with_capacity(users.len());
        for user in users {
            let tokens = self.access_repo.tokens_for_user(&user.id).await?;
            let queues = self.access_repo.grants_for_user(&user.id).await?;
            accounts.push(UserAccount {
                user,
                tokens,
                queues,
            });
        }
        Ok(accounts)
    }

    pub async fn create_user(&self, name: &str, display_name: &str, active: bool) -> Result<User> {
        let user = User::new(self.id_provider.generate_id(), name, display_name, active);
        self.access_repo.insert_user(&user).await?;
        info!(user_id = %user.id, "user created");
        Ok(user)
    }

    pub async fn delete_user(&self, id: &str) -> Result<()> {
        if id.trim().is_empty() {
            return Ok(());
        }
        self.access_repo.delete_user(&id.to_string()).await
    }

    // --- tokens ---

    /// Mint a token for a user. The plaintext is generated once and returned
    /// once; only the salted hash is stored.
    pub async fn create_token(
        &self,
        user_id: &str,
        description: &str,
        expiration: Option<i64>,
    ) -> Result<CreatedToken> {
        let plaintext = credential::generate_token(TOKEN_LENGTH);
        let snapshot = self.config.snapshot();
        let token = UserToken {
            id: self.id_provider.generate_id(),
            token_hash: credential::hash_token(snapshot.token_salt.as_deref(), &plaintext),
            user_id: user_id.to_string(),
            description: description.to_string(),
            expiration,
        };
        self.access_repo.insert_token(&token).await?;
        info!(token_id = %token.id, user_id = %user_id, "token created");
        Ok(CreatedToken {
            id: token.id,
            token: plaintext,
        })
    }

    pub async fn delete_token(&self, id: &str) -> Result<()> {
        if id.trim().is_empty() {
            return Ok(());
        }
        self.access_repo.delete_token(&id.to_string()).await
    }

    // --- grants ---

    /// Create or update the (user, queue) grant. No-op on empty ids.
    pub async fn set_authorization(
        &self,
        user_id: &str,
        queue_id: &str,
        read: bool,
        write: bool,
    ) -> Result<()> {
        if user_id.trim().is_empty() || queue_id.trim().is_empty() {
            return Ok(());
        }
        let grant = QueueGrant {
            queue_id: queue_id.to_string(),
            user_id: user_id.to_string(),
            read,
            write,
        };
        self.access_repo.set_grant(&grant).await
    }

    /// Remove the (user, queue) grant. No-op on empty ids or missing grant.
    pub async fn unset_authorization(&self, user_id: &str, queue_id: &str) -> Result<()> {
        if user_id.trim().is_empty() || queue_id.trim().is_empty() {
            return Ok(());
        }
        self.access_repo
            .unset_grant(&queue_id.to_string(), &user_id.to_string())
            .await
    }

    // --- utilities ---

    /// Migrate tokens stored without the hash prefix into hashed form, one
    /// row at a time. An unchanged rehash result signals a systemic hashing
    /// failure (typically a missing salt) and aborts the whole run; rows
    /// migrated before the abort stay migrated.
    pub async fn rehash_legacy_tokens(&self) -> Result<u64> {
        let rows = self.access_repo.unhashed_tokens().await?;
        let snapshot = self.config.snapshot();
        let mut updated = 0u64;
        for (id, plaintext) in rows {
            let hashed = credential::hash_token(snapshot.token_salt.as_deref(), &plaintext);
            if hashed == plaintext {
                return Err(AppError::InvalidState(
                    "token rehash produced no change, aborting".to_string(),
                ));
            }
            self.access_repo.update_token_hash(&id, &hashed).await?;
            updated += 1;
        }
        info!(updated, "legacy tokens rehashed");
        Ok(updated)
    }

    /// Hash a password with a fresh salt, for seeding the admin credential.
    pub fn hash_password(&self, password: &str) -> Result<String> {
        let salt = credential::generate_salt();
        credential::ssha256(&salt, password)
            .ok_or_else(|| AppError::InvalidState("password must not be empty".to_string()))
    }

    /// Mint a fresh unique id.
    pub fn generate_uuid(&self) -> String {
        self.id_provider.generate_id()
    }

    /// Rebuild the configuration snapshot from its sources.
    pub fn reload_config(&self) -> Result<()> {
        self.config.reload()
    }
}
