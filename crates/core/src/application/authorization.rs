// Authorization Service
//
// Per request: Unauthenticated -> (resolve identity) -> Authenticated ->
// (check grant) -> Authorized | Denied. There is no persisted session;
// every call re-derives identity from the presented secret and the current
// configuration snapshot.

use std::sync::Arc;

use tracing::warn;

use crate::auth::credential;
use crate::config::ConfigHandle;
use crate::domain::QueueOperation;
use crate::error::AuthError;
use crate::port::{AccessRepository, TimeProvider};

pub struct AuthorizationService {
    access_repo: Arc<dyn AccessRepository>,
    config: Arc<ConfigHandle>,
    time_provider: Arc<dyn TimeProvider>,
}

impl AuthorizationService {
    pub fn new(
        access_repo: Arc<dyn AccessRepository>,
        config: Arc<ConfigHandle>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            access_repo,
            config,
            time_provider,
        }
    }

    /// Authorize a queue operation presented with a bearer secret.
    ///
    /// The candidate secret is hashed with the *stored* salt and compared
    /// against token hashes in the registry. A lookup fault is folded into
    /// `AccessDenied` rather than distinguished to the caller.
    pub async fn authorize_queue(
        &self,
        secret: &str,
        queue_id: &str,
        operation: QueueOperation,
    ) -> Result<(), AuthError> {
        if secret.trim().is_empty() || queue_id.trim().is_empty() {
            return Err(AuthError::InvalidCredentials);
        }
        let snapshot = self.config.snapshot();
        let token_hash = credential::hash_token(snapshot.token_salt.as_deref(), secret);
        let now = self.time_provider.now_millis();
        match self
            .access_repo
            .grant_matches(&queue_id.to_string(), &token_hash, operation, now)
            .await
        {
            Ok(true) => Ok(()),
            Ok(false) => Err(AuthError::AccessDenied),
            Err(e) => {
                warn!(error = ?e, %operation, "grant lookup failed during authorization");
                Err(AuthError::AccessDenied)
            }
        }
    }

    /// Authorize the configured admin credential.
    pub fn authorize_admin(&self, username: &str, password: &str) -> Result<(), AuthError> {
        if username.trim().is_empty() || password.trim().is_empty() {
            return Err(AuthError::InvalidCredentials);
        }
        let snapshot = self.config.snapshot();
        if username != snapshot.admin_user {
            return Err(AuthError::InvalidCredentials);
        }
        if credential::verify(&snapshot.admin_pass_hash, password) {
            return Ok(());
        }
        Err(AuthError::InvalidCredentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::credential::ssha256;
    use crate::config::AppConfig;
    use crate::domain::{GrantView, QueueGrant, QueueId, TokenId, TokenSummary, User, UserId, UserToken};
    use crate::error::{AppError, Result};
    use async_trait::async_trait;

    /// In-memory registry fake: one stored token hash, one grant row.
    struct FakeRegistry {
        token_hash: String,
        queue_id: String,
        read: bool,
        write: bool,
        active: bool,
        expiration: Option<i64>,
        fail_lookup: bool,
    }

    #[async_trait]
    impl AccessRepository for FakeRegistry {
        async fn insert_user(&self, _user: &User) -> Result<()> {
            unimplemented!()
        }
        async fn delete_user(&self, _id: &UserId) -> Result<()> {
            unimplemented!()
        }
        async fn list_users(&self) -> Result<Vec<User>> {
            unimplemented!()
        }
        async fn insert_token(&self, _token: &UserToken) -> Result<()> {
            unimplemented!()
        }
        async fn delete_token(&self, _id: &TokenId) -> Result<()> {
            unimplemented!()
        }
        async fn tokens_for_user(&self, _user_id: &UserId) -> Result<Vec<TokenSummary>> {
            unimplemented!()
        }
        async fn grants_for_user(&self, _user_id: &UserId) -> Result<Vec<GrantView>> {
            unimplemented!()
        }
        async fn set_grant(&self, _grant: &QueueGrant) -> Result<()> {
            unimplemented!()
        }
        async fn unset_grant(&self, _queue_id: &QueueId, _user_id: &UserId) -> Result<()> {
            unimplemented!()
        }

        async fn grant_matches(
            &self,
            queue_id: &QueueId,
            token_hash: &str,
            operation: QueueOperation,
            now_millis: i64,
        ) -> Result<bool> {
            if self.fail_lookup {
                return Err(AppError::Database("connection lost".into()));
            }
            let flag = match operation {
                QueueOperation::Read => self.read,
                QueueOperation::Write => self.write,
            };
            let expired = self.expiration.is_some_and(|exp| exp <= now_millis);
            Ok(self.active
                && !expired
                && flag
                && *queue_id == self.queue_id
                && token_hash == self.token_hash)
        }

        async fn unhashed_tokens(&self) -> Result<Vec<(TokenId, String)>> {
            unimplemented!()
        }
        async fn update_token_hash(&self, _id: &TokenId, _token_hash: &str) -> Result<()> {
            unimplemented!()
        }
    }

    struct FixedTime(i64);
    impl TimeProvider for FixedTime {
        fn now_millis(&self) -> i64 {
            self.0
        }
    }

    const SALT: &str = "abc12345";
    const SECRET: &str = "token-secret";

    fn service(registry: FakeRegistry, salt: Option<&str>) -> AuthorizationService {
        let config = ConfigHandle::from_config(AppConfig {
            admin_user: "admin".into(),
            admin_pass_hash: ssha256(SALT, "admin-pass").unwrap(),
            token_salt: salt.map(String::from),
            ..AppConfig::default()
        });
        AuthorizationService::new(Arc::new(registry), Arc::new(config), Arc::new(FixedTime(1_000)))
    }

    fn registry() -> FakeRegistry {
        FakeRegistry {
            token_hash: ssha256(SALT, SECRET).unwrap(),
            queue_id: "q1".into(),
            read: true,
            write: true,
            active: true,
            expiration: None,
            fail_lookup: false,
        }
    }

    #[tokio::test]
    async fn empty_inputs_are_invalid_credentials() {
        let svc = service(registry(), Some(SALT));
        assert_eq!(
            svc.authorize_queue("", "q1", QueueOperation::Read).await,
            Err(AuthError::InvalidCredentials)
        );
        assert_eq!(
            svc.authorize_queue(SECRET, "  ", QueueOperation::Read).await,
            Err(AuthError::InvalidCredentials)
        );
    }

    #[tokio::test]
    async fn matching_grant_authorizes() {
        let svc = service(registry(), Some(SALT));
        assert!(svc.authorize_queue(SECRET, "q1", QueueOperation::Write).await.is_ok());
    }

    #[tokio::test]
    async fn wrong_secret_is_access_denied() {
        let svc = service(registry(), Some(SALT));
        assert_eq!(
            svc.authorize_queue("wrong", "q1", QueueOperation::Read).await,
            Err(AuthError::AccessDenied)
        );
    }

    #[tokio::test]
    async fn lookup_fault_is_access_denied() {
        let mut reg = registry();
        reg.fail_lookup = true;
        let svc = service(reg, Some(SALT));
        assert_eq!(
            svc.authorize_queue(SECRET, "q1", QueueOperation::Read).await,
            Err(AuthError::AccessDenied)
        );
    }

    #[tokio::test]
    async fn missing_salt_never_bypasses_the_check() {
        // The stored token is hashed; without a configured salt the raw
        // secret is used for comparison and the lookup fails.
        let svc = service(registry(), None);
        assert_eq!(
            svc.authorize_queue(SECRET, "q1", QueueOperation::Read).await,
            Err(AuthError::AccessDenied)
        );
    }

    #[tokio::test]
    async fn expired_token_is_denied() {
        let mut reg = registry();
        reg.expiration = Some(500); // now is 1_000
        let svc = service(reg, Some(SALT));
        assert_eq!(
            svc.authorize_queue(SECRET, "q1", QueueOperation::Read).await,
            Err(AuthError::AccessDenied)
        );
    }

    #[test]
    fn admin_credential_checks() {
        let svc = service(registry(), Some(SALT));
        assert!(svc.authorize_admin("admin", "admin-pass").is_ok());
        assert_eq!(
            svc.authorize_admin("admin", "nope"),
            Err(AuthError::InvalidCredentials)
        );
        assert_eq!(
            svc.authorize_admin("root", "admin-pass"),
            Err(AuthError::InvalidCredentials)
        );
        assert_eq!(svc.authorize_admin("", ""), Err(AuthError::InvalidCredentials));
    }
}
