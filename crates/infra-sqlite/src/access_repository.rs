// SQLite AccessRepository Implementation - users, tokens, grants

use async_trait::async_trait;
use sqlx::SqlitePool;

use qgate_core::auth::SSHA256_PREFIX;
use qgate_core::domain::{
    GrantView, QueueGrant, QueueId, QueueOperation, TokenId, TokenSummary, User, UserId, UserToken,
};
use qgate_core::error::Result;
use qgate_core::port::AccessRepository;

use crate::map_sqlx_error;

/// Bounded result set size for list operations (no pagination).
const LIST_LIMIT: i64 = 1000;

pub struct SqliteAccessRepository {
    pool: SqlitePool,
}

impl SqliteAccessRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccessRepository for SqliteAccessRepository {
    async fn insert_user(&self, user: &User) -> Result<()> {
        sqlx::query("INSERT INTO user (id, name, display_name, active) VALUES (?, ?, ?, ?)")
            .bind(&user.id)
            .bind(&user.name)
            .bind(&user.display_name)
            .bind(if user.active { 1 } else { 0 })
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn delete_user(&self, id: &UserId) -> Result<()> {
        sqlx::query("DELETE FROM user WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let rows: Vec<UserRow> =
            sqlx::query_as("SELECT id, name, display_name, active FROM user ORDER BY name LIMIT ?")
                .bind(LIST_LIMIT)
                .fetch_all(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(UserRow::into_user).collect())
    }

    async fn insert_token(&self, token: &UserToken) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO user_token (id, token_hash, user_id, description, expiration)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&token.id)
        .bind(&token.token_hash)
        .bind(&token.user_id)
        .bind(&token.description)
        .bind(token.expiration)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn delete_token(&self, id: &TokenId) -> Result<()> {
        sqlx::query("DELETE FROM user_token WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn tokens_for_user(&self, user_id: &UserId) -> Result<Vec<TokenSummary>> {
        // Deliberately never selects token_hash
        let rows: Vec<TokenRow> = sqlx::query_as(
            "SELECT id, description, expiration FROM user_token WHERE user_id = ? LIMIT ?",
        )
        .bind(user_id)
        .bind(LIST_LIMIT)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows
            .into_iter()
            .map(|r| TokenSummary {
                id: r.id,
                description: r.description,
                expiration: r.expiration,
            })
            .collect())
    }

    async fn grants_for_user(&self, user_id: &UserId) -> Result<Vec<GrantView>> {
        let rows: Vec<GrantRow> = sqlx::query_as(
            r#"
            SELECT q.id AS queue_id, q.description, a.read, a.write
            FROM queue q
            JOIN queue_access a ON q.id = a.queue_id
            WHERE a.user_id = ?
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(LIST_LIMIT)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(GrantRow::into_view).collect())
    }

    async fn set_grant(&self, grant: &QueueGrant) -> Result<()> {
        // Upsert: at most one grant row per (queue, user) pair
        sqlx::query(
            r#"
            INSERT INTO queue_access (queue_id, user_id, read, write)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (queue_id, user_id)
            DO UPDATE SET read = excluded.read, write = excluded.write
            "#,
        )
        .bind(&grant.queue_id)
        .bind(&grant.user_id)
        .bind(if grant.read { 1 } else { 0 })
        .bind(if grant.write { 1 } else { 0 })
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn unset_grant(&self, queue_id: &QueueId, user_id: &UserId) -> Result<()> {
        sqlx::query("DELETE FROM queue_access WHERE queue_id = ? AND user_id = ?")
            .bind(queue_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn grant_matches(
        &self,
        queue_id: &QueueId,
        token_hash: &str,
        operation: QueueOperation,
        now_millis: i64,
    ) -> Result<bool> {
        // Static per-operation query; the flag column is never interpolated
        // from caller input.
        let query = match operation {
            QueueOperation::Read => {
                r#"
                SELECT COUNT(*)
                FROM queue_access xs
                JOIN user_token t ON t.user_id = xs.user_id
                JOIN user u ON u.id = xs.user_id
                WHERE xs.queue_id = ? AND t.token_hash = ? AND u.active = 1
                  AND xs.read = 1
                  AND (t.expiration IS NULL OR t.expiration > ?)
                "#
            }
            QueueOperation::Write => {
                r#"
                SELECT COUNT(*)
                FROM queue_access xs
                JOIN user_token t ON t.user_id = xs.user_id
                JOIN user u ON u.id = xs.user_id
                WHERE xs.queue_id = ? AND t.token_hash = ? AND u.active = 1
                  AND xs.write = 1
                  AND (t.expiration IS NULL OR t.expiration > ?)
                "#
            }
        };

        let count: i64 = sqlx::query_scalar(query)
            .bind(queue_id)
            .bind(token_hash)
            .bind(now_millis)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(count > 0)
    }

    async fn unhashed_tokens(&self) -> Result<Vec<(TokenId, String)>> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT id, token_hash FROM user_token WHERE token_hash NOT LIKE ? || '%'",
        )
        .bind(SSHA256_PREFIX)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(rows)
    }

    async fn update_token_hash(&self, id: &TokenId, token_hash: &str) -> Result<()> {
        sqlx::query("UPDATE user_token SET token_hash = ? WHERE id = ?")
            .bind(token_hash)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: String,
    name: String,
    display_name: String,
    active: i32,
}

impl UserRow {
    fn into_user(self) -> User {
        User {
            id: self.id,
            name: self.name,
            display_name: self.display_name,
            active: self.active != 0,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TokenRow {
    id: String,
    description: String,
    expiration: Option<i64>,
}

#[derive(Debug, sqlx::FromRow)]
struct GrantRow {
    queue_id: String,
    description: String,
    read: i32,
    write: i32,
}

impl GrantRow {
    fn into_view(self) -> GrantView {
        GrantView {
            queue_id: self.queue_id,
            description: self.description,
            read: self.read != 0,
            write: self.write != 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue_repository::SqliteQueueRepository;
    use crate::{create_pool, run_migrations};
    use qgate_core::domain::Queue;
    use qgate_core::port::QueueRepository;

    async fn setup() -> (SqliteAccessRepository, SqliteQueueRepository) {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        (
            SqliteAccessRepository::new(pool.clone()),
            SqliteQueueRepository::new(pool),
        )
    }

    fn user(id: &str, active: bool) -> User {
        User::new(id, format!("user-{id}"), "Test User", active)
    }

    fn token(id: &str, user_id: &str, hash: &str, expiration: Option<i64>) -> UserToken {
        UserToken {
            id: id.to_string(),
            token_hash: hash.to_string(),
            user_id: user_id.to_string(),
            description: "test token".to_string(),
            expiration,
        }
    }

    const HASH: &str = "{SSHA256}c2FsdA==$ZGlnZXN0";

    #[tokio::test]
    async fn set_grant_upserts_one_row_per_pair() {
        let (access, queues) = setup().await;
        queues.insert_queue(&Queue::new("q1", "")).await.unwrap();
        access.insert_user(&user("u1", true)).await.unwrap();

        access
            .set_grant(&QueueGrant {
                queue_id: "q1".into(),
                user_id: "u1".into(),
                read: true,
                write: false,
            })
            .await
            .unwrap();
        access
            .set_grant(&QueueGrant {
                queue_id: "q1".into(),
                user_id: "u1".into(),
                read: false,
                write: true,
            })
            .await
            .unwrap();

        let grants = access.grants_for_user(&"u1".to_string()).await.unwrap();
        assert_eq!(grants.len(), 1);
        assert!(!grants[0].read);
        assert!(grants[0].write);
    }

    #[tokio::test]
    async fn grant_match_requires_flag_and_active_user() {
        let (access, queues) = setup().await;
        queues.insert_queue(&Queue::new("q1", "")).await.unwrap();
        access.insert_user(&user("u1", true)).await.unwrap();
        access.insert_token(&token("t1", "u1", HASH, None)).await.unwrap();
        access
            .set_grant(&QueueGrant {
                queue_id: "q1".into(),
                user_id: "u1".into(),
                read: false,
                write: true,
            })
            .await
            .unwrap();

        let q = "q1".to_string();
        assert!(access
            .grant_matches(&q, HASH, QueueOperation::Write, 1_000)
            .await
            .unwrap());
        assert!(!access
            .grant_matches(&q, HASH, QueueOperation::Read, 1_000)
            .await
            .unwrap());
        assert!(!access
            .grant_matches(&q, "other-hash", QueueOperation::Write, 1_000)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn inactive_user_never_matches() {
        let (access, queues) = setup().await;
        queues.insert_queue(&Queue::new("q1", "")).await.unwrap();
        access.insert_user(&user("u1", false)).await.unwrap();
        access.insert_token(&token("t1", "u1", HASH, None)).await.unwrap();
        access
            .set_grant(&QueueGrant {
                queue_id: "q1".into(),
                user_id: "u1".into(),
                read: true,
                write: true,
            })
            .await
            .unwrap();

        assert!(!access
            .grant_matches(&"q1".to_string(), HASH, QueueOperation::Read, 1_000)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn expired_token_never_matches() {
        let (access, queues) = setup().await;
        queues.insert_queue(&Queue::new("q1", "")).await.unwrap();
        access.insert_user(&user("u1", true)).await.unwrap();
        access
            .insert_token(&token("t1", "u1", HASH, Some(500)))
            .await
            .unwrap();
        access
            .set_grant(&QueueGrant {
                queue_id: "q1".into(),
                user_id: "u1".into(),
                read: true,
                write: true,
            })
            .await
            .unwrap();

        let q = "q1".to_string();
        // now past the expiration instant
        assert!(!access
            .grant_matches(&q, HASH, QueueOperation::Read, 1_000)
            .await
            .unwrap());
        // before expiration the same token matches
        assert!(access
            .grant_matches(&q, HASH, QueueOperation::Read, 400)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn unhashed_tokens_sees_only_legacy_rows() {
        let (access, _) = setup().await;
        access.insert_user(&user("u1", true)).await.unwrap();
        access
            .insert_token(&token("t1", "u1", "plaintext-token", None))
            .await
            .unwrap();
        access.insert_token(&token("t2", "u1", HASH, None)).await.unwrap();

        let legacy = access.unhashed_tokens().await.unwrap();
        assert_eq!(legacy, vec![("t1".to_string(), "plaintext-token".to_string())]);

        access
            .update_token_hash(&"t1".to_string(), HASH)
            .await
            .unwrap();
        assert!(access.unhashed_tokens().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn token_listing_never_contains_the_hash() {
        let (access, _) = setup().await;
        access.insert_user(&user("u1", true)).await.unwrap();
        access
            .insert_token(&token("t1", "u1", HASH, Some(9_999)))
            .await
            .unwrap();

        let tokens = access.tokens_for_user(&"u1".to_string()).await.unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].id, "t1");
        assert_eq!(tokens[0].expiration, Some(9_999));
    }

    #[tokio::test]
    async fn deleting_a_user_cascades_tokens_and_grants() {
        let (access, queues) = setup().await;
        queues.insert_queue(&Queue::new("q1", "")).await.unwrap();
        access.insert_user(&user("u1", true)).await.unwrap();
        access.insert_token(&token("t1", "u1", HASH, None)).await.unwrap();
        access
            .set_grant(&QueueGrant {
                queue_id: "q1".into(),
                user_id: "u1".into(),
                read: true,
                write: true,
            })
            .await
            .unwrap();

        access.delete_user(&"u1".to_string()).await.unwrap();
        assert!(access.tokens_for_user(&"u1".to_string()).await.unwrap().is_empty());
        assert!(access.grants_for_user(&"u1".to_string()).await.unwrap().is_empty());
        assert!(access.list_users().await.unwrap().is_empty());
    }
}
