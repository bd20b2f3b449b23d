//! User database operations

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::models::{ADMIN_ROLE, Identity};
use sqlx::MySqlPool;

use crate::error::ServiceResult;

/// Stored user, including the password hash
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRecord {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub role: String,
}

impl UserRecord {
    pub fn identity(&self) -> Identity {
        Identity {
            id: self.id,
            email: self.email.clone(),
            role: self.role.clone(),
        }
    }
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> ServiceResult<Option<UserRecord>>;
    /// Store a hashed reset token. Returns `false` when no user has that email.
    async fn set_reset_token(
        &self,
        email: &str,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> ServiceResult<bool>;
    /// Replace the password of the user holding an unexpired `token_hash` and
    /// clear the token in the same statement. Returns `false` when no row matched.
    async fn consume_reset_token(
        &self,
        token_hash: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> ServiceResult<bool>;
    /// Create an admin, or replace the password of an existing email
    async fn upsert_admin(&self, email: &str, password_hash: &str) -> ServiceResult<()>;
}

/// MySQL-backed user store
#[derive(Clone)]
pub struct MySqlUserStore {
    pool: MySqlPool,
}

impl MySqlUserStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for MySqlUserStore {
    async fn find_by_email(&self, email: &str) -> ServiceResult<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRecord>(
            "SELECT id, email, password_hash, role FROM users WHERE email = ? LIMIT 1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn set_reset_token(
        &self,
        email: &str,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> ServiceResult<bool> {
        let result =
            sqlx::query("UPDATE users SET reset_token = ?, reset_expires = ? WHERE email = ?")
                .bind(token_hash)
                .bind(expires_at.naive_utc())
                .bind(email)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn consume_reset_token(
        &self,
        token_hash: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> ServiceResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = ?, reset_token = NULL, reset_expires = NULL
            WHERE reset_token = ? AND reset_expires > ?
            "#,
        )
        .bind(password_hash)
        .bind(token_hash)
        .bind(now.naive_utc())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn upsert_admin(&self, email: &str, password_hash: &str) -> ServiceResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (email, password_hash, role)
            VALUES (?, ?, ?)
            ON DUPLICATE KEY UPDATE password_hash = VALUES(password_hash), role = VALUES(role)
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .bind(ADMIN_ROLE)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
