use chrono::{Duration, Utc};

use super::User;
use crate::auth::crypto::{generate_token, hash_token};
use crate::error::AppError;
use crate::orm::{Db, FromRow, Model};

/// A server-side login session. Only the SHA-256 of the cookie token is stored.
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub id: i64,
    pub token_hash: String,
    pub user_id: i64,
    /// Unix seconds.
    pub expires_at: i64,
}

impl Model for Session {
    fn table_name() -> &'static str {
        "sessions"
    }

    fn columns() -> Vec<(String, String)> {
        vec![
            ("id".into(), "INTEGER PRIMARY KEY AUTOINCREMENT".into()),
            ("token_hash".into(), "TEXT NOT NULL UNIQUE".into()),
            (
                "user_id".into(),
                "INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE".into(),
            ),
            ("expires_at".into(), "INTEGER NOT NULL".into()),
        ]
    }
}

impl Session {
    /// Open a session for `user_id` and return the raw token for the cookie.
    /// A `ttl` that overflows the calendar is a configuration error.
    pub async fn create(db: &Db, user_id: i64, ttl: Duration) -> Result<String, AppError> {
        let expires_at = Utc::now()
            .checked_add_signed(ttl)
            .ok_or_else(|| AppError::Config(format!("session lifetime {ttl} is out of range")))?
            .timestamp();
        let token = generate_token();

        sqlx::query("INSERT INTO sessions (token_hash, user_id, expires_at) VALUES (?, ?, ?)")
            .bind(hash_token(&token))
            .bind(user_id)
            .bind(expires_at)
            .execute(db.pool())
            .await?;

        Ok(token)
    }

    /// The user behind an unexpired session token, if any.
    pub async fn user_for_token(db: &Db, token: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as(
            "SELECT u.id, u.username, u.password_hash, u.date_joined, u.last_login \
             FROM sessions s INNER JOIN users u ON u.id = s.user_id \
             WHERE s.token_hash = ? AND s.expires_at > ?",
        )
        .bind(hash_token(token))
        .bind(Utc::now().timestamp())
        .fetch_optional(db.pool())
        .await?;
        Ok(user)
    }

    pub async fn delete_by_token(db: &Db, token: &str) -> Result<bool, AppError> {
        let done = sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
            .bind(hash_token(token))
            .execute(db.pool())
            .await?;
        Ok(done.rows_affected() > 0)
    }

    /// Drop every expired session, returning how many were removed.
    pub async fn purge_expired(db: &Db) -> Result<u64, AppError> {
        let done = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(Utc::now().timestamp())
            .execute(db.pool())
            .await?;
        if done.rows_affected() > 0 {
            log::info!("Purged {} expired sessions", done.rows_affected());
        }
        Ok(done.rows_affected())
    }
}
