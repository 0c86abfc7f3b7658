use chrono::Utc;
use serde::Serialize;

use crate::error::AppError;
use crate::orm::{Db, FromRow, Model};

pub const USERNAME_MAX_LEN: usize = 150;

/// A registered account. Usernames are unique and case-sensitive.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip)]
    pub password_hash: String,
    pub date_joined: String,
    pub last_login: Option<String>,
}

impl Model for User {
    fn table_name() -> &'static str {
        "users"
    }

    fn columns() -> Vec<(String, String)> {
        vec![
            ("id".into(), "INTEGER PRIMARY KEY AUTOINCREMENT".into()),
            ("username".into(), "TEXT NOT NULL UNIQUE".into()),
            ("password_hash".into(), "TEXT NOT NULL".into()),
            ("date_joined".into(), "TEXT NOT NULL".into()),
            ("last_login".into(), "TEXT".into()),
        ]
    }
}

const SELECT_USER: &str =
    "SELECT id, username, password_hash, date_joined, last_login FROM users";

impl User {
    pub async fn exists(db: &Db, username: &str) -> Result<bool, AppError> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(db.pool())
            .await?;
        Ok(row.is_some())
    }

    pub async fn find(db: &Db, id: i64) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as(&format!("{SELECT_USER} WHERE id = ?"))
            .bind(id)
            .fetch_optional(db.pool())
            .await?;
        Ok(user)
    }

    pub async fn find_by_username(db: &Db, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as(&format!("{SELECT_USER} WHERE username = ?"))
            .bind(username)
            .fetch_optional(db.pool())
            .await?;
        Ok(user)
    }

    /// Insert a new account. A username collision surfaces as [`AppError::Conflict`].
    pub async fn create(db: &Db, username: &str, password_hash: &str) -> Result<User, AppError> {
        let result = sqlx::query(
            "INSERT INTO users (username, password_hash, date_joined) VALUES (?, ?, ?)",
        )
        .bind(username)
        .bind(password_hash)
        .bind(Utc::now().to_rfc3339())
        .execute(db.pool())
        .await;

        let id = match result {
            Ok(done) => done.last_insert_rowid(),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                return Err(AppError::Conflict("Username is taken".to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        User::find(db, id).await?.ok_or(AppError::NotFound("User"))
    }

    pub async fn record_login(&mut self, db: &Db) -> Result<(), AppError> {
        let now = Utc::now().to_rfc3339();
        sqlx::query("UPDATE users SET last_login = ? WHERE id = ?")
            .bind(&now)
            .bind(self.id)
            .execute(db.pool())
            .await?;
        self.last_login = Some(now);
        Ok(())
    }

    /// Remove the account. Its sessions go with it and its recipes lose their owner.
    pub async fn delete(self, db: &Db) -> Result<(), AppError> {
        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(self.id)
            .execute(db.pool())
            .await?;
        log::info!("Deleted user `{}`", self.username);
        Ok(())
    }
}
