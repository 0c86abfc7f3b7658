//! Minimal async storage layer (sqlite + sqlx)
//!
//! Usage:
//! let db = Db::connect("sqlite::memory:", 1).await?;
//! migrate_all(Arc::new(db.clone())).await?;
//! let recipes = Recipe::all(&db).await?;
//!
//! Statements that carry user input go through [`Db::pool`] with bound
//! parameters; `execute` is for fixed SQL only.
pub use futures::future::BoxFuture;
use log::{debug, info};
use sha2::{Digest, Sha256};
pub use sqlx::FromRow;
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Executor, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;

const MIGRATIONS_TABLE: &str = "__schema_migrations";

/// An async database pool wrapper.
#[derive(Clone)]
pub struct Db {
    pool: SqlitePool,
}

/// Migration function pointer for a model.
pub type MigrationFn = fn(Arc<Db>) -> BoxFuture<'static, Result<(), sqlx::Error>>;

pub struct Migration(pub MigrationFn);

impl std::ops::Deref for Migration {
    type Target = MigrationFn;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[async_trait::async_trait]
pub trait Model: Send + Sync {
    fn table_name() -> &'static str;
    /// Column name and full SQL column definition, in table order.
    fn columns() -> Vec<(String, String)>;

    fn create_table_sql() -> String {
        let cols: Vec<String> = Self::columns()
            .into_iter()
            .map(|(name, sqltype)| format!("{} {}", name, sqltype))
            .collect();
        format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            Self::table_name(),
            cols.join(", ")
        )
    }

    async fn migrate(db: Arc<Db>) -> Result<(), sqlx::Error> {
        let table_name = Self::table_name();
        let create_sql = Self::create_table_sql();
        let schema_hash = hash(&create_sql);

        db.execute(&format!(
            "CREATE TABLE IF NOT EXISTS {} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                table_name TEXT UNIQUE NOT NULL,
                schema_sql TEXT NOT NULL,
                hash TEXT NOT NULL,
                applied_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
            MIGRATIONS_TABLE
        ))
        .await?;

        let applied: Vec<(String,)> = sqlx::query_as(&format!(
            "SELECT hash FROM {} WHERE table_name = ?",
            MIGRATIONS_TABLE
        ))
        .bind(table_name)
        .fetch_all(db.pool())
        .await?;

        if applied.is_empty() {
            db.execute(&create_sql).await?;
            sqlx::query(&format!(
                "INSERT INTO {} (table_name, schema_sql, hash) VALUES (?, ?, ?)",
                MIGRATIONS_TABLE
            ))
            .bind(table_name)
            .bind(&create_sql)
            .bind(&schema_hash)
            .execute(db.pool())
            .await?;
            info!(
                "Migrated `{}` (table created, initial schema applied).",
                table_name
            );
            return Ok(());
        }

        if applied[0].0 == schema_hash {
            debug!("Schema for `{}` is up to date.", table_name);
            return Ok(());
        }

        // Existing columns as sqlite sees them
        let pragma_sql = format!("PRAGMA table_info({})", table_name);
        let cols: Vec<String> = sqlx::query(&pragma_sql)
            .fetch_all(db.pool())
            .await?
            .into_iter()
            .map(|row: sqlx::sqlite::SqliteRow| row.get::<String, _>("name"))
            .collect();

        let mut added = Vec::new();
        for (name, sqltype) in Self::columns() {
            if !cols.contains(&name) {
                let statement = format!(
                    "ALTER TABLE {} ADD COLUMN {} {};",
                    table_name, name, sqltype
                );
                db.execute(&statement).await?;
                added.push((name, sqltype));
            }
        }

        if added.is_empty() {
            info!("No column changes detected for `{}`.", table_name);
        } else {
            info!(
                "Schema changes detected for `{}`, the following columns were added:",
                table_name
            );
            for (name, sqltype) in &added {
                info!("  - {} {}", name, sqltype);
            }
        }

        sqlx::query(&format!(
            "UPDATE {} SET schema_sql = ?, hash = ?, applied_at = CURRENT_TIMESTAMP \
             WHERE table_name = ?",
            MIGRATIONS_TABLE
        ))
        .bind(&create_sql)
        .bind(&schema_hash)
        .bind(table_name)
        .execute(db.pool())
        .await?;
        Ok(())
    }
}

// Helper function to hash a SQL string
fn hash(s: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(s.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn is_in_memory(uri: &str) -> bool {
    uri.contains(":memory:") || uri.contains("mode=memory")
}

impl Db {
    /// Connect (or create) a SQLite database at the given URI.
    ///
    /// In-memory databases get a single connection that is never recycled,
    /// otherwise every pooled connection would see its own empty database.
    pub async fn connect(uri: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        info!("Connecting to SQLite database at URI: {}", uri);
        let options = SqliteConnectOptions::from_str(uri)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = if is_in_memory(uri) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(max_connections.max(1))
                .connect_with(options)
                .await?
        };
        info!("Connected to SQLite database: {}", uri);
        Ok(Db { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Execute a fixed SQL statement, e.g. DDL.
    pub async fn execute(&self, sql: &str) -> Result<(), sqlx::Error> {
        debug!("Executing SQL: {}", sql);
        let result = self.pool.execute(sql).await;
        if let Err(e) = &result {
            log::error!("SQL execution failed: {}", e);
        }
        result.map(|_| ())
    }
}

/// Run the given model migrations in order.
pub async fn auto_migrate(db: Arc<Db>, migrations: &[Migration]) -> Result<(), sqlx::Error> {
    info!("Starting auto migration of {} models...", migrations.len());
    for m in migrations {
        if let Err(e) = m(db.clone()).await {
            log::error!("Auto-migration failed for a model: {}", e);
            return Err(e);
        }
    }
    info!("Auto migration completed for {} models.", migrations.len());
    Ok(())
}
