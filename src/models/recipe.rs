use serde::Serialize;

use crate::error::AppError;
use crate::orm::{Db, FromRow, Model};

/// Placeholder stored for any recipe field submitted blank.
pub const DEFAULT_FIELD_VALUE: &str = "something";
pub const FIELD_MAX_LEN: usize = 100;

/// A planned recipe. `owner` is the owning user's name, joined in on read.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Recipe {
    pub id: i64,
    pub user_id: Option<i64>,
    pub owner: Option<String>,
    pub day: String,
    pub name: String,
    pub description: String,
}

/// The user-editable part of a recipe, already cleaned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeFields {
    pub day: String,
    pub name: String,
    pub description: String,
}

impl Default for RecipeFields {
    fn default() -> Self {
        RecipeFields {
            day: DEFAULT_FIELD_VALUE.to_string(),
            name: DEFAULT_FIELD_VALUE.to_string(),
            description: DEFAULT_FIELD_VALUE.to_string(),
        }
    }
}

impl Model for Recipe {
    fn table_name() -> &'static str {
        "recipes"
    }

    fn columns() -> Vec<(String, String)> {
        let text = format!("TEXT NOT NULL DEFAULT '{}'", DEFAULT_FIELD_VALUE);
        vec![
            ("id".into(), "INTEGER PRIMARY KEY AUTOINCREMENT".into()),
            (
                "user_id".into(),
                "INTEGER REFERENCES users(id) ON DELETE SET NULL".into(),
            ),
            ("day".into(), text.clone()),
            ("name".into(), text.clone()),
            ("description".into(), text),
        ]
    }
}

const SELECT_RECIPE: &str = "SELECT r.id, r.user_id, u.username AS owner, r.day, r.name, r.description \
     FROM recipes r LEFT JOIN users u ON u.id = r.user_id";

/// Escape LIKE wildcards so the search term only ever matches literally.
fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

impl Recipe {
    pub async fn create(
        db: &Db,
        owner_id: Option<i64>,
        fields: &RecipeFields,
    ) -> Result<Recipe, AppError> {
        let done = sqlx::query(
            "INSERT INTO recipes (user_id, day, name, description) VALUES (?, ?, ?, ?)",
        )
        .bind(owner_id)
        .bind(&fields.day)
        .bind(&fields.name)
        .bind(&fields.description)
        .execute(db.pool())
        .await?;
        Recipe::get(db, done.last_insert_rowid()).await
    }

    /// Fetch one recipe, or [`AppError::NotFound`].
    pub async fn get(db: &Db, id: i64) -> Result<Recipe, AppError> {
        sqlx::query_as(&format!("{SELECT_RECIPE} WHERE r.id = ?"))
            .bind(id)
            .fetch_optional(db.pool())
            .await?
            .ok_or(AppError::NotFound("Recipe"))
    }

    pub async fn all(db: &Db) -> Result<Vec<Recipe>, AppError> {
        Recipe::search(db, None).await
    }

    /// All recipes in insertion order, narrowed to those whose day contains
    /// `day_query` when one is given.
    ///
    /// Matching uses SQLite `LIKE`, which folds case for ASCII letters only:
    /// `mon` finds `MONDAY`, but `été` does not find `ÉTÉ`.
    pub async fn search(db: &Db, day_query: Option<&str>) -> Result<Vec<Recipe>, AppError> {
        let recipes: Vec<Recipe> = match day_query.filter(|q| !q.is_empty()) {
            Some(q) => {
                sqlx::query_as(&format!(
                    "{SELECT_RECIPE} WHERE r.day LIKE '%' || ? || '%' ESCAPE '\\' ORDER BY r.id"
                ))
                .bind(escape_like(q))
                .fetch_all(db.pool())
                .await?
            }
            None => {
                sqlx::query_as(&format!("{SELECT_RECIPE} ORDER BY r.id"))
                    .fetch_all(db.pool())
                    .await?
            }
        };
        Ok(recipes)
    }

    pub fn apply(&mut self, fields: RecipeFields) {
        self.day = fields.day;
        self.name = fields.name;
        self.description = fields.description;
    }

    /// Persist the current field values.
    pub async fn save(&self, db: &Db) -> Result<(), AppError> {
        let done = sqlx::query("UPDATE recipes SET day = ?, name = ?, description = ? WHERE id = ?")
            .bind(&self.day)
            .bind(&self.name)
            .bind(&self.description)
            .bind(self.id)
            .execute(db.pool())
            .await?;
        if done.rows_affected() == 0 {
            return Err(AppError::NotFound("Recipe"));
        }
        Ok(())
    }

    pub async fn delete(self, db: &Db) -> Result<(), AppError> {
        sqlx::query("DELETE FROM recipes WHERE id = ?")
            .bind(self.id)
            .execute(db.pool())
            .await?;
        Ok(())
    }
}
