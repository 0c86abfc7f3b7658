mod recipe;
mod session;
mod user;

pub use recipe::{DEFAULT_FIELD_VALUE, FIELD_MAX_LEN, Recipe, RecipeFields};
pub use session::Session;
pub use user::{USERNAME_MAX_LEN, User};

use std::sync::Arc;

use crate::orm::{Db, Migration, Model, auto_migrate};

/// Schema migrations for every model, in dependency order.
pub fn migrations() -> Vec<Migration> {
    vec![
        Migration(|db| User::migrate(db)),
        Migration(|db| Session::migrate(db)),
        Migration(|db| Recipe::migrate(db)),
    ]
}

/// Create or update every table the application needs.
pub async fn migrate_all(db: Arc<Db>) -> Result<(), sqlx::Error> {
    auto_migrate(db, &migrations()).await
}
