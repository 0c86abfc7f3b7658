use std::sync::Arc;

use recipe_planner::models::migrate_all;
use recipe_planner::orm::Db;
use recipe_planner::template::set_display_logs;
use recipe_planner::{AppState, Settings, urls};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::from_env()?;
    set_display_logs(settings.debug || settings.template.debug);
    if settings.fast_password_hashing {
        log::warn!("Fast password hashing is enabled; do not use this configuration in production");
    }

    let db = Arc::new(Db::connect(&settings.database_url, settings.db_max_connections).await?);
    migrate_all(db.clone()).await?;

    let state = AppState {
        db,
        settings: settings.clone(),
    };
    urls::app(state).run(settings).await
}
