pub mod auth;
pub mod error;
pub mod flash;
pub mod forms;
pub mod models;
pub mod orm;
pub mod router;
pub mod settings;
pub mod template;
pub mod urls;
pub mod views;

pub use error::AppError;
pub use router::{AppState, Router};
pub use settings::Settings;
