use thiserror::Error;

use crate::router::Response;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl AppError {
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::NotFound(_) => 404,
            AppError::Validation(_) | AppError::BadRequest(_) => 400,
            AppError::Conflict(_) => 409,
            AppError::Database(_) | AppError::PasswordHash(_) | AppError::Config(_) => 500,
        }
    }
}

impl From<argon2::password_hash::Error> for AppError {
    fn from(e: argon2::password_hash::Error) -> Self {
        AppError::PasswordHash(e.to_string())
    }
}

impl From<argon2::Error> for AppError {
    fn from(e: argon2::Error) -> Self {
        AppError::PasswordHash(e.to_string())
    }
}

impl From<AppError> for Response {
    fn from(err: AppError) -> Self {
        let status = err.status_code();
        let body = match &err {
            AppError::NotFound(_) => return Response::not_found(),
            AppError::Validation(msg) | AppError::Conflict(msg) | AppError::BadRequest(msg) => {
                log::warn!("Request rejected: {}", err);
                msg.clone()
            }
            _ => {
                log::error!("Request failed: {}", err);
                "500 Internal Server Error".to_string()
            }
        };
        Response::status(status, body)
    }
}
