//! Cleaning of submitted form data.

use crate::error::AppError;
use crate::models::{DEFAULT_FIELD_VALUE, FIELD_MAX_LEN, RecipeFields, USERNAME_MAX_LEN};
use crate::router::RequestContext;

/// Raw `day`/`name`/`description` as submitted. Any of them may be missing.
#[derive(Debug, Clone, Default)]
pub struct RecipeForm {
    pub day: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
}

impl RecipeForm {
    pub fn from_request(ctx: &RequestContext) -> Self {
        let field = |key: &str| ctx.form_value(key).map(str::to_string);
        RecipeForm {
            day: field("day"),
            name: field("name"),
            description: field("description"),
        }
    }

    /// Blank or missing fields become the placeholder; over-long ones are rejected.
    pub fn clean(self) -> Result<RecipeFields, AppError> {
        Ok(RecipeFields {
            day: clean_field("Day", self.day)?,
            name: clean_field("Name", self.name)?,
            description: clean_field("Description", self.description)?,
        })
    }
}

fn clean_field(label: &str, value: Option<String>) -> Result<String, AppError> {
    let value = value.map(|v| v.trim().to_string()).unwrap_or_default();
    if value.is_empty() {
        return Ok(DEFAULT_FIELD_VALUE.to_string());
    }
    if value.chars().count() > FIELD_MAX_LEN {
        return Err(AppError::Validation(format!(
            "{label} must be at most {FIELD_MAX_LEN} characters"
        )));
    }
    Ok(value)
}

/// Submitted `username`/`password`. Missing keys read as empty.
#[derive(Debug, Clone, Default)]
pub struct CredentialsForm {
    pub username: String,
    pub password: String,
}

impl CredentialsForm {
    pub fn from_request(ctx: &RequestContext) -> Self {
        CredentialsForm {
            username: ctx.form_value("username").unwrap_or_default().trim().to_string(),
            password: ctx.form_value("password").unwrap_or_default().to_string(),
        }
    }

    pub fn validate_new_account(&self) -> Result<(), AppError> {
        if self.username.is_empty() || self.password.is_empty() {
            return Err(AppError::Validation(
                "Username and password are required".to_string(),
            ));
        }
        if self.username.chars().count() > USERNAME_MAX_LEN {
            return Err(AppError::Validation(format!(
                "Username must be at most {USERNAME_MAX_LEN} characters"
            )));
        }
        Ok(())
    }
}
