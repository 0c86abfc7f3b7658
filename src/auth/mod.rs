//! Account and session handling behind the login, registration and logout pages.

pub mod crypto;

use std::sync::Arc;

use chrono::Duration;

use crate::error::AppError;
use crate::models::{Session, User};
use crate::orm::Db;
use crate::router::{Middleware, RequestContext, Response, build_cookie};
use crate::settings::Settings;

pub const LOGIN_URL: &str = "/login/";

/// Result of checking submitted credentials.
#[derive(Debug)]
pub enum LoginOutcome {
    UnknownUser,
    WrongPassword,
    Authenticated(User),
}

pub async fn authenticate(
    db: &Db,
    username: &str,
    password: &str,
) -> Result<LoginOutcome, AppError> {
    let Some(user) = User::find_by_username(db, username).await? else {
        return Ok(LoginOutcome::UnknownUser);
    };
    if crypto::verify_password(password, &user.password_hash) {
        Ok(LoginOutcome::Authenticated(user))
    } else {
        Ok(LoginOutcome::WrongPassword)
    }
}

/// Create an account. Fails with [`AppError::Conflict`] when the username is taken.
pub async fn register(
    db: &Db,
    settings: &Settings,
    username: &str,
    password: &str,
) -> Result<User, AppError> {
    if User::exists(db, username).await? {
        return Err(AppError::Conflict("Username is taken".to_string()));
    }
    let password_hash = crypto::hash_password(password, settings.fast_password_hashing)?;
    let user = User::create(db, username, &password_hash).await?;
    log::info!("Registered user `{}`", user.username);
    Ok(user)
}

/// Start a session for `user`, replacing `previous_token`'s session if one was
/// presented. Returns the new cookie token.
pub async fn login(
    db: &Db,
    settings: &Settings,
    user: &mut User,
    previous_token: Option<&str>,
) -> Result<String, AppError> {
    if let Some(token) = previous_token {
        Session::delete_by_token(db, token).await?;
    }
    Session::purge_expired(db).await?;
    let ttl = Duration::try_days(settings.session.ttl_days).ok_or_else(|| {
        AppError::Config(format!(
            "session lifetime of {} days is out of range",
            settings.session.ttl_days
        ))
    })?;
    let token = Session::create(db, user.id, ttl).await?;
    user.record_login(db).await?;
    log::info!("User `{}` logged in", user.username);
    Ok(token)
}

pub async fn logout(db: &Db, token: &str) -> Result<(), AppError> {
    if Session::delete_by_token(db, token).await? {
        log::info!("Session closed");
    }
    Ok(())
}

pub fn session_cookie(settings: &Settings, token: &str) -> String {
    build_cookie(
        &settings.session.cookie_name,
        token,
        Some(settings.session.ttl_days.saturating_mul(24 * 60 * 60)),
        settings.session.secure,
    )
}

pub fn expired_session_cookie(settings: &Settings) -> String {
    build_cookie(
        &settings.session.cookie_name,
        "",
        Some(0),
        settings.session.secure,
    )
}

/// Route middleware sending anonymous requests to the login page.
pub fn login_required(login_url: &'static str) -> Middleware {
    Arc::new(move |ctx: &mut RequestContext| {
        if ctx.is_authenticated() {
            None
        } else {
            log::debug!("Anonymous request to {} redirected to login", ctx.path);
            Some(Response::redirect(login_url))
        }
    })
}
