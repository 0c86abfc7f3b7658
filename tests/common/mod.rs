#![allow(dead_code)]

use std::sync::Arc;

use recipe_planner::models::migrate_all;
use recipe_planner::orm::Db;
use recipe_planner::router::{Method, RequestContext, Response};
use recipe_planner::{AppState, Router, Settings, urls};

pub async fn test_state() -> AppState {
    let db = Arc::new(Db::connect("sqlite::memory:", 1).await.unwrap());
    migrate_all(db.clone()).await.unwrap();
    let settings = Settings {
        fast_password_hashing: true,
        ..Settings::default()
    };
    AppState { db, settings }
}

pub async fn test_app() -> (Router, AppState) {
    (urls::build_router(), test_state().await)
}

pub fn get(target: &str) -> RequestContext {
    RequestContext::new(Method::GET, target)
}

pub fn post(target: &str, form: &[(&str, &str)]) -> RequestContext {
    RequestContext::new(Method::POST, target).with_form(form)
}

pub fn session_cookie_name(state: &AppState) -> String {
    state.settings.session.cookie_name.clone()
}

/// Register `username` and log in, returning the session token.
pub async fn login_as(router: &Router, state: &AppState, username: &str, password: &str) -> String {
    let creds = [("username", username), ("password", password)];
    let resp = router
        .dispatch(post("/register/", &creds), state.clone())
        .await;
    assert_eq!(resp.location(), Some("/login/"));

    let resp = router.dispatch(post("/login/", &creds), state.clone()).await;
    assert_eq!(resp.location(), Some("/"));
    resp.cookie_value(&session_cookie_name(state))
        .expect("login sets a session cookie")
        .to_string()
}

/// Dispatch `ctx` carrying the session `token`.
pub async fn send_as(
    router: &Router,
    state: &AppState,
    token: &str,
    ctx: RequestContext,
) -> Response {
    let ctx = ctx.with_cookie(&session_cookie_name(state), token);
    router.dispatch(ctx, state.clone()).await
}
