use crate::auth::{LOGIN_URL, login_required};
use crate::flash::consume_flash;
use crate::route;
use crate::router::{AppState, Router, access_log, request_timer};
use crate::views;

/// The full route table with its middleware.
pub fn build_router() -> Router {
    let mut router = Router::new();
    router.add_middleware(request_timer());
    router.add_post_middleware(consume_flash());
    router.add_post_middleware(access_log());

    route!(router,
        "/" => { views::recipes, login_required(LOGIN_URL) },
        "/update-recipe/:id" => { views::update_recipe, login_required(LOGIN_URL) },
        "/delete-recipe/:id" => { views::delete_recipe, login_required(LOGIN_URL) },
        "/pdf" => { views::pdf, login_required(LOGIN_URL) },
        "/login" => { views::login_page },
        "/register" => { views::register_page },
        "/logout" => { views::logout },
    );

    router
}

/// [`build_router`] with `state` attached, ready to `run`.
pub fn app(state: AppState) -> Router {
    let mut router = build_router();
    router.set_app_state(state);
    router
}
