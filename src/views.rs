//! Request handlers for every page of the planner.

use log::{error, info, warn};

use crate::auth::{self, LOGIN_URL, LoginOutcome};
use crate::error::AppError;
use crate::flash::Flash;
use crate::forms::{CredentialsForm, RecipeForm};
use crate::models::Recipe;
use crate::router::{AppState, RequestContext, Response};
use crate::template::{Context, TemplateValue, render_template, to_value};

const HOME_URL: &str = "/";
const PDF_URL: &str = "/pdf/";
const REGISTER_URL: &str = "/register/";

fn respond(result: Result<Response, AppError>) -> Response {
    result.unwrap_or_else(Response::from)
}

fn render(state: &AppState, template: &str, context: &Context) -> Response {
    render_template(&state.settings.template.dir, template, context)
}

/// Context shared by every page: the current user and any pending flash.
fn base_context(ctx: &RequestContext) -> Context {
    let mut context = Context::new();
    context.insert(
        "user".to_string(),
        ctx.user.as_ref().map(to_value).unwrap_or(TemplateValue::Null),
    );
    context.insert(
        "flash".to_string(),
        ctx.flash.as_ref().map(to_value).unwrap_or(TemplateValue::Null),
    );
    context
}

fn redirect_with(location: &str, flash: Flash) -> Response {
    Response::redirect(location).with_cookie(flash.to_cookie())
}

/// `/`: list recipes (optionally filtered by `search` on day) and create them.
pub async fn recipes(ctx: RequestContext, state: AppState) -> Response {
    respond(list_or_create(&ctx, &state, "recipe.html", HOME_URL).await)
}

/// `/pdf/`: the same listing rendered as a printable page.
pub async fn pdf(ctx: RequestContext, state: AppState) -> Response {
    respond(list_or_create(&ctx, &state, "pdf.html", PDF_URL).await)
}

async fn list_or_create(
    ctx: &RequestContext,
    state: &AppState,
    template: &str,
    back_to: &str,
) -> Result<Response, AppError> {
    if ctx.is_post() {
        let fields = match RecipeForm::from_request(ctx).clean() {
            Ok(fields) => fields,
            Err(AppError::Validation(msg)) => return Ok(redirect_with(back_to, Flash::error(msg))),
            Err(e) => return Err(e),
        };
        let owner = ctx.user.as_ref().map(|u| u.id);
        let recipe = Recipe::create(&state.db, owner, &fields).await?;
        info!("Created recipe {} ({})", recipe.id, recipe.name);
        return Ok(Response::redirect(back_to));
    }

    let search = ctx.query_value("search").unwrap_or_default();
    let recipes = Recipe::search(&state.db, Some(search)).await?;

    let mut context = base_context(ctx);
    context.insert("recipes".to_string(), to_value(&recipes));
    context.insert("search".to_string(), TemplateValue::from(search));
    Ok(render(state, template, &context))
}

fn recipe_id(ctx: &RequestContext) -> Result<i64, AppError> {
    ctx.params
        .get("id")
        .and_then(|id| id.parse().ok())
        .ok_or(AppError::NotFound("Recipe"))
}

/// `/update-recipe/:id/`: edit form on GET, overwrite all fields on POST.
pub async fn update_recipe(ctx: RequestContext, state: AppState) -> Response {
    respond(update_recipe_inner(&ctx, &state).await)
}

async fn update_recipe_inner(ctx: &RequestContext, state: &AppState) -> Result<Response, AppError> {
    let mut recipe = Recipe::get(&state.db, recipe_id(ctx)?).await?;

    if ctx.is_post() {
        let fields = match RecipeForm::from_request(ctx).clean() {
            Ok(fields) => fields,
            Err(AppError::Validation(msg)) => {
                let back = format!("/update-recipe/{}/", recipe.id);
                return Ok(redirect_with(&back, Flash::error(msg)));
            }
            Err(e) => return Err(e),
        };
        recipe.apply(fields);
        recipe.save(&state.db).await?;
        info!("Updated recipe {}", recipe.id);
        return Ok(Response::redirect(HOME_URL));
    }

    let mut context = base_context(ctx);
    context.insert("recipe".to_string(), to_value(&recipe));
    Ok(render(state, "update_recipe.html", &context))
}

/// `/delete-recipe/:id/`: remove the recipe and go home.
pub async fn delete_recipe(ctx: RequestContext, state: AppState) -> Response {
    respond(delete_recipe_inner(&ctx, &state).await)
}

async fn delete_recipe_inner(ctx: &RequestContext, state: &AppState) -> Result<Response, AppError> {
    let recipe = Recipe::get(&state.db, recipe_id(ctx)?).await?;
    let id = recipe.id;
    recipe.delete(&state.db).await?;
    info!("Deleted recipe {}", id);
    Ok(Response::redirect(HOME_URL))
}

/// `/login/`: login form on GET, credential check on POST.
///
/// Any unexpected failure lands on the registration page with a generic notice.
pub async fn login_page(ctx: RequestContext, state: AppState) -> Response {
    if !ctx.is_post() {
        return render(&state, "login.html", &base_context(&ctx));
    }
    match attempt_login(&ctx, &state).await {
        Ok(response) => response,
        Err(e) => {
            error!("Login failed unexpectedly: {}", e);
            redirect_with(REGISTER_URL, Flash::error("Something went wrong"))
        }
    }
}

async fn attempt_login(ctx: &RequestContext, state: &AppState) -> Result<Response, AppError> {
    let creds = CredentialsForm::from_request(ctx);
    match auth::authenticate(&state.db, &creds.username, &creds.password).await? {
        LoginOutcome::UnknownUser => {
            warn!("Login attempt for unknown user `{}`", creds.username);
            Ok(redirect_with(LOGIN_URL, Flash::error("Username not found")))
        }
        LoginOutcome::WrongPassword => {
            warn!("Wrong password for user `{}`", creds.username);
            Ok(redirect_with(LOGIN_URL, Flash::error("Wrong Password")))
        }
        LoginOutcome::Authenticated(mut user) => {
            let previous = ctx.cookie(&state.settings.session.cookie_name);
            let token = auth::login(&state.db, &state.settings, &mut user, previous).await?;
            Ok(Response::redirect(HOME_URL)
                .with_cookie(auth::session_cookie(&state.settings, &token)))
        }
    }
}

/// `/register/`: registration form on GET, account creation on POST.
pub async fn register_page(ctx: RequestContext, state: AppState) -> Response {
    if !ctx.is_post() {
        return render(&state, "register.html", &base_context(&ctx));
    }
    match attempt_register(&ctx, &state).await {
        Ok(response) => response,
        Err(e) => {
            error!("Registration failed unexpectedly: {}", e);
            redirect_with(REGISTER_URL, Flash::error("Something went wrong"))
        }
    }
}

async fn attempt_register(ctx: &RequestContext, state: &AppState) -> Result<Response, AppError> {
    let creds = CredentialsForm::from_request(ctx);
    if let Err(AppError::Validation(msg)) = creds.validate_new_account() {
        return Ok(redirect_with(REGISTER_URL, Flash::error(msg)));
    }
    match auth::register(&state.db, &state.settings, &creds.username, &creds.password).await {
        Ok(_) => Ok(redirect_with(LOGIN_URL, Flash::success("Account created"))),
        Err(AppError::Conflict(msg)) => {
            warn!("Registration refused for `{}`: {}", creds.username, msg);
            Ok(redirect_with(REGISTER_URL, Flash::error(msg)))
        }
        Err(e) => Err(e),
    }
}

/// `/logout/`: end the session, whatever state it is in.
pub async fn logout(ctx: RequestContext, state: AppState) -> Response {
    if let Some(token) = ctx.cookie(&state.settings.session.cookie_name) {
        if let Err(e) = auth::logout(&state.db, token).await {
            error!("Failed to close session: {}", e);
        }
    }
    Response::redirect(LOGIN_URL).with_cookie(auth::expired_session_cookie(&state.settings))
}
