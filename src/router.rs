/// Router module
///
/// This module provides the routing and HTTP plumbing for the planner:
///
/// - `RequestContext`: method, path, query, form body, cookies and the session user of one request
/// - `Response`: status, body, headers and any `Set-Cookie` values
/// - Path and parameter-based routing (`/update-recipe/:id`)
/// - Global and route-specific middleware (pre and post)
/// - Serving through axum, with every request funnelled into [`Router::dispatch`]
///
/// `dispatch` never touches a socket, so handlers can be driven directly in tests.
///
use crate::error::AppError;
use crate::flash::{FLASH_COOKIE, Flash};
use crate::models::{Session, User};
use crate::orm::Db;
use crate::settings::Settings;
use axum::Router as AxumRouter;
use axum::body::Body;
use axum::http::header;
pub use axum::http::Method;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Db>,
    pub settings: Settings,
}

/// Represents the outcome of an HTTP handler: HTML/text body, status, headers and cookies.
#[derive(Debug)]
pub struct Response {
    pub status_code: u16,
    pub body: String,
    pub headers: HashMap<String, String>,
    /// Complete `Set-Cookie` header values, one per cookie.
    pub cookies: Vec<String>,
}

impl Response {
    /// Construct a new HTTP 200 response with HTML/text body.
    pub fn ok(body: impl Into<String>) -> Self {
        Response::status(200, body)
    }

    /// Construct a response with an arbitrary status and text body.
    pub fn status(status_code: u16, body: impl Into<String>) -> Self {
        Response {
            status_code,
            body: body.into(),
            headers: HashMap::new(),
            cookies: Vec::new(),
        }
    }

    /// Construct a new HTTP 404 "not found" response.
    pub fn not_found() -> Self {
        Response::status(404, "404 Not Found")
    }

    /// Construct a 302 redirect to `location`.
    pub fn redirect(location: &str) -> Self {
        let mut response = Response::status(302, "");
        response
            .headers
            .insert("Location".to_string(), location.to_string());
        response
    }

    pub fn with_cookie(mut self, cookie: String) -> Self {
        self.cookies.push(cookie);
        self
    }

    pub fn location(&self) -> Option<&str> {
        self.headers.get("Location").map(String::as_str)
    }

    /// Value of the cookie `name` as set by this response, if any.
    pub fn cookie_value(&self, name: &str) -> Option<&str> {
        let prefix = format!("{}=", name);
        self.cookies.iter().find_map(|c| {
            c.strip_prefix(&prefix)
                .map(|rest| rest.split(';').next().unwrap_or_default())
        })
    }
}

/// Holds everything known about the current HTTP request.
/// Middleware and handlers can modify/read this context.
#[derive(Clone, Debug)]
pub struct RequestContext {
    pub method: Method,
    pub path: String,
    pub params: HashMap<String, String>,
    pub query: HashMap<String, String>,
    pub form: HashMap<String, String>,
    pub cookies: HashMap<String, String>,
    /// Session user, resolved from the session cookie by `dispatch`.
    pub user: Option<User>,
    /// Pending flash notice, read from the flash cookie by `dispatch`.
    pub flash: Option<Flash>,
    pub start_time: Option<Instant>,
}

impl RequestContext {
    /// Build a context for `target`, which may carry a query string (`/?search=mon`).
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, parse_urlencoded(query).unwrap_or_default()),
            None => (target, HashMap::new()),
        };
        RequestContext {
            method,
            path: path.to_string(),
            params: HashMap::new(),
            query,
            form: HashMap::new(),
            cookies: HashMap::new(),
            user: None,
            flash: None,
            start_time: None,
        }
    }

    /// Build a context from the raw pieces of an HTTP request.
    pub fn from_parts(
        method: Method,
        target: &str,
        cookie_header: Option<&str>,
        content_type: Option<&str>,
        body: &[u8],
    ) -> Result<Self, AppError> {
        let mut ctx = RequestContext::new(method, target);
        if let Some(raw) = cookie_header {
            ctx.cookies = parse_cookies(raw);
        }
        let is_form = content_type
            .map(|ct| ct.starts_with("application/x-www-form-urlencoded"))
            .unwrap_or(true);
        if is_form && !body.is_empty() {
            let raw = std::str::from_utf8(body)
                .map_err(|_| AppError::BadRequest("request body is not UTF-8".to_string()))?;
            ctx.form = parse_urlencoded(raw)?;
        }
        Ok(ctx)
    }

    pub fn with_form(mut self, pairs: &[(&str, &str)]) -> Self {
        for (k, v) in pairs {
            self.form.insert(k.to_string(), v.to_string());
        }
        self
    }

    pub fn with_cookie(mut self, name: &str, value: &str) -> Self {
        self.cookies.insert(name.to_string(), value.to_string());
        self
    }

    pub fn is_post(&self) -> bool {
        self.method == Method::POST
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn form_value(&self, key: &str) -> Option<&str> {
        self.form.get(key).map(String::as_str)
    }

    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }
}

/// Boxed future returned by every route handler.
pub type HandlerFuture = Pin<Box<dyn Future<Output = Response> + Send>>;

/// Type alias for async handler functions for HTTP routes.
pub type Handler = Arc<dyn Fn(RequestContext, AppState) -> HandlerFuture + Send + Sync>;

/// Type alias for synchronous, pre-processing middleware executed before the handler.
/// If a middleware returns Some(Response), request handling stops and this response is sent.
pub type Middleware = Arc<dyn Fn(&mut RequestContext) -> Option<Response> + Send + Sync>;

/// Type alias for post-processing middleware executed after the handler.
/// Post-middleware can inspect/modify the response before it is sent.
pub type PostMiddleware = Arc<dyn Fn(&RequestContext, Response) -> Response + Send + Sync>;

/// Wrap an async fn taking `(RequestContext, AppState)` into a [`Handler`].
pub fn handler<F, Fut>(f: F) -> Handler
where
    F: Fn(RequestContext, AppState) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    Arc::new(
        move |ctx: RequestContext, state: AppState| -> HandlerFuture { Box::pin(f(ctx, state)) },
    )
}

/// Represents a registered HTTP route and its associated handler + middleware.
#[derive(Clone)]
pub struct Route {
    pub path_pattern: String,
    pub handler: Handler,
    pub middlewares: Vec<Middleware>,
}

/// The application router.
/// Manages all HTTP routes and global middleware.
#[derive(Clone, Default)]
pub struct Router {
    pub routes: Vec<Route>,
    pub middlewares: Vec<Middleware>,
    pub post_middlewares: Vec<PostMiddleware>,
    pub app_state: Option<AppState>,
}

/// Maps status codes to HTTP status text.
pub fn status_text(code: u16) -> &'static str {
    match code {
        200 => "OK",
        302 => "Found",
        400 => "Bad Request",
        404 => "Not Found",
        409 => "Conflict",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}

/// Pre-middleware stamping the request start time.
pub fn request_timer() -> Middleware {
    Arc::new(|ctx| {
        ctx.start_time = Some(Instant::now());
        None
    })
}

/// Post-middleware writing one access log line per request.
pub fn access_log() -> PostMiddleware {
    Arc::new(|ctx, resp| {
        let elapsed_ms = ctx
            .start_time
            .map(|t| t.elapsed().as_secs_f64() * 1000.0)
            .unwrap_or_default();
        log::info!(
            "{} {} -> {} {} ({:.1} ms)",
            ctx.method,
            ctx.path,
            resp.status_code,
            status_text(resp.status_code),
            elapsed_ms
        );
        resp
    })
}

impl Router {
    /// Create a new, empty application router.
    pub fn new() -> Self {
        Router::default()
    }

    /// Register an HTTP route with path pattern, handler, and any route-specific middleware.
    pub fn add_route(&mut self, path_pattern: &str, handler: Handler, middlewares: Vec<Middleware>) {
        self.routes.push(Route {
            path_pattern: path_pattern.to_string(),
            handler,
            middlewares,
        });
    }

    /// Add a global pre-middleware to be run before all HTTP handlers.
    pub fn add_middleware(&mut self, middleware: Middleware) {
        self.middlewares.push(middleware);
    }

    /// Add a post-middleware to be run after each HTTP handler.
    pub fn add_post_middleware(&mut self, middleware: PostMiddleware) {
        self.post_middlewares.push(middleware);
    }

    pub fn set_app_state(&mut self, state: AppState) {
        self.app_state = Some(state);
    }

    /// Run one request through session loading, middleware, the matched handler
    /// and post-middleware.
    pub async fn dispatch(&self, mut ctx: RequestContext, state: AppState) -> Response {
        let token = ctx
            .cookie(&state.settings.session.cookie_name)
            .map(str::to_string);
        if let Some(token) = token {
            match Session::user_for_token(&state.db, &token).await {
                Ok(user) => ctx.user = user,
                Err(e) => log::error!("Session lookup failed: {}", e),
            }
        }
        ctx.flash = ctx.cookie(FLASH_COOKIE).and_then(Flash::decode);

        let mut response = self.run_chain(&mut ctx, state).await;
        for post_middleware in &self.post_middlewares {
            response = (post_middleware)(&ctx, response);
        }
        response
    }

    async fn run_chain(&self, ctx: &mut RequestContext, state: AppState) -> Response {
        for middleware in &self.middlewares {
            if let Some(response) = (middleware)(ctx) {
                return response;
            }
        }

        for route in &self.routes {
            if let Some(params) = match_path(&route.path_pattern, &ctx.path) {
                ctx.params = params;
                for middleware in &route.middlewares {
                    if let Some(response) = (middleware)(ctx) {
                        return response;
                    }
                }
                return (route.handler)(ctx.clone(), state).await;
            }
        }

        Response::not_found()
    }

    /// Bind the configured address and serve HTTP until the process stops.
    pub async fn run(self, settings: Settings) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let state = self
            .app_state
            .clone()
            .ok_or("App state not set in Router")?;
        let addr = settings.bind_addr();
        let max_body_bytes = settings.max_body_bytes;
        let router = Arc::new(self);

        let app = AxumRouter::new().fallback(move |req: axum::extract::Request| {
            let router = router.clone();
            let state = state.clone();
            async move { serve_request(router, state, req, max_body_bytes).await }
        });

        let listener = TcpListener::bind(&addr).await?;
        log::info!("HTTP Server running on http://{}", addr);
        axum::serve(listener, app).await?;
        Ok(())
    }
}

async fn serve_request(
    router: Arc<Router>,
    state: AppState,
    req: axum::extract::Request,
    max_body_bytes: usize,
) -> axum::response::Response {
    let (parts, body) = req.into_parts();
    let target = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| parts.uri.path().to_string());
    let header_str = |name: header::HeaderName| {
        parts
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let cookie_header = header_str(header::COOKIE);
    let content_type = header_str(header::CONTENT_TYPE);

    let bytes = match axum::body::to_bytes(body, max_body_bytes).await {
        Ok(b) => b,
        Err(e) => {
            return into_http_response(
                AppError::BadRequest(format!("unreadable body: {}", e)).into(),
            );
        }
    };

    let response = match RequestContext::from_parts(
        parts.method,
        &target,
        cookie_header.as_deref(),
        content_type.as_deref(),
        &bytes,
    ) {
        Ok(ctx) => router.dispatch(ctx, state).await,
        Err(e) => e.into(),
    };
    into_http_response(response)
}

fn into_http_response(response: Response) -> axum::response::Response {
    let mut builder = axum::http::Response::builder().status(response.status_code);
    for (key, value) in &response.headers {
        builder = builder.header(key.as_str(), value.as_str());
    }
    for cookie in &response.cookies {
        builder = builder.header(header::SET_COOKIE, cookie.as_str());
    }
    builder.body(Body::from(response.body)).unwrap_or_else(|e| {
        log::error!("Failed to build HTTP response: {}", e);
        let mut fallback = axum::http::Response::new(Body::from("500 Internal Server Error"));
        *fallback.status_mut() = axum::http::StatusCode::INTERNAL_SERVER_ERROR;
        fallback
    })
}

#[macro_export]
macro_rules! route {
    ($router:expr, $( $path:expr => { $handler:expr $(, $middleware:expr )* } ),* $(,)?) => {
        $(
            $router.add_route(
                $path,
                $crate::router::handler($handler),
                vec![$($middleware),*]
            );
        )*
    };
}

/// Matches a path pattern (e.g. `/foo/:id`) against a real path,
/// extracting parameters into a HashMap if matched, or None if not.
pub fn match_path(pattern: &str, path: &str) -> Option<HashMap<String, String>> {
    let pattern_parts: Vec<&str> = pattern.trim_matches('/').split('/').collect();
    let path_parts: Vec<&str> = path.trim_matches('/').split('/').collect();

    if pattern_parts.len() != path_parts.len() {
        return None;
    }

    let mut params = HashMap::new();

    for (p, a) in pattern_parts.iter().zip(path_parts.iter()) {
        if let Some(name) = p.strip_prefix(':') {
            if a.is_empty() {
                return None;
            }
            params.insert(name.to_string(), a.to_string());
        } else if p != a {
            return None;
        }
    }

    Some(params)
}

/// Decode an `application/x-www-form-urlencoded` string. Repeated keys keep the last value.
pub fn parse_urlencoded(raw: &str) -> Result<HashMap<String, String>, AppError> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(raw)
        .map_err(|e| AppError::BadRequest(format!("malformed form data: {}", e)))?;
    Ok(pairs.into_iter().collect())
}

/// Parse a `Cookie` request header into name/value pairs.
pub fn parse_cookies(header: &str) -> HashMap<String, String> {
    header
        .split(';')
        .filter_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_string(), value.trim().trim_matches('"').to_string()))
        })
        .collect()
}

/// Build a `Set-Cookie` value scoped to the whole site.
/// `max_age` of `Some(0)` expires the cookie immediately.
pub fn build_cookie(name: &str, value: &str, max_age: Option<i64>, secure: bool) -> String {
    let mut cookie = format!("{}={}; Path=/; HttpOnly; SameSite=Lax", name, value);
    if let Some(age) = max_age {
        cookie.push_str(&format!("; Max-Age={}", age));
    }
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}
