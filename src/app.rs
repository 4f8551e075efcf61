use std::sync::Arc;

use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, ORIGIN},
        HeaderValue, Method,
    },
    middleware,
    routing::{get, patch, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::auth::{PasswordHasher, TokenError, TokenIssuer};
use crate::config::{AppConfig, SecurityConfig};
use crate::database::Store;
use crate::handlers::{protected, public};
use crate::middleware::{request_id::REQUEST_ID_HEADER, require_auth, MakeRequestUuid};

/// Shared handles passed to every handler through router state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub tokens: Arc<TokenIssuer>,
    pub passwords: PasswordHasher,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn Store>) -> Result<Self, TokenError> {
        let tokens = TokenIssuer::new(&config.security.jwt_secret, config.security.token_ttl())?;
        let passwords = PasswordHasher::new(config.security.bcrypt_cost);

        Ok(Self {
            store,
            tokens: Arc::new(tokens),
            passwords,
            config: Arc::new(config),
        })
    }
}

pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config.security);

    Router::new()
        // Public
        .merge(status_routes())
        .merge(auth_public_routes())
        // Protected API
        .merge(protected_routes(state.clone()))
        // Global middleware
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(REQUEST_ID_HEADER, MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::new(REQUEST_ID_HEADER))
                .layer(cors),
        )
        .with_state(state)
}

fn status_routes() -> Router<AppState> {
    Router::new()
        .route("/api", get(public::api_root))
        .route("/api/", get(public::api_root))
        .route("/health", get(public::health))
}

fn auth_public_routes() -> Router<AppState> {
    use public::auth;

    Router::new()
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/signup", post(auth::signup))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(user_routes())
        .merge(tasklist_routes())
        .merge(task_routes())
        .merge(goal_routes())
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}

fn user_routes() -> Router<AppState> {
    use protected::user;

    Router::new().route(
        "/api/user/:id",
        get(user::user_get)
            .patch(user::user_patch)
            .delete(user::user_delete),
    )
}

fn tasklist_routes() -> Router<AppState> {
    use protected::tasklist;

    Router::new()
        .route(
            "/api/tasklist",
            get(tasklist::lists_get).post(tasklist::list_create),
        )
        .route(
            "/api/tasklist/",
            get(tasklist::lists_get).post(tasklist::list_create),
        )
        .route(
            "/api/tasklist/:list_id",
            patch(tasklist::list_patch).delete(tasklist::list_delete),
        )
}

fn task_routes() -> Router<AppState> {
    use protected::task;

    Router::new()
        // POST takes the parent list id, PATCH/DELETE take the task id
        .route(
            "/api/task/:id",
            post(task::task_create)
                .patch(task::task_patch)
                .delete(task::task_delete),
        )
        .route("/api/task/:id/toggle", patch(task::task_toggle))
}

fn goal_routes() -> Router<AppState> {
    use protected::goal;

    Router::new()
        .route("/api/goal", get(goal::goals_get).post(goal::goal_create))
        .route("/api/goal/", get(goal::goals_get).post(goal::goal_create))
        .route(
            "/api/goal/:goal_id",
            put(goal::goal_put).delete(goal::goal_delete),
        )
        .route("/api/goal/:goal_id/toggle", patch(goal::goal_toggle))
        .route(
            "/api/goal/:goal_id/:subgoal_id/toggle",
            patch(goal::subgoal_toggle),
        )
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([ORIGIN, CONTENT_TYPE, ACCEPT, AUTHORIZATION])
}
