use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderName, Request},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::any::Any;
use std::sync::Arc;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::auth::IdentityVerifier;
use crate::config::AppConfig;
use crate::database::DatabaseManager;
use crate::error::ApiError;
use crate::handlers;
use crate::services::{TabService, UserService};

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Everything a handler may touch, built once in `main` and cloned per request
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub database: DatabaseManager,
    pub verifier: IdentityVerifier,
    pub users: UserService,
    pub tabs: TabService,
}

impl AppState {
    pub fn new(config: AppConfig, database: DatabaseManager, verifier: IdentityVerifier) -> Self {
        let pool = database.pool().clone();
        Self {
            config: Arc::new(config),
            database,
            verifier,
            users: UserService::new(pool.clone()),
            tabs: TabService::new(pool),
        }
    }
}

pub fn app(state: AppState) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);
    let body_limit = state.config.api.max_request_size_bytes;

    Router::new()
        // Public
        .route("/", get(handlers::public::home))
        .route("/healthz", get(handlers::public::healthz))
        // Bearer token required
        .route("/hook", post(handlers::protected::hook_post))
        .route("/archive", get(handlers::protected::archive_get))
        .method_not_allowed_fallback(method_not_allowed)
        .fallback(not_found)
        .with_state(state)
        // Global middleware
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
            let request_id = request
                .extensions()
                .get::<RequestId>()
                .and_then(|id| id.header_value().to_str().ok())
                .unwrap_or_default();
            tracing::info_span!(
                "request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = %request_id,
            )
        }))
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
}

async fn not_found() -> ApiError {
    ApiError::not_found("not found")
}

async fn method_not_allowed() -> ApiError {
    ApiError::method_not_allowed("method not allowed")
}

fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = detail, "handler panicked");

    ApiError::internal_server_error("internal server error").into_response()
}
