use crate::cors::cors_layer;
use crate::crash::request_scope_middleware;
use crate::error::AppError;
use crate::middleware_impls::{
    origin_policy_middleware, request_context_middleware, request_id_middleware,
};
use axum::extract::{DefaultBodyLimit, Request};
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use std::any::Any;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

use super::health;
use super::table::RouteTable;
use super::AppState;

/// Fallback for paths no handler group claims
async fn route_not_found(req: Request) -> AppError {
    AppError::RouteNotFound(req.uri().path().to_string())
}

/// Turn a handler panic into a structured 500 response
fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    AppError::Internal(format!("Handler panicked: {}", detail)).into_response()
}

/// Create application router.
///
/// Layers are listed innermost first, so requests pass through them bottom
/// to top: request scope, panic catcher, tracing, request id, origin tagging,
/// origin policy, CORS headers and preflight, body limit, then routes.
pub fn create_router(state: Arc<AppState>, table: RouteTable, body_limit_bytes: usize) -> axum::Router {
    let policy = state.policy.clone();

    axum::Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health_check))
        .merge(table.into_router())
        .fallback(route_not_found)
        .layer(DefaultBodyLimit::max(body_limit_bytes))
        .layer(cors_layer(policy.clone()))
        .layer(middleware::from_fn_with_state(policy, origin_policy_middleware))
        .layer(middleware::from_fn(request_context_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(middleware::from_fn(request_scope_middleware))
        .with_state(state)
}
