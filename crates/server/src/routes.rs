//! Route configuration.

use crate::access_log::access_log_middleware;
use crate::error::ApiError;
use crate::handlers;
use crate::state::AppState;
use axum::Router;
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use std::any::Any;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let log = state.log.clone();

    // Middleware layers are applied in reverse order (outermost first).
    // Order of execution: TraceLayer -> access log -> panic guard -> handler
    Router::new()
        // Crawler exclusion, intentionally outside the secret
        .route("/robots.txt", get(handlers::robots_txt))
        // Index and files under /{secret}/; everything else is 403
        .fallback(handlers::share_fallback)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(middleware::from_fn_with_state(log, access_log_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Turn a handler panic into a logged 500 for that request only.
fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };
    ApiError::Internal(format!("handler panicked: {detail}")).into_response()
}
