use axum::{
    routing::{get, post},
    Router,
};
use std::path::Path;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::CorsLayer,
    services::ServeDir,
    trace::{DefaultMakeSpan, TraceLayer},
};
use tracing::{info, warn};

use crate::handlers;
use crate::state::AppState;

/// Build the HTTP router. Paths not matched by an API route are served
/// from `static_dir` when given and present on disk.
pub fn build_router(state: AppState, static_dir: Option<&Path>) -> Router {
    let api_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/new-session", post(handlers::session::new_session_handler))
        .route(
            "/chat-history/{user_id}",
            get(handlers::session::chat_history_handler),
        )
        .route("/chat", post(handlers::chat::chat_handler))
        .with_state(state);

    let router = match static_dir {
        Some(dir) if dir.is_dir() => {
            info!("Serving static assets from {}", dir.display());
            api_routes.fallback_service(ServeDir::new(dir))
        }
        Some(dir) => {
            warn!("Static directory {} not found, front-end disabled", dir.display());
            api_routes
        }
        None => api_routes,
    };

    router
        // CORS
        .layer(CorsLayer::permissive())
        // Tracing
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(false)),
        )
        .layer(CatchPanicLayer::new())
}
