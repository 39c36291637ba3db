//! API Router configuration

use super::handlers;
use super::state::AppState;
use crate::config::ServerConfig;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the main API router
pub fn create_router(state: AppState, server: &ServerConfig) -> Router {
    let api_routes = Router::new()
        // Health and status
        .route("/health", get(handlers::health_check))
        .route("/status", get(handlers::daemon_status))
        // Processes
        .route("/processes", get(handlers::list_processes))
        .route("/processes", post(handlers::create_process))
        .route("/processes/:id", get(handlers::get_process_status))
        .route("/processes/:id/slots", get(handlers::list_slots))
        .route("/processes/:id/slots/:slot/commit", post(handlers::commit_slot))
        .route("/processes/:id/slots/:slot/reject", post(handlers::reject_slot))
        .route("/processes/:id/expiry", post(handlers::evaluate_expiry))
        .route("/processes/:id/verify", get(handlers::verify_process))
        .route("/processes/:id/audit", get(handlers::get_audit_trail))
        // Signers
        .route("/signers/:id/tasks", get(handlers::signer_tasks))
        // Events
        .route("/events/stream", get(handlers::stream_events));

    let mut router = Router::new()
        .nest("/api/v1", api_routes)
        .layer(DefaultBodyLimit::max(server.max_body_size))
        .layer(TraceLayer::new_for_http());

    if server.enable_cors {
        router = router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    router.with_state(state)
}
