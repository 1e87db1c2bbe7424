//! Axum router configuration with middleware.
//!
//! All routes are under `/api/v1/`.
//! Middleware: CORS, tracing.

use axum::Router;
use axum::routing::{delete, get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::ApiState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Conversations
        .route(
            "/conversations",
            get(handlers::conversation::list_conversations).post(handlers::conversation::create_group),
        )
        .route("/conversations/start", post(handlers::conversation::start_chat))
        .route("/conversations/group", post(handlers::conversation::create_group))
        .route("/conversations/{id}", get(handlers::conversation::get_conversation))
        .route(
            "/conversations/{id}/messages",
            get(handlers::conversation::list_messages),
        )
        .route(
            "/conversations/{id}/events",
            get(handlers::events::stream_events),
        )
        // Messages
        .route("/messages", post(handlers::message::send_message))
        .route("/messages/turn", post(handlers::message::take_turn))
        .route("/messages/{id}", delete(handlers::message::delete_message))
        // Personas
        .route("/personas", get(handlers::persona::list_personas))
        .route("/health", get(health_check));

    Router::new()
        .nest("/api/v1", api_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /api/v1/health - Simple health check endpoint (no auth required).
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
