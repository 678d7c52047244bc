//! Axum router and shared application state.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue};
use axum::response::Json;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use crate::agent::AgentClient;
use crate::config::Config;
use crate::handlers;
use crate::session::SessionRegistry;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Config,
    pub agent: Arc<AgentClient>,
    pub registry: Arc<SessionRegistry>,
}

impl AppState {
    pub fn new(cfg: Config, agent: AgentClient, registry: SessionRegistry) -> Self {
        Self {
            cfg,
            agent: Arc::new(agent),
            registry: Arc::new(registry),
        }
    }
}

/// Builds the full application router. `cors_origin` is a comma-separated
/// origin list, or `*` for any.
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    let cors = if cors_origin == "*" {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(vec![header::CONTENT_TYPE])
    } else {
        let origins: Vec<HeaderValue> = cors_origin
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(vec![header::CONTENT_TYPE])
    };

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route(
            "/api/upload",
            // Dataset size limits are a deployment concern, not enforced here.
            post(handlers::upload::upload).layer(DefaultBodyLimit::disable()),
        )
        .route("/api/chat", post(handlers::chat::chat))
        .route("/api/session/:session_id", delete(handlers::remove::remove))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

async fn root_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "online",
        "service": "DataLens Backend",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
