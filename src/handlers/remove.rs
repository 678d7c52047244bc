//! Session teardown: best-effort sandbox stop, unconditional removal.

use axum::extract::{Path, State};
use axum::Json;

use crate::server::AppState;

/// Removing an unknown session is a no-op; a failed remote stop is logged
/// inside the registry and never surfaces here.
pub async fn remove(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Json<serde_json::Value> {
    state.registry.remove(&session_id).await;
    Json(serde_json::json!({ "message": "Session removed." }))
}
