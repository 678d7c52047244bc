//! Upload flow: stage a dataset and bind (or reuse) its session sandbox.

use axum::extract::{Multipart, Query, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::handlers::ApiFault;
use crate::sandbox::SandboxClient;
use crate::schemas::UploadResponse;
use crate::server::AppState;
use crate::session::DATASET_FILENAME;

#[derive(Debug, Deserialize)]
pub struct UploadParams {
    /// Caller-supplied session identifier; a fresh UUID when absent.
    pub session_id: Option<String>,
}

pub async fn upload(
    State(state): State<AppState>,
    Query(params): Query<UploadParams>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiFault> {
    let mut filename = DATASET_FILENAME.to_string();
    let mut content: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiFault::bad_request(format!("invalid multipart body: {e}")))?
    {
        if field.name() == Some("file") {
            if let Some(name) = field.file_name() {
                filename = name.to_string();
            }
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiFault::bad_request(format!("failed to read file field: {e}")))?;
            content = Some(bytes.to_vec());
        }
    }

    let Some(content) = content else {
        return Err(ApiFault::bad_request("missing 'file' field"));
    };

    let session_id = params
        .session_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let columns = parse_columns(&content);
    tracing::info!(%session_id, %filename, "dataset upload");

    let cfg = state.cfg.clone();
    let session = state
        .registry
        .create_or_get(&session_id, DATASET_FILENAME, &columns, || async move {
            let sandbox = SandboxClient::from_config(&cfg)?;
            sandbox.start().await?;
            Ok(sandbox)
        })
        .await
        .map_err(|e| ApiFault::server(e.to_string()))?;

    // Staged under the canonical name regardless of the original filename;
    // re-upload for a live session overwrites in place.
    session
        .sandbox
        .upload_file(DATASET_FILENAME, content)
        .await
        .map_err(|e| ApiFault::server(e.to_string()))?;

    Ok(Json(UploadResponse {
        session_id,
        filename,
        columns,
        message: "File uploaded and environment ready.".to_string(),
    }))
}

/// Best-effort column descriptor: the first line of the file decoded as
/// UTF-8. Decode failure or an empty file yields a sentinel instead of
/// failing the upload.
pub fn parse_columns(content: &[u8]) -> String {
    match std::str::from_utf8(content) {
        Ok(text) => text
            .lines()
            .next()
            .map(|line| line.trim_end().to_string())
            .filter(|line| !line.is_empty())
            .unwrap_or_else(|| "Unknown columns".to_string()),
        Err(_) => "Unknown columns".to_string(),
    }
}
