//! Request orchestration: upload and chat flows.

pub mod chat;
pub mod remove;
pub mod upload;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};

use crate::schemas::ErrorBody;

/// Request-level fault. Only infrastructural failures become one of these;
/// a failed analysis still produces a normal chat response.
#[derive(Debug)]
pub struct ApiFault {
    pub status: StatusCode,
    pub detail: String,
}

impl ApiFault {
    pub fn not_found(detail: impl Into<String>) -> Self {
        Self { status: StatusCode::NOT_FOUND, detail: detail.into() }
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self { status: StatusCode::BAD_REQUEST, detail: detail.into() }
    }

    pub fn server(detail: impl Into<String>) -> Self {
        Self { status: StatusCode::INTERNAL_SERVER_ERROR, detail: detail.into() }
    }
}

impl IntoResponse for ApiFault {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { detail: self.detail })).into_response()
    }
}
