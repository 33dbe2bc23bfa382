//! Structured errors for the fedicomments HTTP front end.
//!
//! Details are logged; callers are only told to retry.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use fedicomments_core::Error;
use serde_json::json;

/// Errors surfaced by HTTP handlers.
#[derive(Debug, thiserror::Error)]
pub enum WebError {
    /// Resolving or assembling the thread failed.
    #[error(transparent)]
    Aggregation(#[from] Error),
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let WebError::Aggregation(err) = &self;
        tracing::error!(error = %err, "could not assemble comments");

        (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": "try again later" }))).into_response()
    }
}
