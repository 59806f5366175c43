//! Request-level error taxonomy and its HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::gemini::GeminiError;

/// Everything an endpoint can fail with. All variants are terminal for the
/// request; session state is only mutated after a successful service call,
/// so a failure never leaves partial totals behind.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Empty question, or a request body that did not parse.
    #[error("{0}")]
    InvalidInput(String),
    /// The pre-check estimate would push the session past capacity.
    #[error("Warning: This request might overflow the bathtub! Consider asking a shorter question.")]
    WouldOverflow,
    /// The completion service failed; the underlying message passes through.
    #[error("Error generating response: {0}")]
    Service(#[from] GeminiError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::InvalidInput(_) => {
                (StatusCode::BAD_REQUEST, json!({ "error": self.to_string() }))
            }
            ApiError::WouldOverflow => (
                StatusCode::BAD_REQUEST,
                json!({ "error": self.to_string(), "would_overflow": true }),
            ),
            ApiError::Service(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": self.to_string() }),
            ),
        };
        (status, Json(body)).into_response()
    }
}
