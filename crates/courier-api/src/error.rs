use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Everything a handler can fail with. Store errors collapse into
/// `Internal` at the handler boundary; the response body never carries
/// store detail.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("no message available")]
    NotFound,
    #[error("authentication required")]
    Unauthorized,
    #[error("unknown recipient")]
    UnknownRecipient,
    #[error("message body must not be empty")]
    EmptyBody,
    #[error("username already taken")]
    UsernameTaken,
    #[error("invalid username or password")]
    BadCredentials,
    #[error("{0}")]
    BadRequest(String),
    #[error("internal error")]
    Internal,
}

impl ApiError {
    /// Log the underlying failure and return the generic 500 variant.
    pub fn internal(err: impl std::fmt::Display) -> Self {
        error!("internal error: {}", err);
        ApiError::Internal
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::NotFound | ApiError::UnknownRecipient => StatusCode::NOT_FOUND,
            ApiError::Unauthorized | ApiError::BadCredentials => StatusCode::UNAUTHORIZED,
            ApiError::EmptyBody | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::UsernameTaken => StatusCode::CONFLICT,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
