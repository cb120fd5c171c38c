//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use tally_domain::error::TallyError;

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Everything a handler can fail with.
#[derive(Debug)]
pub enum ApiError {
    /// The request body could not be decoded.
    InvalidBody(serde_json::Error),
    /// The application layer refused the request.
    Domain(TallyError),
}

impl From<TallyError> for ApiError {
    fn from(err: TallyError) -> Self {
        Self::Domain(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::InvalidBody(err) => {
                tracing::debug!(error = %err, "rejecting undecodable body");
                (StatusCode::BAD_REQUEST, "invalid request body".to_string())
            }
            Self::Domain(TallyError::Validation(err)) => (StatusCode::BAD_REQUEST, err.to_string()),
            Self::Domain(TallyError::NotFound(err)) => (StatusCode::NOT_FOUND, err.to_string()),
            Self::Domain(TallyError::Rejected(err)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
