//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use nexushub_domain::error::{NexusError, ValidationError};

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps [`NexusError`] to an HTTP response with appropriate status code.
#[derive(Debug)]
pub struct ApiError(NexusError);

impl From<NexusError> for ApiError {
    fn from(err: NexusError) -> Self {
        Self(err)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            NexusError::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            NexusError::NotFound(err) => (StatusCode::NOT_FOUND, err.to_string()),
            NexusError::Storage(err) => {
                tracing::error!(error = %err, "storage error");
                (StatusCode::BAD_GATEWAY, "store unavailable".to_string())
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
