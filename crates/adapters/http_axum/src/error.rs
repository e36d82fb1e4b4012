//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use castkeep_domain::error::CastKeepError;

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps [`CastKeepError`] to an HTTP response with appropriate status code.
pub struct ApiError(CastKeepError);

impl From<CastKeepError> for ApiError {
    fn from(err: CastKeepError) -> Self {
        Self(err)
    }
}

impl From<castkeep_domain::error::ValidationError> for ApiError {
    fn from(err: castkeep_domain::error::ValidationError) -> Self {
        Self(CastKeepError::Validation(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            CastKeepError::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            CastKeepError::Config(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            CastKeepError::Transport(err) => {
                tracing::error!(error = %err, "transport error surfaced through the api");
                (StatusCode::BAD_GATEWAY, err.to_string())
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
