//! HTTP-boundary error mapping.

use axum::{http::StatusCode, response::IntoResponse, response::Response, Json};
use gophkeeper_core::GophkeeperError;
use serde::Serialize;

pub type ApiResult<T> = Result<T, ApiError>;

/// Wraps either a [`GophkeeperError`] or a pure HTTP-boundary rejection
/// (malformed request body) for the boundary. Inner detail is logged, never
/// echoed into the response body beyond the standard status text.
pub enum ApiError {
    Domain(GophkeeperError),
    BadRequest(&'static str),
}

impl From<GophkeeperError> for ApiError {
    fn from(err: GophkeeperError) -> Self {
        Self::Domain(err)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = match &self {
            ApiError::Domain(GophkeeperError::BadCredential) => {
                (StatusCode::UNAUTHORIZED, "bad_credential")
            }
            ApiError::Domain(GophkeeperError::IdentityDuplicate) => {
                (StatusCode::CONFLICT, "identity_duplicate")
            }
            ApiError::Domain(GophkeeperError::ResourceNotFound) => {
                (StatusCode::NOT_FOUND, "resource_not_found")
            }
            ApiError::Domain(GophkeeperError::IncompatibleAPI) => {
                (StatusCode::BAD_REQUEST, "incompatible_api")
            }
            ApiError::Domain(GophkeeperError::Internal(detail)) => {
                tracing::error!(detail, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal")
            }
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
        };

        let body = ErrorBody {
            error: kind,
            message: status
                .canonical_reason()
                .unwrap_or("error")
                .to_string(),
        };
        (status, Json(body)).into_response()
    }
}
