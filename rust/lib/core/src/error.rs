use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

// ── Error codes ─────────────────────────────────────────────────────
//
// Stable, machine-readable identifiers. Clients match on these;
// never on the human-readable message string.

/// Stable error code constants.
///
/// Clients should match on `code` from `{"code": "NOT_FOUND", "message": "..."}`.
/// Codes never change; messages may be reworded.
pub mod error_code {
    pub const INVALID_ARGUMENT: &str = "INVALID_ARGUMENT";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const ALREADY_EXISTS: &str = "ALREADY_EXISTS";
    pub const PERMISSION_DENIED: &str = "PERMISSION_DENIED";
    pub const INVALID_OPERATION: &str = "INVALID_OPERATION";
    pub const UNAUTHENTICATED: &str = "UNAUTHENTICATED";
    pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
    pub const INTERNAL: &str = "INTERNAL";
}

// ── ServiceError ────────────────────────────────────────────────────

/// Unified service error type used across all crates.
///
/// Every core operation returns one of these kinds; the request layer maps
/// each to an HTTP status. The JSON response always includes both:
///
/// ```json
/// {"code": "NOT_FOUND", "message": "tweet 42 not found"}
/// ```
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Malformed input; the caller's fault. Never retried automatically. HTTP 400.
    #[error("{0}")]
    InvalidArgument(String),

    /// Referenced entity or relationship is absent. HTTP 404.
    #[error("{0}")]
    NotFound(String),

    /// Duplicate relationship or unique field. HTTP 409.
    #[error("{0}")]
    AlreadyExists(String),

    /// Authenticated but not allowed to mutate the target. HTTP 403.
    #[error("{0}")]
    Forbidden(String),

    /// Semantically nonsensical request, e.g. following yourself. HTTP 422.
    #[error("{0}")]
    InvalidOperation(String),

    /// No trusted caller identity on the request. HTTP 401.
    #[error("{0}")]
    Unauthenticated(String),

    /// Storage backend failure. HTTP 500.
    #[error("{0}")]
    Storage(String),

    /// Unexpected internal error. HTTP 500.
    #[error("{0}")]
    Internal(String),
}

impl ServiceError {
    /// Stable, machine-readable error code.
    pub fn error_code(&self) -> &'static str {
        match self {
            ServiceError::InvalidArgument(_) => error_code::INVALID_ARGUMENT,
            ServiceError::NotFound(_) => error_code::NOT_FOUND,
            ServiceError::AlreadyExists(_) => error_code::ALREADY_EXISTS,
            ServiceError::Forbidden(_) => error_code::PERMISSION_DENIED,
            ServiceError::InvalidOperation(_) => error_code::INVALID_OPERATION,
            ServiceError::Unauthenticated(_) => error_code::UNAUTHENTICATED,
            ServiceError::Storage(_) => error_code::STORAGE_ERROR,
            ServiceError::Internal(_) => error_code::INTERNAL,
        }
    }

    /// HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::AlreadyExists(_) => StatusCode::CONFLICT,
            ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
            ServiceError::InvalidOperation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ServiceError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether this is a server-side failure rather than a caller error.
    pub fn is_internal(&self) -> bool {
        matches!(self, ServiceError::Storage(_) | ServiceError::Internal(_))
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = serde_json::json!({
            "code": self.error_code(),
            "message": self.to_string(),
        });
        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_code_mapping() {
        assert_eq!(ServiceError::InvalidArgument("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ServiceError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ServiceError::AlreadyExists("x".into()).status_code(), StatusCode::CONFLICT);
        assert_eq!(ServiceError::Forbidden("x".into()).status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            ServiceError::InvalidOperation("x".into()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(ServiceError::Unauthenticated("x".into()).status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ServiceError::Storage("x".into()).status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ServiceError::Internal("x".into()).status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn error_code_mapping() {
        assert_eq!(ServiceError::InvalidArgument("x".into()).error_code(), "INVALID_ARGUMENT");
        assert_eq!(ServiceError::NotFound("x".into()).error_code(), "NOT_FOUND");
        assert_eq!(ServiceError::AlreadyExists("x".into()).error_code(), "ALREADY_EXISTS");
        assert_eq!(ServiceError::Forbidden("x".into()).error_code(), "PERMISSION_DENIED");
        assert_eq!(ServiceError::InvalidOperation("x".into()).error_code(), "INVALID_OPERATION");
        assert_eq!(ServiceError::Unauthenticated("x".into()).error_code(), "UNAUTHENTICATED");
        assert_eq!(ServiceError::Storage("x".into()).error_code(), "STORAGE_ERROR");
        assert_eq!(ServiceError::Internal("x".into()).error_code(), "INTERNAL");
    }

    #[test]
    fn only_server_failures_are_internal() {
        assert!(ServiceError::Storage("x".into()).is_internal());
        assert!(ServiceError::Internal("x".into()).is_internal());
        assert!(!ServiceError::NotFound("x".into()).is_internal());
        assert!(!ServiceError::AlreadyExists("x".into()).is_internal());
    }

    #[test]
    fn json_response_format() {
        let err = ServiceError::NotFound("tweet 42 not found".into());
        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn error_display_is_just_message() {
        assert_eq!(ServiceError::NotFound("user 123".into()).to_string(), "user 123");
        assert_eq!(ServiceError::AlreadyExists("dup".into()).to_string(), "dup");
        assert_eq!(ServiceError::InvalidOperation("self".into()).to_string(), "self");
    }
}
