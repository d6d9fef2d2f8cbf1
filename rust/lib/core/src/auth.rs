//! Caller identity for the request layer.
//!
//! Verifying credentials is not this crate's job. An upstream component
//! (gateway, session middleware) establishes who the caller is; the core only
//! consumes the resulting trusted identity through this trait. The concrete
//! implementation is injected at startup time.

use axum::http::HeaderMap;

use crate::ServiceError;

/// Maps an inbound request to a trusted caller id.
pub trait IdentityResolver: Send + Sync + 'static {
    /// Returns the caller's raw user id, or `ServiceError::Unauthenticated`.
    fn resolve(&self, headers: &HeaderMap) -> Result<String, ServiceError>;
}

/// Reads the caller id from a header set by a trusted upstream proxy.
pub struct TrustedHeader {
    header: String,
}

impl TrustedHeader {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into().to_ascii_lowercase(),
        }
    }
}

impl Default for TrustedHeader {
    fn default() -> Self {
        Self::new("x-user-id")
    }
}

impl IdentityResolver for TrustedHeader {
    fn resolve(&self, headers: &HeaderMap) -> Result<String, ServiceError> {
        headers
            .get(self.header.as_str())
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .ok_or_else(|| ServiceError::Unauthenticated(format!("missing {} header", self.header)))
    }
}
