//! Common error types shared across crates.

use thiserror::Error;

/// Top-level service error type.
///
/// Variants map to HTTP status codes returned to callers:
/// - [`ServiceError::NotFound`] → 404
/// - [`ServiceError::BackendUnavailable`] → 503
/// - [`ServiceError::Internal`] → 500
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The cluster configuration backend could not be queried.
    #[error("configuration backend unavailable: {0}")]
    BackendUnavailable(String),

    /// An unexpected internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Returns the HTTP status code that should be sent for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            ServiceError::NotFound(_) => 404,
            ServiceError::BackendUnavailable(_) => 503,
            ServiceError::Internal(_) => 500,
        }
    }

    /// Short machine-readable code used in error response bodies.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::NotFound(_) => "not_found",
            ServiceError::BackendUnavailable(_) => "service_unavailable",
            ServiceError::Internal(_) => "internal_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_codes() {
        assert_eq!(ServiceError::NotFound("x".into()).http_status(), 404);
        assert_eq!(
            ServiceError::BackendUnavailable("x".into()).http_status(),
            503
        );
        assert_eq!(ServiceError::Internal("x".into()).http_status(), 500);
    }

    #[test]
    fn display_includes_message() {
        let e = ServiceError::BackendUnavailable("cluster file unreadable".into());
        assert!(e.to_string().contains("cluster file unreadable"));
        assert_eq!(e.code(), "service_unavailable");
    }
}
