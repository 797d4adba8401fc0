//! Response bodies served by the REST API.
//!
//! Every body is rendered as pretty-printed JSON with sorted keys by the
//! server; the types here only fix the field names.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Discovery endpoints
// ---------------------------------------------------------------------------

/// Response body for `GET /api`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiDescription {
    pub description: String,
}

/// A described list of names, used by `GET /api/` and `GET /api/nodes/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListResponse {
    pub description: String,
    pub list: Vec<String>,
}

impl ListResponse {
    pub fn new(description: impl Into<String>, list: Vec<String>) -> Self {
        Self {
            description: description.into(),
            list,
        }
    }
}

// ---------------------------------------------------------------------------
// Error response
// ---------------------------------------------------------------------------

/// Standard error response body returned on any non-2xx status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Short machine-readable error code (e.g. `"not_found"`).
    pub code: String,
    /// Human-readable description safe to expose to callers.
    pub message: String,
}

impl ErrorResponse {
    /// Construct an [`ErrorResponse`] from a code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}
