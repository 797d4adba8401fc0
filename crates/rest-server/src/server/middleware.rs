//! Middleware settings shared by the router layers.
//!
//! The layers themselves (tracing, timeout, compression) are stacked in
//! [`super::router::build_with`]; this module only holds their parameters.

use std::time::Duration;

/// Longest time a request may take before the timeout layer answers `408`.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
