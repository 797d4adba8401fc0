//! Request handlers and the table that registers them.
//!
//! Every handler receives the same [`HandlerContext`](super::context::HandlerContext)
//! as router state. New endpoints are added by appending a descriptor to
//! [`HANDLERS`].

pub mod api;
pub mod nodes;

use axum::response::IntoResponse;
use common::ServiceError;

use super::registry::HandlerDescriptor;
use super::response::ApiError;

/// All handlers served by the REST server, in registration order.
pub const HANDLERS: &[HandlerDescriptor] = &[
    api::API,
    api::API_LIST,
    nodes::NODES,
    nodes::NODE_LIST,
];

/// Catch-all 404 handler.
pub async fn not_found() -> impl IntoResponse {
    ApiError(ServiceError::NotFound(
        "the requested resource does not exist".into(),
    ))
}
