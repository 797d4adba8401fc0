//! API discovery endpoints.

use axum::routing::{get, MethodRouter};
use common::protocol::{ApiDescription, ListResponse};

use crate::server::context::HandlerContext;
use crate::server::registry::HandlerDescriptor;
use crate::server::response::PrettyJson;

pub const API: HandlerDescriptor = HandlerDescriptor::new("API", "/api", install_api);
pub const API_LIST: HandlerDescriptor =
    HandlerDescriptor::new("APIList", "/api/", install_api_list);

/// Endpoint groups listed by `GET /api/`.
pub const ENDPOINTS: &[&str] = &["nodes"];

fn install_api() -> MethodRouter<HandlerContext> {
    get(describe)
}

fn install_api_list() -> MethodRouter<HandlerContext> {
    get(list_endpoints)
}

/// `GET /api`: describe the API.
pub async fn describe() -> PrettyJson<ApiDescription> {
    PrettyJson(ApiDescription {
        description: "information and management interface for C4 clusters".into(),
    })
}

/// `GET /api/`: list endpoint groups.
pub async fn list_endpoints() -> PrettyJson<ListResponse> {
    PrettyJson(ListResponse::new(
        "list of api endpoints",
        ENDPOINTS.iter().map(|e| (*e).to_owned()).collect(),
    ))
}
