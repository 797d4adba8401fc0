//! Node listing and node detail endpoints.
//!
//! Both endpoints query the configuration backend through the worker pool.
//! A node that cannot be looked up is logged and left out of the result; only
//! a failure to list node names at all is reported to the client.

use std::collections::BTreeMap;

use axum::{
    extract::{Query, State},
    routing::{get, MethodRouter},
};
use common::{node::NodeInfo, protocol::ListResponse, ServiceError};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error};

use crate::backend::BackendError;
use crate::server::context::HandlerContext;
use crate::server::registry::HandlerDescriptor;
use crate::server::response::{ApiError, PrettyJson};

pub const NODES: HandlerDescriptor = HandlerDescriptor::new("Nodes", "/api/nodes", install_nodes);
pub const NODE_LIST: HandlerDescriptor =
    HandlerDescriptor::new("NodeList", "/api/nodes/", install_node_list);

/// Key carrying the type tag when `includeClassInfo=true`.
///
/// Tags are the bare wire type names: `NodeMap`, `NodeInfo`, `DeviceInfo`.
pub const CLASS_KEY: &str = "@class";

fn install_nodes() -> MethodRouter<HandlerContext> {
    get(node_map)
}

fn install_node_list() -> MethodRouter<HandlerContext> {
    get(node_list)
}

/// Query string of `GET /api/nodes`.
#[derive(Debug, Default, Deserialize)]
pub struct NodesQuery {
    #[serde(rename = "includeClassInfo", default)]
    pub include_class_info: Option<String>,
}

impl NodesQuery {
    /// `true` only for the (trimmed, case-insensitive) value `"true"`.
    pub fn wants_class_info(&self) -> bool {
        self.include_class_info
            .as_deref()
            .map_or(false, |v| v.trim().eq_ignore_ascii_case("true"))
    }
}

/// Node descriptions keyed by node name.
#[derive(Debug, Default)]
pub struct NodeMap {
    nodes: BTreeMap<String, NodeInfo>,
}

impl NodeMap {
    pub fn add(&mut self, node: NodeInfo) {
        self.nodes.insert(node.name.clone(), node);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Render as a JSON object, optionally tagging every object with its type.
    pub fn to_json(&self, include_class_info: bool) -> serde_json::Result<Value> {
        let mut value = serde_json::to_value(&self.nodes)?;
        if include_class_info {
            if let Value::Object(map) = &mut value {
                for node in map.values_mut() {
                    tag(node, "NodeInfo");
                }
                map.insert(CLASS_KEY.into(), Value::String("NodeMap".into()));
            }
        }
        Ok(value)
    }
}

fn tag(value: &mut Value, class: &str) {
    let Value::Object(map) = value else {
        return;
    };
    map.insert(CLASS_KEY.into(), Value::String(class.into()));
    if let Some(Value::Object(devices)) = map.get_mut("devices") {
        for device in devices.values_mut() {
            tag(device, "DeviceInfo");
        }
    }
}

fn backend_unavailable(e: BackendError) -> ApiError {
    error!(error = %e, "could not retrieve node names");
    ApiError(ServiceError::BackendUnavailable(
        "could not retrieve node names".into(),
    ))
}

/// `GET /api/nodes`: information on all nodes in the cluster.
pub async fn node_map(
    State(ctx): State<HandlerContext>,
    Query(query): Query<NodesQuery>,
) -> Result<PrettyJson<Value>, ApiError> {
    let names = ctx
        .query(|backend| backend.node_names())
        .await?
        .map_err(backend_unavailable)?;

    let mut nodes = NodeMap::default();
    for name in names {
        let lookup = name.clone();
        match ctx.query(move |backend| backend.node(&lookup, false, false)).await? {
            Ok(Some(info)) => nodes.add(info),
            Ok(None) => error!(node = %name, "could not retrieve node information"),
            Err(e) => error!(node = %name, error = %e, "could not retrieve node information"),
        }
    }
    debug!(serving_node = %ctx.node, nodes = nodes.len(), "node map assembled");

    let body = nodes.to_json(query.wants_class_info()).map_err(|e| {
        error!(error = %e, "failed to serialise node map");
        ApiError(ServiceError::Internal("failed to serialise node map".into()))
    })?;
    Ok(PrettyJson(body))
}

/// `GET /api/nodes/`: names of all nodes in the cluster.
pub async fn node_list(
    State(ctx): State<HandlerContext>,
) -> Result<PrettyJson<ListResponse>, ApiError> {
    let names = ctx
        .query(|backend| backend.node_names())
        .await?
        .map_err(backend_unavailable)?;
    Ok(PrettyJson(ListResponse::new("list of nodes", names)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockConfigurationBackend;
    use crate::server::pool::WorkerPool;
    use axum::{body::Body, http::Request, http::StatusCode, Router};
    use common::node::{DeviceInfo, Role};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn router(backend: MockConfigurationBackend) -> Router {
        let ctx = HandlerContext::new("node1", Arc::new(backend), WorkerPool::new(2));
        Router::new()
            .route("/api/nodes", install_nodes())
            .route("/api/nodes/", install_node_list())
            .with_state(ctx)
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn io_error() -> BackendError {
        BackendError::Io {
            path: "/var/lib/c4/cluster.json".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        }
    }

    #[test]
    fn class_info_flag_parsing() {
        let q = |v: Option<&str>| NodesQuery {
            include_class_info: v.map(str::to_owned),
        };
        assert!(q(Some("true")).wants_class_info());
        assert!(q(Some(" TRUE ")).wants_class_info());
        assert!(!q(Some("false")).wants_class_info());
        assert!(!q(Some("1")).wants_class_info());
        assert!(!q(None).wants_class_info());
    }

    #[test]
    fn class_info_tags_nodes_and_devices() {
        let mut node = NodeInfo::new("node1", "tcp://127.0.0.1:5000", Role::Active);
        node.add_device(DeviceInfo::new("cpu", "c4.devices.cpu.Cpu"));
        let mut map = NodeMap::default();
        map.add(node);

        let tagged = map.to_json(true).unwrap();
        assert_eq!(tagged[CLASS_KEY], "NodeMap");
        assert_eq!(tagged["node1"][CLASS_KEY], "NodeInfo");
        assert_eq!(tagged["node1"]["devices"]["cpu"][CLASS_KEY], "DeviceInfo");

        let plain = map.to_json(false).unwrap();
        assert!(plain.get(CLASS_KEY).is_none());
        assert!(plain["node1"].get(CLASS_KEY).is_none());
    }

    #[tokio::test]
    async fn failed_lookups_are_omitted() {
        let mut backend = MockConfigurationBackend::new();
        backend
            .expect_node_names()
            .returning(|| Ok(vec!["node1".into(), "node2".into(), "node3".into()]));
        backend
            .expect_node()
            .withf(|name, include_devices, _| name == "node1" && !*include_devices)
            .returning(|_, _, _| {
                Ok(Some(NodeInfo::new("node1", "tcp://127.0.0.1:5000", Role::Active)))
            });
        backend
            .expect_node()
            .withf(|name, _, _| name == "node2")
            .returning(|_, _, _| Ok(None));
        backend
            .expect_node()
            .withf(|name, _, _| name == "node3")
            .returning(|_, _, _| Err(io_error()));

        let (status, body) = get_json(router(backend), "/api/nodes").await;
        assert_eq!(status, StatusCode::OK);
        let obj = body.as_object().unwrap();
        assert_eq!(obj.len(), 1);
        assert_eq!(body["node1"]["role"], "ACTIVE");
    }

    #[tokio::test]
    async fn node_list_reports_backend_failure() {
        let mut backend = MockConfigurationBackend::new();
        backend.expect_node_names().returning(|| Err(io_error()));

        let (status, body) = get_json(router(backend), "/api/nodes/").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["code"], "service_unavailable");
    }

    #[tokio::test]
    async fn node_list_preserves_backend_order() {
        let mut backend = MockConfigurationBackend::new();
        backend
            .expect_node_names()
            .times(1)
            .returning(|| Ok(vec!["node2".into(), "node1".into()]));

        let (status, body) = get_json(router(backend), "/api/nodes/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["list"], serde_json::json!(["node2", "node1"]));
        assert_eq!(body["description"], "list of nodes");
    }

    #[tokio::test]
    async fn include_class_info_query_is_honoured() {
        let mut backend = MockConfigurationBackend::new();
        backend
            .expect_node_names()
            .returning(|| Ok(vec!["node1".into()]));
        backend.expect_node().returning(|_, _, _| {
            Ok(Some(NodeInfo::new("node1", "tcp://127.0.0.1:5000", Role::Thin)))
        });

        let (_, body) = get_json(router(backend), "/api/nodes?includeClassInfo=True").await;
        assert_eq!(body["node1"][CLASS_KEY], "NodeInfo");
    }
}
