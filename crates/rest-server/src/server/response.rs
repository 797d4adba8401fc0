//! JSON response rendering shared by all handlers.
//!
//! Bodies are pretty-printed with a four-space indent and object keys sorted,
//! so responses are stable and readable from `curl`.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use common::{protocol::ErrorResponse, ServiceError};
use serde::Serialize;
use serde_json::{ser::PrettyFormatter, Map, Value};
use tracing::error;

use super::pool::PoolError;

/// `Content-Type` of every JSON body.
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=UTF-8";

/// Serialize `value` as sorted, four-space indented JSON.
pub fn to_pretty_json<T: Serialize>(value: &T) -> serde_json::Result<Vec<u8>> {
    let value = sort_keys(serde_json::to_value(value)?);
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut ser)?;
    Ok(buf)
}

/// Rebuild every object with its keys in lexicographic order.
fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let sorted: Map<String, Value> = entries
                .into_iter()
                .map(|(k, v)| (k, sort_keys(v)))
                .collect();
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

/// A `200 OK` pretty-printed JSON response.
#[derive(Debug, Clone)]
pub struct PrettyJson<T>(pub T);

impl<T: Serialize> IntoResponse for PrettyJson<T> {
    fn into_response(self) -> Response {
        match to_pretty_json(&self.0) {
            Ok(body) => (
                [(header::CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE))],
                body,
            )
                .into_response(),
            Err(e) => {
                error!(error = %e, "failed to serialise response body");
                ApiError(ServiceError::Internal("failed to serialise response".into()))
                    .into_response()
            }
        }
    }
}

/// Error returned from handlers, rendered as an [`ErrorResponse`] body.
#[derive(Debug)]
pub struct ApiError(pub ServiceError);

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        Self(e)
    }
}

impl From<PoolError> for ApiError {
    fn from(e: PoolError) -> Self {
        error!(error = %e, "worker pool failure");
        Self(ServiceError::Internal("request could not be processed".into()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorResponse::new(self.0.code(), self.0.to_string());
        let rendered = to_pretty_json(&body).unwrap_or_else(|_| body.message.into_bytes());
        (
            status,
            [(header::CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE))],
            rendered,
        )
            .into_response()
    }
}
