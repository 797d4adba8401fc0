//! Tracing setup: structured JSON logs, optionally exported over OTLP.
//!
//! # Telemetry invariants
//!
//! - Log level is configurable via `REST_LOG_LEVEL` (default: `info`);
//!   `RUST_LOG` takes precedence when set.
//! - Span export is only enabled when `REST_OTEL_EXPORTER_OTLP_ENDPOINT` is set.

pub mod init;

pub use init::{init_telemetry, shutdown_telemetry};
