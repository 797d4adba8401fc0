//! OTEL SDK initialisation: tracing subscriber + optional OTLP exporter.

use anyhow::{Context, Result};
use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{runtime, Resource};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialise the global tracing subscriber and, if configured, the OTEL pipeline.
///
/// Configures:
/// - A JSON-formatted [`tracing_subscriber`] layer for structured log output.
/// - A [`tracing_opentelemetry`] layer exporting spans to `otlp_endpoint`.
///
/// The batch exporter runs on its own current-thread runtime so it keeps
/// working next to the server's single-threaded event loop.
///
/// # Errors
///
/// Returns an error if the OTLP exporter or the subscriber cannot be initialised.
pub fn init_telemetry(otlp_endpoint: Option<&str>, log_level: &str) -> Result<()> {
    let otel_layer = match otlp_endpoint.filter(|e| !e.trim().is_empty()) {
        Some(endpoint) => {
            let tracer = opentelemetry_otlp::new_pipeline()
                .tracing()
                .with_exporter(
                    opentelemetry_otlp::new_exporter()
                        .tonic()
                        .with_endpoint(endpoint),
                )
                .with_trace_config(
                    opentelemetry_sdk::trace::Config::default().with_resource(service_resource()),
                )
                .install_batch(runtime::TokioCurrentThread)
                .context("failed to install OTLP tracing pipeline")?;
            Some(tracing_opentelemetry::layer().with_tracer(tracer))
        }
        None => None,
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().json())
        .with(otel_layer)
        .try_init()
        .context("failed to initialise tracing subscriber")?;

    Ok(())
}

/// Flush pending spans before the process exits.
pub fn shutdown_telemetry() {
    opentelemetry::global::shutdown_tracer_provider();
}

fn service_resource() -> Resource {
    Resource::new(vec![
        KeyValue::new(
            opentelemetry_semantic_conventions::resource::SERVICE_NAME,
            "c4-rest-server",
        ),
        KeyValue::new(
            opentelemetry_semantic_conventions::resource::SERVICE_VERSION,
            env!("CARGO_PKG_VERSION"),
        ),
    ])
}
