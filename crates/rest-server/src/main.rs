//! `rest-server`: the supervised REST server process.
//!
//! Spawned by the device manager with its arguments in `REST_*` environment
//! variables. Startup sequence:
//! 1. Load and validate [`Config`] from environment variables.
//! 2. Build a single-threaded runtime with the blocking pool sized to
//!    `worker_threads`.
//! 3. Initialise the telemetry pipeline.
//! 4. Build the route registry, resolve TLS, bind and serve until SIGINT/SIGTERM.
//!
//! Exits with status 0 after a termination signal and 1 on any failure.

use std::process::ExitCode;

use rest_server::{config::Config, server, telemetry};
use tracing::{error, info};

fn main() -> ExitCode {
    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let cfg = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            // Telemetry is not yet up; write to stderr directly.
            eprintln!("ERROR: configuration invalid: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    // -----------------------------------------------------------------------
    // 2. Runtime
    // -----------------------------------------------------------------------
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .max_blocking_threads(cfg.worker_threads)
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("ERROR: failed to build runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    runtime.block_on(serve(cfg))
}

async fn serve(cfg: Config) -> ExitCode {
    // -----------------------------------------------------------------------
    // 3. Telemetry
    // -----------------------------------------------------------------------
    if let Err(e) = telemetry::init_telemetry(cfg.otel_exporter_otlp_endpoint.as_deref(), &cfg.log_level) {
        eprintln!("ERROR: {e:#}");
        return ExitCode::FAILURE;
    }
    info!(
        version = env!("CARGO_PKG_VERSION"),
        node = %cfg.node,
        port = cfg.port,
        "c4 rest-server starting"
    );

    // -----------------------------------------------------------------------
    // 4. HTTP server
    // -----------------------------------------------------------------------
    let code = match server::process::run(cfg).await {
        Ok(()) => {
            info!("exiting");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = ?e, "forced exit");
            ExitCode::FAILURE
        }
    };

    telemetry::shutdown_telemetry();
    code
}
