//! `rest-device`: drives the REST server device from line commands on stdin.
//!
//! Startup sequence:
//! 1. Load and validate [`Config`](device_manager::config::Config) from `DEVICE_*` variables.
//! 2. Initialise structured JSON logging on stderr.
//! 3. Load the device properties and run the command loop.

use std::io;
use std::process::ExitCode;

use anyhow::Result;
use device_manager::config::Config;
use device_manager::process::ServerCommand;
use device_manager::properties::DeviceProperties;
use device_manager::{driver, telemetry, RestServerDevice};
use tracing::{error, info};

fn main() -> ExitCode {
    let cfg = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("ERROR: rest-device configuration invalid: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = telemetry::init(&cfg.log_level) {
        eprintln!("ERROR: {e:#}");
        return ExitCode::FAILURE;
    }

    match run(&cfg) {
        Ok(()) => {
            info!("exiting");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = format!("{e:#}"), "rest-device failed");
            ExitCode::FAILURE
        }
    }
}

fn run(cfg: &Config) -> Result<()> {
    let properties = match &cfg.properties_file {
        Some(path) => DeviceProperties::load(path)?,
        None => DeviceProperties::default(),
    };
    info!(
        device = %cfg.name,
        node = %cfg.node,
        server = %cfg.server_binary.display(),
        "rest-device starting"
    );

    let mut device = RestServerDevice::new(
        cfg.name.as_str(),
        cfg.node.as_str(),
        properties,
        ServerCommand::new(&cfg.server_binary),
    )
    .with_stop_timeout(cfg.stop_timeout());

    driver::run(&mut device, io::stdin().lock(), io::stdout().lock())
}
