//! Device manager for the c4 REST server.
//!
//! The node agent drives [`RestServerDevice`] through the [`DeviceManager`]
//! lifecycle: local start / stop messages and status polls. The device owns at
//! most one REST server OS process and never reports failures as errors; they
//! are logged and visible only through the device state and `isAlive`.

pub mod adapter;
pub mod config;
pub mod driver;
pub mod lifecycle;
pub mod monitor;
pub mod process;
pub mod properties;
pub mod status;
pub mod telemetry;

pub use adapter::RestServerDevice;
pub use lifecycle::{DeviceManager, LifecycleMessage, LifecycleReply};
pub use status::{DeviceState, RestServerStatus};
