//! c4 REST server: a read-only cluster API run as a supervised child process.
//!
//! The binary in `main.rs` wires these modules together; they are exposed as
//! a library so the pieces can be exercised on their own.

pub mod backend;
pub mod config;
pub mod server;
pub mod telemetry;
