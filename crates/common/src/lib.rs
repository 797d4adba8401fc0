//! Common types, process arguments, and errors shared across the c4 REST crates.

pub mod args;
pub mod error;
pub mod node;
pub mod process;
pub mod protocol;
pub mod ssl;

pub use args::ServerArgs;
pub use error::ServiceError;
pub use process::ProcessState;
pub use ssl::SslOptions;
