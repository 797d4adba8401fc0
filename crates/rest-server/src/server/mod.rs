//! Axum HTTP(S) server, route registry, and the server process lifecycle.
//!
//! # Responsibilities
//! - Validate the static handler table into a route map ([`registry`]).
//! - Give every handler the same [`context::HandlerContext`].
//! - Decide whether TLS can be enabled ([`tls`]).
//! - Bind the listener and run the event loop until terminated ([`process`]).

pub mod context;
pub mod handlers;
pub mod middleware;
pub mod pool;
pub mod process;
pub mod registry;
pub mod response;
pub mod router;
pub mod tls;
