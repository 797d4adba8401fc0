//! Route registry: maps URL paths to the handlers that serve them.
//!
//! Handlers are declared as a static table of [`HandlerDescriptor`]s rather
//! than discovered at runtime. [`discover_routes`] validates that table:
//! handlers without a usable route are skipped, and for a path claimed twice
//! the first registrant wins. Both cases are logged and never abort startup.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use axum::routing::MethodRouter;
use tracing::error;

use super::context::HandlerContext;

/// Builds the method router serving a handler's route.
pub type Installer = fn() -> MethodRouter<HandlerContext>;

/// Static description of one request handler.
#[derive(Debug, Clone, Copy)]
pub struct HandlerDescriptor {
    /// Handler name used in log messages.
    pub name: &'static str,
    /// Declared route; `None` means the handler forgot to declare one.
    pub route: Option<&'static str>,
    pub install: Installer,
}

impl HandlerDescriptor {
    pub const fn new(name: &'static str, route: &'static str, install: Installer) -> Self {
        Self {
            name,
            route: Some(route),
            install,
        }
    }
}

/// Validated routes, ordered by path.
pub type RouteMap = BTreeMap<&'static str, HandlerDescriptor>;

/// Build the route map from `handlers`, in registration order.
pub fn discover_routes(handlers: &[HandlerDescriptor]) -> RouteMap {
    let mut routes = RouteMap::new();
    for handler in handlers {
        let Some(route) = handler.route else {
            error!(handler = handler.name, "REST handler is missing route");
            continue;
        };
        if !route.starts_with('/') {
            error!(
                handler = handler.name,
                route, "REST handler route must be an absolute path"
            );
            continue;
        }
        match routes.entry(route) {
            Entry::Occupied(existing) => {
                error!(
                    route,
                    handler = handler.name,
                    conflicts_with = existing.get().name,
                    "route for REST handler conflicts with an already registered handler"
                );
            }
            Entry::Vacant(slot) => {
                slot.insert(*handler);
            }
        }
    }
    routes
}
