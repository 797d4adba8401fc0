//! Axum router construction from the route registry.

use axum::Router;
use tower_http::{compression::CompressionLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::info;

use super::{
    context::HandlerContext,
    handlers,
    middleware,
    registry::{self, HandlerDescriptor},
};

/// Build the application [`Router`] serving all built-in handlers.
pub fn build(ctx: HandlerContext) -> Router {
    build_with(handlers::HANDLERS, ctx)
}

/// Build a [`Router`] serving the valid routes among `handlers`.
///
/// Routes are installed in path order.
pub fn build_with(handlers: &[HandlerDescriptor], ctx: HandlerContext) -> Router {
    let routes = registry::discover_routes(handlers);
    info!(
        node = %ctx.node,
        routes = ?routes.iter().map(|(path, h)| (*path, h.name)).collect::<Vec<_>>(),
        "installing REST handlers"
    );

    let mut router = Router::new();
    for (path, handler) in &routes {
        router = router.route(path, (handler.install)());
    }

    router
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(middleware::REQUEST_TIMEOUT))
        .layer(CompressionLayer::new())
        .with_state(ctx)
}
