//! Initialization record shared by every request handler.

use std::sync::Arc;

use crate::backend::{ConfigurationBackend, MemoryBackend, SharedBackend};

use super::pool::{PoolError, WorkerPool};

/// State injected into every handler as Axum router state.
///
/// All fields are cheaply cloneable so Axum can clone the context per request.
#[derive(Clone)]
pub struct HandlerContext {
    /// Node the server process runs on.
    pub node: Arc<str>,
    /// Cluster configuration store.
    pub backend: SharedBackend,
    /// Pool for blocking backend calls.
    pub pool: WorkerPool,
}

impl HandlerContext {
    pub fn new(node: impl Into<Arc<str>>, backend: SharedBackend, pool: WorkerPool) -> Self {
        Self {
            node: node.into(),
            backend,
            pool,
        }
    }

    /// Run a backend query on the worker pool.
    ///
    /// # Errors
    ///
    /// Fails only if the pool is closed or the query panicked; the query's own
    /// result is passed through untouched.
    pub async fn query<F, T>(&self, f: F) -> Result<T, PoolError>
    where
        F: FnOnce(&dyn ConfigurationBackend) -> T + Send + 'static,
        T: Send + 'static,
    {
        let backend = self.backend.clone();
        self.pool.submit(move || f(backend.as_ref())).await
    }
}

impl Default for HandlerContext {
    /// An empty cluster on node `localhost`, suitable for tests.
    fn default() -> Self {
        Self::new(
            "localhost",
            Arc::new(MemoryBackend::default()),
            WorkerPool::default(),
        )
    }
}

impl std::fmt::Debug for HandlerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerContext")
            .field("node", &self.node)
            .field("pool", &self.pool)
            .finish_non_exhaustive()
    }
}
