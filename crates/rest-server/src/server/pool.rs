//! Bounded pool for blocking work.
//!
//! Backend calls may block on file or network I/O. They run on tokio's blocking
//! threads, gated by a semaphore so at most `size` of them are in flight for
//! the whole server process. Request futures suspend on the result and the
//! event loop keeps serving other connections meanwhile.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Semaphore;

/// Default number of concurrent blocking calls.
pub const DEFAULT_POOL_SIZE: usize = 10;

/// Errors from submitting work to the pool.
#[derive(Debug, Error)]
pub enum PoolError {
    /// The pool was closed before a worker became available.
    #[error("worker pool is closed")]
    Closed,

    /// The blocking task panicked or was cancelled.
    #[error("blocking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Cloneable handle to the process-wide worker pool.
#[derive(Clone, Debug)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    size: usize,
}

impl WorkerPool {
    /// Create a pool running at most `size` blocking calls at once.
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            permits: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of workers currently idle.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Run `f` on a pool worker and wait for its result.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Join`] if `f` panics.
    pub async fn submit<F, T>(&self, f: F) -> Result<T, PoolError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| PoolError::Closed)?;

        let handle = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            f()
        });
        Ok(handle.await?)
    }

    /// Stop handing out workers; pending and future submissions fail.
    pub fn close(&self) {
        self.permits.close();
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new(DEFAULT_POOL_SIZE)
    }
}
