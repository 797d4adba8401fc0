//! The REST server process: registry, TLS decision, listener and event loop.
//!
//! # Lifecycle
//!
//! 1. [`ServerProcess::start`] builds the router from the route registry,
//!    resolves TLS and binds the port. Any failure here ends the process.
//! 2. [`RunningServer::serve_until`] runs the accept loop until the shutdown
//!    future completes (SIGINT / SIGTERM in production).
//!
//! The process never restarts itself; the device manager notices the exit on
//! its next liveness probe and spawns a replacement on the next `start`.

use std::future::Future;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{extract::Request, Router};
use common::ProcessState;
use hyper::body::Incoming;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto;
use rustls::ServerConfig;
use tokio::net::TcpListener;
use tokio::signal;
use tokio_rustls::TlsAcceptor;
use tower::Service;
use tracing::{debug, info, warn};

use crate::backend::{self, SharedBackend};
use crate::config::Config;

use super::{context::HandlerContext, pool::WorkerPool, router, tls};

fn log_transition(node: &str, from: ProcessState, to: ProcessState) {
    debug_assert!(from.can_transition_to(to), "illegal transition {from} -> {to}");
    info!(node, from = %from, to = %to, "REST server process state changed");
}

/// A configured server process that has not bound its port yet.
pub struct ServerProcess {
    cfg: Config,
    backend: SharedBackend,
}

impl ServerProcess {
    /// Create a process serving the backend selected by `cfg.backend_path`.
    pub fn new(cfg: Config) -> Self {
        let backend = backend::open(cfg.backend_path.as_deref());
        Self::with_backend(cfg, backend)
    }

    pub fn with_backend(cfg: Config, backend: SharedBackend) -> Self {
        Self { cfg, backend }
    }

    pub fn state(&self) -> ProcessState {
        ProcessState::NotStarted
    }

    /// Build the router, resolve TLS and bind the configured port.
    ///
    /// # Errors
    ///
    /// Returns an error if an enabled certificate or key cannot be loaded or
    /// the port cannot be bound.
    pub async fn start(self) -> Result<RunningServer> {
        let node = self.cfg.node.clone();
        let pool = WorkerPool::new(self.cfg.worker_threads);
        let ctx = HandlerContext::new(node.as_str(), self.backend, pool);
        let router = router::build(ctx);

        let tls_options = tls::resolve_tls(
            self.cfg.ssl_options.as_ref(),
            Path::new(&self.cfg.resource_root),
        );
        let tls_config = if tls_options.enabled {
            Some(tls::load_server_config(&tls_options)?)
        } else {
            None
        };

        let addr: SocketAddr = ([0, 0, 0, 0], self.cfg.port).into();
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind REST server to {addr}"))?;
        let local_addr = listener.local_addr()?;

        Ok(RunningServer {
            node,
            listener,
            router,
            tls_config,
            local_addr,
        })
    }
}

/// A server whose listener is bound and ready to serve.
pub struct RunningServer {
    node: String,
    listener: TcpListener,
    router: Router,
    tls_config: Option<Arc<ServerConfig>>,
    local_addr: SocketAddr,
}

impl RunningServer {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn is_tls(&self) -> bool {
        self.tls_config.is_some()
    }

    pub fn state(&self) -> ProcessState {
        ProcessState::Running
    }

    /// Serve requests until `shutdown` completes.
    ///
    /// # Errors
    ///
    /// Returns an error if the plaintext server fails.
    pub async fn serve_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        log_transition(&self.node, ProcessState::NotStarted, self.state());
        let result = match self.tls_config {
            Some(config) => {
                serve_tls(self.listener, self.router, config, shutdown).await;
                Ok(())
            }
            None => axum::serve(self.listener, self.router)
                .with_graceful_shutdown(shutdown)
                .await
                .context("REST server failed"),
        };
        log_transition(&self.node, ProcessState::Running, ProcessState::Terminated);
        result
    }
}

/// Accept loop for TLS connections.
async fn serve_tls<F>(listener: TcpListener, router: Router, config: Arc<ServerConfig>, shutdown: F)
where
    F: Future<Output = ()>,
{
    let acceptor = TlsAcceptor::from(config);
    tokio::pin!(shutdown);

    loop {
        let (stream, peer) = tokio::select! {
            _ = &mut shutdown => return,
            accepted = listener.accept() => match accepted {
                Ok(conn) => conn,
                Err(e) => {
                    warn!(error = %e, "accept error");
                    continue;
                }
            },
        };

        let acceptor = acceptor.clone();
        let router = router.clone();
        tokio::spawn(async move {
            let stream = match acceptor.accept(stream).await {
                Ok(stream) => stream,
                Err(e) => {
                    debug!(%peer, error = %e, "TLS handshake failed");
                    return;
                }
            };
            let service = hyper::service::service_fn(move |request: Request<Incoming>| {
                router.clone().call(request)
            });
            if let Err(e) = auto::Builder::new(TokioExecutor::new())
                .serve_connection_with_upgrades(TokioIo::new(stream), service)
                .await
            {
                debug!(%peer, error = %e, "connection closed with error");
            }
        });
    }
}

/// Completes on SIGINT or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    info!("termination signal received");
}

/// Run the server process until a termination signal arrives.
///
/// # Errors
///
/// Returns any startup or serve error; the caller logs it and exits non-zero.
pub async fn run(cfg: Config) -> Result<()> {
    let node = cfg.node.clone();
    let process = ServerProcess::new(cfg);
    let initial = process.state();
    match process.start().await {
        Ok(server) => {
            info!(addr = %server.local_addr(), tls = server.is_tls(), node = %node, "listening");
            server.serve_until(shutdown_signal()).await
        }
        Err(e) => {
            log_transition(&node, initial, ProcessState::Terminated);
            Err(e)
        }
    }
}
