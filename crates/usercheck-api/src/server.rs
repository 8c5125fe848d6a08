//! Usercheck HTTP server

use axum::{middleware, routing::get, Router};
use hyper_util::rt::{TokioExecutor, TokioIo};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tower::Service;
use tower_http::trace::{DefaultMakeSpan, TraceLayer};
use tracing::{debug, error, info, warn};
use usercheck_core::config::{DirectoryConfig, UserCheckConfig};
use usercheck_core::{Error, Result, API_PREFIX};
use usercheck_directory::DirectoryProvider;

use crate::handlers;
use crate::middleware::{correlation_id, CorrelationId};
use crate::response::ApiError;
use crate::tls::TlsAcceptor;

/// How long cancelled requests get to write their response before the
/// server task is aborted
const FORCE_CLOSE_GRACE: Duration = Duration::from_secs(5);

/// The directory provider, or the reason it could not be built
///
/// A misconfigured directory does not stop the server; every request
/// answers with a configuration failure instead.
#[derive(Clone)]
pub enum DirectoryHandle {
    Ready(Arc<DirectoryProvider>),
    Misconfigured(Arc<str>),
}

impl DirectoryHandle {
    pub fn from_config(config: &DirectoryConfig) -> Self {
        match DirectoryProvider::new(config.clone()) {
            Ok(provider) => DirectoryHandle::Ready(Arc::new(provider)),
            Err(e) => {
                error!("Directory provider unavailable: {}", e);
                DirectoryHandle::Misconfigured(e.to_string().into())
            }
        }
    }

    pub fn provider(&self) -> Result<&DirectoryProvider> {
        match self {
            DirectoryHandle::Ready(provider) => Ok(provider.as_ref()),
            DirectoryHandle::Misconfigured(reason) => {
                Err(Error::Configuration(reason.to_string()))
            }
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<UserCheckConfig>,
    pub directory: DirectoryHandle,
    /// Fired when shutdown gives up waiting on in-flight requests
    pub cancel: CancellationToken,
}

impl AppState {
    pub fn new(config: Arc<UserCheckConfig>, directory: DirectoryHandle) -> Self {
        Self {
            config,
            directory,
            cancel: CancellationToken::new(),
        }
    }

    /// Run a directory operation, giving up if shutdown cancels it.
    pub async fn with_provider<'a, F, Fut, T>(&'a self, op: F) -> Result<T>
    where
        F: FnOnce(&'a DirectoryProvider) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let provider = self.directory.provider()?;
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                warn!("Directory operation cancelled by shutdown");
                Err(Error::Cancelled)
            }
            result = op(provider) => result,
        }
    }

    pub fn failure(&self, error: Error, id: &CorrelationId) -> ApiError {
        if error.is_setup_failure() {
            error!(code = error.code(), "{}", error);
        } else {
            debug!(code = error.code(), "Request failed: {}", error);
        }
        ApiError::new(error, id, self.config.development)
    }
}

/// Usercheck Server
pub struct UserCheckServer {
    config: UserCheckConfig,
    directory: Option<DirectoryHandle>,
}

impl UserCheckServer {
    pub fn new(config: UserCheckConfig) -> Self {
        Self {
            config,
            directory: None,
        }
    }

    /// Serve a pre-built directory handle instead of dialing the configured server.
    pub fn with_directory(mut self, directory: DirectoryHandle) -> Self {
        self.directory = Some(directory);
        self
    }

    /// Serve until `shutdown` resolves, then drain.
    ///
    /// In-flight requests get `shutdown_timeout_secs` to finish. After that
    /// their directory work is cancelled and they answer 503.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        if self.config.tls.enabled {
            self.config.tls.validate()?;
        }

        let directory = self
            .directory
            .unwrap_or_else(|| DirectoryHandle::from_config(&self.config.directory));
        let config = Arc::new(self.config);
        let state = AppState::new(config.clone(), directory);
        let cancel = state.cancel.clone();

        let app = create_router(state);
        let addr = format!("{}:{}", config.server.bind_address, config.server.port);
        let listener = TcpListener::bind(&addr).await?;
        let stop_accepting = CancellationToken::new();

        let mut server: JoinHandle<Result<()>> = if config.tls.enabled {
            let tls_acceptor = TlsAcceptor::from_config(&config.tls)?;
            info!("🔒 Usercheck API listening on https://{}{}", addr, API_PREFIX);
            tokio::spawn(run_https(listener, tls_acceptor, app, stop_accepting.clone()))
        } else {
            info!("🚀 Usercheck API listening on http://{}{}", addr, API_PREFIX);
            tokio::spawn(run_http(listener, app, stop_accepting.clone()))
        };
        if config.development {
            info!("🛠️  Development mode: error details are returned to clients");
        }

        tokio::select! {
            result = &mut server => return flatten(result),
            _ = shutdown => {}
        }

        let drain = Duration::from_secs(config.server.shutdown_timeout_secs);
        info!("Shutting down, waiting up to {:?} for in-flight requests", drain);
        stop_accepting.cancel();

        if let Ok(result) = tokio::time::timeout(drain, &mut server).await {
            info!("Server stopped");
            return flatten(result);
        }

        warn!("Shutdown timed out after {:?}, cancelling in-flight requests", drain);
        cancel.cancel();
        match tokio::time::timeout(FORCE_CLOSE_GRACE, &mut server).await {
            Ok(result) => flatten(result),
            Err(_) => {
                server.abort();
                warn!("Forced server stop with requests still open");
                Ok(())
            }
        }
    }
}

fn flatten(result: std::result::Result<Result<()>, tokio::task::JoinError>) -> Result<()> {
    result.map_err(|e| Error::Internal(format!("Server task failed: {}", e)))?
}

async fn run_http(listener: TcpListener, app: Router, shutdown: CancellationToken) -> Result<()> {
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;
    Ok(())
}

async fn run_https(
    listener: TcpListener,
    tls_acceptor: TlsAcceptor,
    app: Router,
    shutdown: CancellationToken,
) -> Result<()> {
    let connections = TaskTracker::new();

    loop {
        let (stream, peer_addr) = tokio::select! {
            _ = shutdown.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok(conn) => conn,
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                    continue;
                }
            },
        };

        let tls_acceptor = tls_acceptor.inner().clone();
        let app = app.clone();
        let shutdown = shutdown.clone();

        connections.spawn(async move {
            let tls_stream = match tls_acceptor.accept(stream).await {
                Ok(stream) => stream,
                Err(e) => {
                    warn!("TLS handshake failed from {}: {}", peer_addr, e);
                    return;
                }
            };

            let io = TokioIo::new(tls_stream);
            let service = hyper::service::service_fn(move |req| {
                let mut app = app.clone();
                async move { app.call(req).await }
            });

            let builder = hyper_util::server::conn::auto::Builder::new(TokioExecutor::new());
            let conn = builder.serve_connection(io, service);
            tokio::pin!(conn);

            let result = tokio::select! {
                result = conn.as_mut() => result,
                _ = shutdown.cancelled() => {
                    conn.as_mut().graceful_shutdown();
                    conn.await
                }
            };
            if let Err(e) = result {
                // Ignore connection reset errors
                if !e.to_string().contains("connection reset") {
                    error!("Connection error from {}: {}", peer_addr, e);
                }
            }
        });
    }

    connections.close();
    connections.wait().await;
    Ok(())
}

/// Build the API router around shared state
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest(API_PREFIX, api_routes())
        .fallback(handlers::not_found)
        .layer(middleware::from_fn(correlation_id))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(true)),
        )
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/usercheck/{identifier}", get(handlers::check_user))
        .route("/usercount", get(handlers::count_users))
        .route("/status", get(handlers::get_status))
}
