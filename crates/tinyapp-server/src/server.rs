//! HTTP/1.1 host for an [`App`].
//!
//! Each connection is served on its own task. Bodies are collected up to
//! the configured limit before dispatch; body collection and dispatch are
//! each bounded by the request timeout. A [`DispatchError`] escaping the
//! application becomes a 500 response here.
//!
//! # Example
//!
//! ```rust,no_run
//! use tinyapp_core::{HandlerRef, Signature};
//! use tinyapp_server::{App, Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), tinyapp_server::ServerError> {
//!     let mut app = App::new();
//!     app.get("/", HandlerRef::function(Signature::new(), |_| async { Ok("hello") }));
//!
//!     let config = ServerConfig::builder().http_addr("127.0.0.1:8080").build();
//!     Server::new(app, config).run().await
//! }
//! ```

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use http::StatusCode;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tinyapp_core::{body, DispatchError, ErrorDetail, ErrorEnvelope, Request, Response};
use tinyapp_middleware::ResponseExt;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn};

use crate::app::App;
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// Serves an [`App`] over HTTP/1.1.
#[derive(Debug)]
pub struct Server {
    app: Arc<App>,
    config: ServerConfig,
}

impl Server {
    /// A server for `app`.
    #[must_use]
    pub fn new(app: App, config: ServerConfig) -> Self {
        Self::from_shared(Arc::new(app), config)
    }

    /// A server for an already shared `app`.
    #[must_use]
    pub fn from_shared(app: Arc<App>, config: ServerConfig) -> Self {
        Self { app, config }
    }

    /// The application.
    #[must_use]
    pub fn app(&self) -> &Arc<App> {
        &self.app
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Binds the configured address.
    ///
    /// # Errors
    ///
    /// [`ServerError::InvalidAddress`] or [`ServerError::Bind`].
    pub async fn bind(&self) -> Result<TcpListener, ServerError> {
        let addr = self
            .config
            .socket_addr()
            .map_err(|e| ServerError::InvalidAddress {
                addr: self.config.http_addr().to_string(),
                reason: e.to_string(),
            })?;
        TcpListener::bind(addr).await.map_err(|source| ServerError::Bind {
            addr: addr.to_string(),
            source,
        })
    }

    /// Runs until SIGTERM or SIGINT.
    ///
    /// # Errors
    ///
    /// The address cannot be bound.
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_with_shutdown(ShutdownSignal::with_os_signals()).await
    }

    /// Runs until `shutdown` fires.
    ///
    /// # Errors
    ///
    /// The address cannot be bound.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let listener = self.bind().await?;
        self.serve(listener, shutdown).await
    }

    /// Serves connections from `listener` until `shutdown` fires, then
    /// waits up to the shutdown timeout for open connections.
    ///
    /// # Errors
    ///
    /// The listener's local address cannot be read.
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown: ShutdownSignal,
    ) -> Result<(), ServerError> {
        let local_addr = listener.local_addr()?;
        info!(addr = %local_addr, routes = self.app.router().len(), "server listening");

        let server = Arc::new(self);
        let tracker = ConnectionTracker::new();

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, remote_addr)) => {
                        let server = Arc::clone(&server);
                        let token = tracker.acquire();
                        let shutdown = shutdown.clone();
                        tokio::spawn(async move {
                            if let Err(err) = server.handle_connection(stream, remote_addr, shutdown).await {
                                debug!(remote = %remote_addr, error = %err, "connection error");
                            }
                            drop(token);
                        });
                    }
                    Err(err) => warn!(error = %err, "failed to accept connection"),
                },
                () = shutdown.recv() => {
                    info!("shutdown signal received, no longer accepting connections");
                    break;
                }
            }
        }

        let timeout = server.config.shutdown_timeout();
        info!(
            active = tracker.active_connections(),
            timeout_ms = millis(timeout),
            "draining connections"
        );
        if tokio::time::timeout(timeout, tracker.wait_idle()).await.is_err() {
            warn!(
                active = tracker.active_connections(),
                "shutdown timeout reached with connections still open"
            );
        }

        info!("server stopped");
        Ok(())
    }

    async fn handle_connection(
        self: &Arc<Self>,
        stream: TcpStream,
        remote_addr: SocketAddr,
        shutdown: ShutdownSignal,
    ) -> Result<(), hyper::Error> {
        let server = Arc::clone(self);
        let service = service_fn(move |request: http::Request<Incoming>| {
            let server = Arc::clone(&server);
            async move { Ok::<_, Infallible>(server.handle_request(request).await) }
        });

        let connection = http1::Builder::new().serve_connection(TokioIo::new(stream), service);
        tokio::pin!(connection);

        tokio::select! {
            result = connection.as_mut() => result,
            () = shutdown.recv() => {
                debug!(remote = %remote_addr, "closing connection for shutdown");
                connection.as_mut().graceful_shutdown();
                connection.await
            }
        }
    }

    async fn handle_request(&self, request: http::Request<Incoming>) -> Response {
        let (parts, incoming) = request.into_parts();
        let limited = Limited::new(incoming, self.config.max_body_bytes());

        let collected = match with_timeout(self.config.request_timeout(), limited.collect()).await {
            Some(Ok(collected)) => collected.to_bytes(),
            Some(Err(err)) if err.is::<LengthLimitError>() => {
                debug!(limit = self.config.max_body_bytes(), "request body too large");
                return Response::text(StatusCode::PAYLOAD_TOO_LARGE, "Payload Too Large");
            }
            Some(Err(err)) => {
                debug!(error = %err, "failed to read request body");
                return Response::text(StatusCode::BAD_REQUEST, "Bad Request");
            }
            None => {
                warn!(method = %parts.method, uri = %parts.uri, "request body timed out");
                return Response::text(StatusCode::REQUEST_TIMEOUT, "Request Timeout");
            }
        };

        let method = parts.method.clone();
        let uri = parts.uri.clone();
        let request = Request::from_parts(parts, body(collected));

        match with_timeout(self.config.request_timeout(), self.app.dispatch(request)).await {
            Some(Ok(response)) => response,
            Some(Err(err)) => internal_error(&err),
            None => {
                warn!(%method, %uri, "dispatch timed out");
                Response::text(StatusCode::GATEWAY_TIMEOUT, "Gateway Timeout")
            }
        }
    }
}

async fn with_timeout<F: Future>(limit: Option<Duration>, future: F) -> Option<F::Output> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, future).await.ok(),
        None => Some(future.await),
    }
}

fn internal_error(err: &DispatchError) -> Response {
    error!(error = %err, code = err.code(), "unhandled dispatch error");
    let envelope = ErrorEnvelope {
        error: ErrorDetail {
            code: err.code().to_string(),
            message: "Internal Server Error".to_string(),
            status: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
        },
        request_id: None,
    };
    match serde_json::to_vec(&envelope) {
        Ok(json) => Response::json_bytes(StatusCode::INTERNAL_SERVER_ERROR, json),
        Err(_) => Response::text(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error"),
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
