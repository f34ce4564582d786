//! HTTP server.
//!
//! Serves a [`Router`] over HTTP/1.1 with hyper. Each connection runs on its
//! own task; each request is bounded by the configured request timeout.
//! Unmatched requests get a 404 JSON body.
//!
//! # Example
//!
//! ```rust,ignore
//! use oasis_server::{Server, ServerConfig, Service};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::builder().http_addr("0.0.0.0:5000").build();
//!     let service = Service::from_config(&config)?;
//!     // ... define endpoints ...
//!     Server::new(config, service.router()).run().await?;
//!     Ok(())
//! }
//! ```

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::{Request, Response, StatusCode};
use http_body_util::Full;
use hyper::body::{Body, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use serde_json::json;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn};

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::router::Router;
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// Type alias for the HTTP response.
pub type HttpResponse = Response<Full<Bytes>>;

/// The Oasis HTTP server.
#[derive(Debug)]
pub struct Server {
    config: ServerConfig,
    router: Router,
}

impl Server {
    /// Creates a server for `router`.
    #[must_use]
    pub fn new(config: ServerConfig, router: Router) -> Self {
        Self { config, router }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns the route table.
    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Runs until SIGTERM or SIGINT.
    pub async fn run(self) -> Result<(), ServerError> {
        let shutdown = ShutdownSignal::with_os_signals();
        self.run_with_shutdown(shutdown).await
    }

    /// Binds the configured address and runs until `shutdown` fires.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let addr = self.config.socket_addr().map_err(|e| {
            ServerError::BindError(format!("Invalid address '{}': {}", self.config.http_addr(), e))
        })?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::BindError(format!("Failed to bind to {addr}: {e}")))?;

        self.serve(listener, shutdown).await
    }

    /// Serves connections from an already bound listener until `shutdown` fires.
    pub async fn serve(self, listener: TcpListener, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let local_addr = listener
            .local_addr()
            .map_err(|e| ServerError::IoError(e.to_string()))?;
        info!(
            addr = %local_addr,
            routes = self.router.route_count(),
            "server listening"
        );

        let server = Arc::new(self);
        let tracker = ConnectionTracker::new();

        loop {
            tokio::select! {
                result = listener.accept() => match result {
                    Ok((stream, remote_addr)) => {
                        let server = Arc::clone(&server);
                        let token = tracker.acquire();
                        let shutdown = shutdown.clone();

                        tokio::spawn(async move {
                            if let Err(e) = server.handle_connection(stream, remote_addr, shutdown).await {
                                debug!(remote_addr = %remote_addr, error = %e, "connection error");
                            }
                            drop(token);
                        });
                    }
                    Err(e) => error!(error = %e, "failed to accept connection"),
                },

                () = shutdown.recv() => {
                    info!("shutdown signal received, no longer accepting connections");
                    break;
                }
            }
        }

        let shutdown_timeout = server.config.shutdown_timeout();
        info!(
            timeout = ?shutdown_timeout,
            connections = tracker.active_connections(),
            "waiting for open connections"
        );

        tokio::select! {
            () = tracker.wait_for_shutdown() => info!("all connections closed"),
            () = tokio::time::sleep(shutdown_timeout) => warn!(
                connections = tracker.active_connections(),
                "shutdown timeout reached with connections still open"
            ),
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
        let io = TokioIo::new(stream);
        let server = Arc::clone(self);

        let service = service_fn(move |req: Request<Incoming>| {
            let server = Arc::clone(&server);
            async move { Ok::<_, Infallible>(server.handle(req).await) }
        });

        let conn = http1::Builder::new().serve_connection(io, service);
        tokio::pin!(conn);

        tokio::select! {
            result = conn.as_mut() => result,
            () = shutdown.recv() => {
                debug!(remote_addr = %remote_addr, "finishing connection for shutdown");
                conn.as_mut().graceful_shutdown();
                conn.await
            }
        }
    }

    /// Routes and serves one request.
    pub async fn handle<B>(&self, req: Request<B>) -> HttpResponse
    where
        B: Body,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let path = req.uri().path().to_string();

        let Some(found) = self.router.match_route(req.method(), &path) else {
            debug!(method = %req.method(), path = %path, "no route");
            return json_response(
                StatusCode::NOT_FOUND,
                &json!({"message": "Not Found", "path": path}),
            );
        };

        let endpoint = Arc::clone(found.endpoint());
        match tokio::time::timeout(self.config.request_timeout(), endpoint.call(req)).await {
            Ok(response) => response,
            Err(_) => {
                warn!(
                    operation_id = %endpoint.info().operation_id,
                    path = %path,
                    timeout = ?self.config.request_timeout(),
                    "request timed out"
                );
                json_response(
                    StatusCode::GATEWAY_TIMEOUT,
                    &json!({"message": "Gateway Timeout", "path": path}),
                )
            }
        }
    }
}

fn json_response(status: StatusCode, body: &serde_json::Value) -> HttpResponse {
    let mut response = Response::new(Full::new(Bytes::from(body.to_string())));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_server_error_display() {
        let bind_err = ServerError::BindError("Address in use".to_string());
        assert!(bind_err.to_string().contains("Bind error"));
    }

    #[tokio::test]
    async fn test_run_invalid_address() {
        let config = ServerConfig::builder().http_addr("not-a-valid-address").build();
        let server = Server::new(config, Router::new());

        match server.run_with_shutdown(ShutdownSignal::new()).await {
            Err(ServerError::BindError(msg)) => assert!(msg.contains("Invalid address")),
            other => panic!("expected BindError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_run_and_shutdown() {
        let config = ServerConfig::builder()
            .http_addr("127.0.0.1:0")
            .shutdown_timeout(Duration::from_millis(100))
            .build();
        let server = Server::new(config, Router::new());

        let shutdown = ShutdownSignal::new();
        shutdown.trigger();

        let result = tokio::time::timeout(Duration::from_secs(5), server.run_with_shutdown(shutdown)).await;
        assert!(matches!(result, Ok(Ok(()))));
    }

    #[tokio::test]
    async fn test_unmatched_request_is_404() {
        let server = Server::new(ServerConfig::default(), Router::new());
        let req = Request::get("/api/nothing")
            .body(Full::new(Bytes::new()))
            .unwrap();

        let response = server.handle(req).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
    }
}
