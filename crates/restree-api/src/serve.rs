//! HTTP transport binding
//!
//! [`HttpServer`] puts an [`ApiServer`] on a TCP socket. Every incoming
//! request is forwarded as a single fallback route into the dispatcher, so
//! the endpoint table — not the transport router — decides what exists.
//!
//! Requests are processed strictly one at a time (a global concurrency limit
//! of 1): the item tree carries no internal synchronization, and serial
//! dispatch is what makes that safe. Concurrent clients queue on the
//! transport.

use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::response::{IntoResponse, Response};
use axum::Router;
use futures::FutureExt;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::request::ApiRequest;
use crate::response::ApiResponse;
use crate::server::ApiServer;

const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// A running (or stoppable) HTTP front-end for one dispatcher.
pub struct HttpServer {
    api: Arc<ApiServer>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
    local_addr: Option<SocketAddr>,
}

impl HttpServer {
    /// Wraps a dispatcher; call [`start`](HttpServer::start) to listen.
    pub fn new(api: Arc<ApiServer>) -> Self {
        HttpServer {
            api,
            shutdown_tx: None,
            handle: None,
            local_addr: None,
        }
    }

    /// The wrapped dispatcher.
    pub fn api(&self) -> &Arc<ApiServer> {
        &self.api
    }

    /// Binds `addr` and starts serving in a background task. Returns the
    /// bound address (useful with port 0). Starting an already-running
    /// server is an error.
    pub async fn start(&mut self, addr: SocketAddr) -> std::io::Result<SocketAddr> {
        if self.handle.is_some() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                "server is already running",
            ));
        }
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;

        let router = build_router(Arc::clone(&self.api));
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let handle = tokio::spawn(async move {
            if let Err(err) = axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
            {
                tracing::error!(error = %err, "http server terminated with an error");
            }
        });

        tracing::info!(addr = %local_addr, "listening");
        self.shutdown_tx = Some(shutdown_tx);
        self.handle = Some(handle);
        self.local_addr = Some(local_addr);
        Ok(local_addr)
    }

    /// The bound address while running.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Whether [`start`](HttpServer::start) has been called and
    /// [`stop`](HttpServer::stop) hasn't.
    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Stops the listener and waits for the serve task to finish.
    ///
    /// When this returns, no new request can start: the accept loop has
    /// been joined, not merely signalled.
    pub async fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
        self.local_addr = None;
        tracing::info!("server stopped");
    }
}

impl Drop for HttpServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

fn build_router(api: Arc<ApiServer>) -> Router {
    Router::new()
        .fallback(forward)
        .layer(TraceLayer::new_for_http())
        .layer(GlobalConcurrencyLimitLayer::new(1))
        .with_state(api)
}

/// Adapts one transport request into the dispatcher and back.
async fn forward(State(api): State<Arc<ApiServer>>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let method = parts.method.as_str().to_owned();
    let path = parts.uri.path().to_owned();
    let query = parts.uri.query().unwrap_or("").to_owned();
    let headers: Vec<(String, String)> = parts
        .headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_owned(), value.to_owned()))
        })
        .collect();

    let bytes = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(err) => {
            return ApiError::BadRequest(format!("Failed to read request body: {err}"))
                .to_response()
                .into_response()
        }
    };
    let body_text = if bytes.is_empty() {
        None
    } else {
        match String::from_utf8(bytes.to_vec()) {
            Ok(text) => Some(text),
            Err(_) => {
                return ApiError::BadRequest("Request body must be valid UTF-8".into())
                    .to_response()
                    .into_response()
            }
        }
    };

    let api_request = ApiRequest::new(method, path, &query, headers, body_text);

    // Domain errors are already converted inside `handle`; a panic is a
    // genuine bug. Answer 500 best-effort, then re-raise the panic on a
    // detached task so it reaches the process-level fault handling instead
    // of being swallowed.
    match AssertUnwindSafe(api.handle(api_request)).catch_unwind().await {
        Ok(response) => response.into_response(),
        Err(panic) => {
            tracing::error!("request handler panicked");
            tokio::spawn(async move { std::panic::resume_unwind(panic) });
            ApiResponse::new(
                500,
                serde_json::Value::String("Internal server error".into()).to_string(),
            )
            .into_response()
        }
    }
}
