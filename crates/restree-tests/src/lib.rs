//! Test utilities for restree integration tests
//!
//! Provides a [`TestServer`] that runs the example contacts app on an
//! ephemeral port and shuts it down when dropped.

use std::net::SocketAddr;

use example_app::build_api;
use example_app::config::AppConfig;
use restree_api::HttpServer;

/// A running example-app instance plus an HTTP client for it.
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: reqwest::Client,
    server: HttpServer,
}

impl TestServer {
    /// Starts the app with default config on an ephemeral port.
    pub async fn start() -> std::io::Result<Self> {
        Self::start_with_config(AppConfig::default()).await
    }

    /// Starts the app with a custom config; host/port are overridden with an
    /// ephemeral loopback port.
    pub async fn start_with_config(config: AppConfig) -> std::io::Result<Self> {
        let api = build_api(&config)
            .map_err(|e| std::io::Error::other(format!("failed to build api: {e}")))?;
        let mut server = HttpServer::new(api);
        let addr = server.start("127.0.0.1:0".parse().unwrap()).await?;

        Ok(TestServer {
            addr,
            client: reqwest::Client::new(),
            server,
        })
    }

    /// Absolute URL for a server path.
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Stops the server and waits until the accept loop has exited.
    pub async fn shutdown(mut self) {
        self.server.stop().await;
    }
}
