//! Endpoint registration and request dispatch
//!
//! [`ApiServer`] owns the endpoint table and performs the two-pass match:
//! exact matches win over placeholder matches, and within a pass the first
//! registered endpoint wins. Handlers are async closures returning
//! [`ApiResult<ApiResponse>`]; the dispatcher is the single place where
//! errors turn into wire responses.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::endpoint::ApiEndpoint;
use crate::error::{ApiError, ApiResult};
use crate::request::ApiRequest;
use crate::response::ApiResponse;

/// Boxed handler future.
pub type HandlerFuture = Pin<Box<dyn Future<Output = ApiResult<ApiResponse>> + Send>>;

/// Type-erased endpoint handler.
pub type BoxHandler = Arc<dyn Fn(ApiRequest) -> HandlerFuture + Send + Sync>;

/// The request dispatcher: a base route plus an ordered endpoint table.
pub struct ApiServer {
    base_route: String,
    endpoints: RwLock<Vec<(ApiEndpoint, BoxHandler)>>,
}

impl ApiServer {
    /// Creates a dispatcher answering under `base_route` (e.g. `/api`, or an
    /// empty string for the root).
    ///
    /// A default `GET <base>/` index endpoint is registered that lists every
    /// registered endpoint as `"<METHOD> <route>"` strings; it doubles as
    /// the liveness check.
    pub fn new(base_route: impl Into<String>) -> Arc<ApiServer> {
        let server = Arc::new(ApiServer {
            base_route: normalize_base(base_route.into()),
            endpoints: RwLock::new(Vec::new()),
        });

        let weak = Arc::downgrade(&server);
        // The table is empty at this point, registration can't fail.
        let _ = server.register_handler(ApiEndpoint::new("GET", "/"), move |_request| {
            let weak = Weak::clone(&weak);
            async move {
                let server = weak
                    .upgrade()
                    .ok_or_else(|| ApiError::Internal("server no longer running".into()))?;
                ApiResponse::ok(&server.endpoint_index())
            }
        });
        server
    }

    /// The configured base route.
    pub fn base_route(&self) -> &str {
        &self.base_route
    }

    /// Registers an endpoint with its handler.
    ///
    /// Registration order is observable: when several placeholder patterns
    /// could match the same request, the first registered one wins. An
    /// endpoint with the same method and route string as an existing one is
    /// rejected.
    pub fn register_handler<F, Fut>(&self, endpoint: ApiEndpoint, handler: F) -> ApiResult<()>
    where
        F: Fn(ApiRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ApiResult<ApiResponse>> + Send + 'static,
    {
        let mut endpoints = self.endpoints.write();
        if endpoints.iter().any(|(existing, _)| {
            existing.method().eq_ignore_ascii_case(endpoint.method())
                && existing.route() == endpoint.route()
        }) {
            return Err(ApiError::Internal(format!(
                "Endpoint '{endpoint}' is already registered"
            )));
        }

        tracing::info!(endpoint = %endpoint, "endpoint registered");
        let boxed: BoxHandler = Arc::new(move |request| Box::pin(handler(request)));
        endpoints.push((endpoint, boxed));
        Ok(())
    }

    /// Removes the endpoint with the given method and route string. Returns
    /// whether anything was removed.
    pub fn remove_handler(&self, method: &str, route: &str) -> bool {
        let mut endpoints = self.endpoints.write();
        let before = endpoints.len();
        endpoints.retain(|(endpoint, _)| {
            !(endpoint.method().eq_ignore_ascii_case(method) && endpoint.route() == route)
        });
        before != endpoints.len()
    }

    /// `"<METHOD> <route>"` for every registered endpoint, in registration
    /// order.
    pub fn endpoint_index(&self) -> Vec<String> {
        self.endpoints
            .read()
            .iter()
            .map(|(endpoint, _)| endpoint.to_string())
            .collect()
    }

    /// Dispatches one request to completion.
    ///
    /// Strips the base route, finds the endpoint (exact pass first, then
    /// placeholder pass), extracts path arguments, runs the handler and
    /// converts any error into its declared response. Never returns an
    /// error: unmatched requests become the documented 404.
    pub async fn handle(&self, mut request: ApiRequest) -> ApiResponse {
        let method = request.method().to_owned();
        let not_found = || {
            ApiError::EndpointNotFound(format!("{} {}", request.method(), request.path()))
                .to_response()
        };

        let Some(relative) = strip_base(&self.base_route, request.path()) else {
            return not_found();
        };

        let matched = {
            let endpoints = self.endpoints.read();
            endpoints
                .iter()
                .find(|(endpoint, _)| endpoint.matches(&method, &relative, true))
                .or_else(|| {
                    endpoints
                        .iter()
                        .find(|(endpoint, _)| endpoint.matches(&method, &relative, false))
                })
                .map(|(endpoint, handler)| (endpoint.clone(), Arc::clone(handler)))
        };
        let Some((endpoint, handler)) = matched else {
            return not_found();
        };

        let arguments = match endpoint.extract_arguments(&method, &relative) {
            Ok(arguments) => arguments,
            Err(err) => return err.to_response(),
        };
        tracing::debug!(endpoint = %endpoint, path = %relative, "dispatching request");
        request.set_arguments(arguments);

        match handler(request).await {
            Ok(response) => response,
            Err(err) => err.to_response(),
        }
    }
}

fn normalize_base(base: String) -> String {
    let trimmed = base.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

/// Path relative to the base route, or `None` when the path lies outside it.
fn strip_base<'a>(base: &str, path: &'a str) -> Option<&'a str> {
    if base.is_empty() {
        return Some(path);
    }
    let rest = path.strip_prefix(base)?;
    if rest.is_empty() {
        Some("/")
    } else if rest.starts_with('/') {
        Some(rest)
    } else {
        None
    }
}
