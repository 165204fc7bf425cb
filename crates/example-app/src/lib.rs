//! example-app - A contacts server built on restree
//!
//! Demonstrates the full stack: a schema-backed resource type, an in-memory
//! store behind [`restree_api::ResourceHooks`], a plain `GET /ping`
//! endpoint, and the HTTP transport. The integration tests in
//! `restree-tests` run against this app.

pub mod config;
pub mod contacts;

use std::sync::Arc;

use restree_api::{
    ApiEndpoint, ApiResponse, ApiResult, ApiServer, ResourceManager, ResourceMethods,
};

use crate::config::AppConfig;
use crate::contacts::ContactStore;

/// Builds the dispatcher with every endpoint of the app registered.
pub fn build_api(config: &AppConfig) -> ApiResult<Arc<ApiServer>> {
    let api = ApiServer::new(config.base_route.clone());

    api.register_handler(ApiEndpoint::new("GET", "/ping"), |_request| async {
        ApiResponse::ok(&"pong")
    })?;

    api.register_handler(ApiEndpoint::new("POST", "/echo"), |request| async move {
        let body = request.require_body()?.to_owned();
        Ok(ApiResponse::new(200, body))
    })?;

    let store = ContactStore::new(config.blocked_user_agents.clone());
    ResourceManager::new("/contacts", ResourceMethods::ALL, store).register(&api)?;

    Ok(api)
}
