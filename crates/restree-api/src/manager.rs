//! CRUD resource managers
//!
//! A [`ResourceManager`] binds a resource type to the standard CRUD endpoint
//! set under one base route, delegating the actual storage to an
//! implementation of [`ResourceHooks`]. Hooks default to a 405 error, so an
//! implementation opts into exactly the verbs it supports via
//! [`ResourceMethods`].

use std::ops::{BitOr, BitOrAssign};
use std::sync::Arc;

use async_trait::async_trait;
use restree_core::{filter_resources, parse_filters, ApiResource, PropertyPath};
use serde_json::json;

use crate::endpoint::ApiEndpoint;
use crate::error::{ApiError, ApiResult};
use crate::request::ApiRequest;
use crate::response::ApiResponse;
use crate::server::ApiServer;

/// Flag set selecting which CRUD verbs a manager registers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceMethods(u8);

impl ResourceMethods {
    /// No endpoints
    pub const NONE: ResourceMethods = ResourceMethods(0b0000_0000);
    /// `GET R/` — list/filter the collection
    pub const QUERY: ResourceMethods = ResourceMethods(0b0000_0001);
    /// `GET R/{resourceId}/{...}` — fetch a resource or sub-item
    pub const SELECT: ResourceMethods = ResourceMethods(0b0000_0010);
    /// `POST R/` — create a resource
    pub const CREATE: ResourceMethods = ResourceMethods(0b0000_0100);
    /// `PUT R/{resourceId}/` — replace or create a resource
    pub const REPLACE: ResourceMethods = ResourceMethods(0b0000_1000);
    /// `PATCH R/{resourceId}/{...}` — merge into a resource or sub-item
    pub const UPDATE: ResourceMethods = ResourceMethods(0b0001_0000);
    /// `DELETE R/{resourceId}/` — delete a resource
    pub const DELETE: ResourceMethods = ResourceMethods(0b0010_0000);
    /// All six verbs
    pub const ALL: ResourceMethods = ResourceMethods(0b0011_1111);

    /// Whether every flag of `other` is set.
    pub fn contains(self, other: ResourceMethods) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for ResourceMethods {
    type Output = ResourceMethods;

    fn bitor(self, rhs: Self) -> Self {
        ResourceMethods(self.0 | rhs.0)
    }
}

impl BitOrAssign for ResourceMethods {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Storage hooks behind a resource manager.
///
/// Every hook defaults to a 405 "not implemented" error; implementations
/// override the ones matching their registered [`ResourceMethods`].
/// `check_request` runs before every hook and defaults to allowing the
/// caller.
#[async_trait]
pub trait ResourceHooks: Send + Sync + 'static {
    /// Caller policy gate, e.g. rejecting disallowed client identities.
    async fn check_request(&self, _request: &ApiRequest) -> ApiResult<()> {
        Ok(())
    }

    /// All resources of the collection (filtering is applied by the
    /// manager).
    async fn query_resources(&self, _request: &ApiRequest) -> ApiResult<Vec<ApiResource>> {
        Err(ApiError::MethodNotImplemented("Query"))
    }

    /// The resource with the given id, or `None` when unknown.
    async fn select_resource(
        &self,
        _resource_id: &str,
        _request: &ApiRequest,
    ) -> ApiResult<Option<ApiResource>> {
        Err(ApiError::MethodNotImplemented("Select"))
    }

    /// Creates a resource from the request and returns its new id.
    async fn create_resource(&self, _request: &ApiRequest) -> ApiResult<String> {
        Err(ApiError::MethodNotImplemented("Create"))
    }

    /// Replaces the resource with the given id, creating it when absent.
    /// Returns `true` when an existing resource was replaced.
    async fn replace_resource(&self, _resource_id: &str, _request: &ApiRequest) -> ApiResult<bool> {
        Err(ApiError::MethodNotImplemented("Replace"))
    }

    /// Persists a resource modified by a PATCH merge.
    async fn update_resource(&self, _resource: &ApiResource, _request: &ApiRequest) -> ApiResult<()> {
        Err(ApiError::MethodNotImplemented("Update"))
    }

    /// Deletes the resource with the given id. Returns `false` when there
    /// was nothing to delete.
    async fn delete_resource(&self, _resource_id: &str, _request: &ApiRequest) -> ApiResult<bool> {
        Err(ApiError::MethodNotImplemented("Delete"))
    }
}

/// Binds a hook implementation to the CRUD endpoints under a base route.
pub struct ResourceManager {
    route: String,
    methods: ResourceMethods,
    hooks: Arc<dyn ResourceHooks>,
}

impl ResourceManager {
    /// Creates a manager for the collection at `route` (e.g. `/contacts`).
    pub fn new(
        route: impl Into<String>,
        methods: ResourceMethods,
        hooks: Arc<dyn ResourceHooks>,
    ) -> Self {
        ResourceManager {
            route: route.into(),
            methods,
            hooks,
        }
    }

    /// Registers the selected endpoints on the server.
    pub fn register(&self, server: &ApiServer) -> ApiResult<()> {
        let route = self.route.trim_end_matches('/');

        if self.methods.contains(ResourceMethods::QUERY) {
            let hooks = Arc::clone(&self.hooks);
            server.register_handler(
                ApiEndpoint::new("GET", format!("{route}/")),
                move |request| {
                    let hooks = Arc::clone(&hooks);
                    async move { query(hooks, request).await }
                },
            )?;
        }

        if self.methods.contains(ResourceMethods::SELECT) {
            let hooks = Arc::clone(&self.hooks);
            server.register_handler(
                ApiEndpoint::new("GET", format!("{route}/{{resourceId}}/{{...}}")),
                move |request| {
                    let hooks = Arc::clone(&hooks);
                    async move { select(hooks, request).await }
                },
            )?;
        }

        if self.methods.contains(ResourceMethods::CREATE) {
            let hooks = Arc::clone(&self.hooks);
            server.register_handler(
                ApiEndpoint::new("POST", format!("{route}/")),
                move |request| {
                    let hooks = Arc::clone(&hooks);
                    async move { create(hooks, request).await }
                },
            )?;
        }

        if self.methods.contains(ResourceMethods::REPLACE) {
            let hooks = Arc::clone(&self.hooks);
            server.register_handler(
                ApiEndpoint::new("PUT", format!("{route}/{{resourceId}}/")),
                move |request| {
                    let hooks = Arc::clone(&hooks);
                    async move { replace(hooks, request).await }
                },
            )?;
        }

        if self.methods.contains(ResourceMethods::UPDATE) {
            let hooks = Arc::clone(&self.hooks);
            server.register_handler(
                ApiEndpoint::new("PATCH", format!("{route}/{{resourceId}}/{{...}}")),
                move |request| {
                    let hooks = Arc::clone(&hooks);
                    async move { update(hooks, request).await }
                },
            )?;
        }

        if self.methods.contains(ResourceMethods::DELETE) {
            let hooks = Arc::clone(&self.hooks);
            server.register_handler(
                ApiEndpoint::new("DELETE", format!("{route}/{{resourceId}}/")),
                move |request| {
                    let hooks = Arc::clone(&hooks);
                    async move { delete(hooks, request).await }
                },
            )?;
        }

        Ok(())
    }
}

fn resource_id(request: &ApiRequest) -> ApiResult<&str> {
    request
        .arguments()
        .first()
        .map(String::as_str)
        .ok_or_else(|| ApiError::Internal("resource endpoint matched without an id".into()))
}

/// Property path below the resource root: every argument after the id.
fn sub_path(request: &ApiRequest) -> ApiResult<PropertyPath> {
    let segments = &request.arguments()[1..];
    PropertyPath::new(segments.iter()).map_err(ApiError::from)
}

async fn query(hooks: Arc<dyn ResourceHooks>, request: ApiRequest) -> ApiResult<ApiResponse> {
    hooks.check_request(&request).await?;
    let resources = hooks.query_resources(&request).await?;
    let filters = parse_filters(request.query_params());
    let matching = filter_resources(resources, &filters)?;
    let body: Vec<_> = matching.iter().map(ApiResource::to_json).collect();
    ApiResponse::ok(&body)
}

async fn select(hooks: Arc<dyn ResourceHooks>, request: ApiRequest) -> ApiResult<ApiResponse> {
    hooks.check_request(&request).await?;
    let id = resource_id(&request)?;
    let resource = hooks
        .select_resource(id, &request)
        .await?
        .ok_or_else(|| ApiError::ResourceNotFound(id.to_owned()))?;

    let path = sub_path(&request)?;
    let item = resource.item_at(&path)?;
    ApiResponse::ok(&item.to_json())
}

async fn create(hooks: Arc<dyn ResourceHooks>, request: ApiRequest) -> ApiResult<ApiResponse> {
    hooks.check_request(&request).await?;
    let id = hooks.create_resource(&request).await?;
    ApiResponse::json(201, &json!({ "resourceId": id }))
}

async fn replace(hooks: Arc<dyn ResourceHooks>, request: ApiRequest) -> ApiResult<ApiResponse> {
    hooks.check_request(&request).await?;
    let id = resource_id(&request)?.to_owned();
    let replaced = hooks.replace_resource(&id, &request).await?;
    if replaced {
        Ok(ApiResponse::status_only(200))
    } else {
        ApiResponse::json(201, &json!({ "resourceId": id }))
    }
}

async fn update(hooks: Arc<dyn ResourceHooks>, request: ApiRequest) -> ApiResult<ApiResponse> {
    hooks.check_request(&request).await?;
    let id = resource_id(&request)?.to_owned();
    let mut resource = hooks
        .select_resource(&id, &request)
        .await?
        .ok_or_else(|| ApiError::ResourceNotFound(id.clone()))?;

    let patch: serde_json::Value = request.json_body()?;
    let path = sub_path(&request)?;
    let merged = resource.merge_json_at(&path, &patch)?;
    hooks.update_resource(&resource, &request).await?;
    ApiResponse::ok(&merged)
}

async fn delete(hooks: Arc<dyn ResourceHooks>, request: ApiRequest) -> ApiResult<ApiResponse> {
    hooks.check_request(&request).await?;
    let id = resource_id(&request)?;
    if hooks.delete_resource(id, &request).await? {
        Ok(ApiResponse::no_content())
    } else {
        Err(ApiError::ResourceNotFound(id.to_owned()))
    }
}
