//! The contacts collection
//!
//! A small but complete resource implementation: a schema describing the
//! shape of a contact, an in-memory JSON store keyed by id, and the
//! [`ResourceHooks`] wiring that exposes it as a CRUD collection.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use restree_api::{ApiError, ApiRequest, ApiResult, ResourceHooks};
use restree_core::{ApiResource, EditPermission, ItemKind, ResourceSchema};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Schema for one contact.
///
/// The id is stamped by the store and read-only afterwards; everything else
/// is freely editable. Unknown payload keys are dropped by the schema match.
pub fn contact_schema() -> ResourceSchema {
    ResourceSchema::new()
        .define(".id", ItemKind::Value, EditPermission::CREATE)
        .define(".name", ItemKind::Value, EditPermission::ALL)
        .define(".email", ItemKind::Value, EditPermission::ALL)
        .define(".age", ItemKind::Value, EditPermission::ALL)
        .define(".address", ItemKind::Dict, EditPermission::ALL)
        .define(".address.city", ItemKind::Value, EditPermission::ALL)
        .define(".address.street", ItemKind::Value, EditPermission::ALL)
        .define(".tags", ItemKind::List, EditPermission::ALL)
        .define(".tags.#", ItemKind::Value, EditPermission::ALL)
}

/// In-memory contact storage plus caller policy.
///
/// No internal concurrency guarantees beyond the lock: the serial dispatch
/// model is what keeps request handling race-free.
pub struct ContactStore {
    schema: Arc<ResourceSchema>,
    blocked_user_agents: Vec<String>,
    entries: RwLock<HashMap<String, JsonValue>>,
}

impl ContactStore {
    pub fn new(blocked_user_agents: Vec<String>) -> Arc<Self> {
        Arc::new(ContactStore {
            schema: Arc::new(contact_schema()),
            blocked_user_agents,
            entries: RwLock::new(HashMap::new()),
        })
    }

    /// The shared contact schema.
    pub fn schema(&self) -> &Arc<ResourceSchema> {
        &self.schema
    }

    /// Number of stored contacts.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    fn load(&self, id: &str) -> ApiResult<Option<ApiResource>> {
        let entries = self.entries.read();
        entries
            .get(id)
            .map(|document| {
                ApiResource::from_json(id, Arc::clone(&self.schema), document)
                    .map_err(ApiError::from)
            })
            .transpose()
    }

    /// Parses a request body into a schema-checked contact document with the
    /// given id stamped in.
    fn document_from_request(&self, id: &str, request: &ApiRequest) -> ApiResult<JsonValue> {
        let mut payload: JsonValue = request.json_body()?;
        if let Some(map) = payload.as_object_mut() {
            map.insert("id".to_owned(), JsonValue::String(id.to_owned()));
        } else {
            return Err(ApiError::BadRequest(
                "Contact payload must be a JSON object".to_owned(),
            ));
        }
        // Round-trip through the schema so unknown keys are dropped before
        // anything is stored.
        let resource = ApiResource::from_json(id, Arc::clone(&self.schema), &payload)?;
        Ok(resource.to_json())
    }
}

#[async_trait]
impl ResourceHooks for ContactStore {
    async fn check_request(&self, request: &ApiRequest) -> ApiResult<()> {
        if let Some(agent) = request.header("user-agent") {
            for blocked in &self.blocked_user_agents {
                if agent.starts_with(blocked.as_str()) {
                    tracing::warn!(%agent, "rejected blocked client");
                    return Err(ApiError::Forbidden(format!(
                        "Clients identifying as '{blocked}' are not allowed"
                    )));
                }
            }
        }
        Ok(())
    }

    async fn query_resources(&self, _request: &ApiRequest) -> ApiResult<Vec<ApiResource>> {
        let entries = self.entries.read();
        let mut ids: Vec<&String> = entries.keys().collect();
        ids.sort();
        ids.into_iter()
            .map(|id| {
                ApiResource::from_json(id.as_str(), Arc::clone(&self.schema), &entries[id])
                    .map_err(ApiError::from)
            })
            .collect()
    }

    async fn select_resource(
        &self,
        resource_id: &str,
        _request: &ApiRequest,
    ) -> ApiResult<Option<ApiResource>> {
        self.load(resource_id)
    }

    async fn create_resource(&self, request: &ApiRequest) -> ApiResult<String> {
        let id = Uuid::new_v4().to_string();
        let document = self.document_from_request(&id, request)?;
        self.entries.write().insert(id.clone(), document);
        tracing::info!(%id, "contact created");
        Ok(id)
    }

    async fn replace_resource(&self, resource_id: &str, request: &ApiRequest) -> ApiResult<bool> {
        let document = self.document_from_request(resource_id, request)?;
        let replaced = self
            .entries
            .write()
            .insert(resource_id.to_owned(), document)
            .is_some();
        tracing::info!(id = %resource_id, replaced, "contact replaced");
        Ok(replaced)
    }

    async fn update_resource(&self, resource: &ApiResource, _request: &ApiRequest) -> ApiResult<()> {
        self.entries
            .write()
            .insert(resource.name().to_owned(), resource.to_json());
        Ok(())
    }

    async fn delete_resource(&self, resource_id: &str, _request: &ApiRequest) -> ApiResult<bool> {
        let removed = self.entries.write().remove(resource_id).is_some();
        if removed {
            tracing::info!(id = %resource_id, "contact deleted");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn request_with_body(body: JsonValue) -> ApiRequest {
        ApiRequest::new("POST", "/contacts/", "", Vec::new(), Some(body.to_string()))
    }

    #[tokio::test]
    async fn create_stamps_an_id() {
        let store = ContactStore::new(Vec::new());
        let request = request_with_body(json!({"name": "alice"}));
        let id = store.create_resource(&request).await.unwrap();

        let resource = store.load(&id).unwrap().unwrap();
        assert_eq!(resource.to_json(), json!({"id": id, "name": "alice"}));
    }

    #[tokio::test]
    async fn create_drops_unknown_keys() {
        let store = ContactStore::new(Vec::new());
        let request = request_with_body(json!({"name": "alice", "password": "hunter2"}));
        let id = store.create_resource(&request).await.unwrap();

        let resource = store.load(&id).unwrap().unwrap();
        assert_eq!(resource.to_json(), json!({"id": id, "name": "alice"}));
    }

    #[tokio::test]
    async fn non_object_payloads_are_rejected() {
        let store = ContactStore::new(Vec::new());
        let request = request_with_body(json!([1, 2, 3]));
        let err = store.create_resource(&request).await.unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn blocked_user_agents_are_forbidden() {
        let store = ContactStore::new(vec!["EvilBot".to_owned()]);
        let request = ApiRequest::new(
            "GET",
            "/contacts/",
            "",
            vec![("User-Agent".to_owned(), "EvilBot/2.1".to_owned())],
            None,
        );
        let err = store.check_request(&request).await.unwrap_err();
        assert_eq!(err.status_code(), 403);

        let friendly = ApiRequest::new(
            "GET",
            "/contacts/",
            "",
            vec![("User-Agent".to_owned(), "reqwest/0.12".to_owned())],
            None,
        );
        assert!(store.check_request(&friendly).await.is_ok());
    }
}
