//! Resources: schema-backed item trees
//!
//! An [`ApiResource`] wraps one [`ApiItem`] tree together with the
//! [`ResourceSchema`] describing which properties may exist where and with
//! which permissions. All path-addressed operations live here: lookup,
//! effective-permission computation, schema-checked property creation,
//! scalar writes and JSON merges.

use std::sync::Arc;

use serde_json::Value as JsonValue;

use crate::error::{TreeError, TreeResult};
use crate::item::{ApiItem, ItemKind};
use crate::path::PropertyPath;
use crate::permission::EditPermission;
use crate::schema::ResourceSchema;
use crate::value::ItemValue;

/// One resource instance: a named item tree validated against a shared
/// schema.
#[derive(Debug, Clone)]
pub struct ApiResource {
    name: String,
    schema: Arc<ResourceSchema>,
    root: ApiItem,
}

impl ApiResource {
    /// Creates an empty resource; the root node takes its kind and
    /// permissions from the schema's root entry.
    pub fn new(name: impl Into<String>, schema: Arc<ResourceSchema>) -> Self {
        let info = schema.root_info();
        ApiResource {
            name: name.into(),
            schema,
            root: ApiItem::new_of_kind(info.kind, info.permissions),
        }
    }

    /// Builds a resource from a JSON document, matching every node against
    /// the schema.
    ///
    /// Payload shapes with no matching schema entry (unknown keys, or a JSON
    /// shape that disagrees with the declared kind) are skipped, not errored.
    /// Only a root-level mismatch is an error, since it leaves nothing to
    /// build.
    pub fn from_json(
        name: impl Into<String>,
        schema: Arc<ResourceSchema>,
        json: &JsonValue,
    ) -> TreeResult<Self> {
        let root = build_item(&schema, &PropertyPath::root(), json)?.ok_or_else(|| {
            TreeError::JsonData(format!(
                "root payload of kind {} doesn't match the schema root entry",
                crate::value::json_kind_name(json)
            ))
        })?;
        Ok(ApiResource {
            name: name.into(),
            schema,
            root,
        })
    }

    /// Parses raw JSON text into a schema-checked resource.
    pub fn parse(
        name: impl Into<String>,
        schema: Arc<ResourceSchema>,
        text: &str,
    ) -> TreeResult<Self> {
        let json: JsonValue =
            serde_json::from_str(text).map_err(|e| TreeError::JsonParse(e.to_string()))?;
        ApiResource::from_json(name, schema, &json)
    }

    /// The resource's name (typically its id).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The shared schema.
    pub fn schema(&self) -> &Arc<ResourceSchema> {
        &self.schema
    }

    /// The root item.
    pub fn root(&self) -> &ApiItem {
        &self.root
    }

    /// Mutable root item, for resource implementations that manage their own
    /// subtree directly.
    pub fn root_mut(&mut self) -> &mut ApiItem {
        &mut self.root
    }

    /// JSON form of the whole tree.
    pub fn to_json(&self) -> JsonValue {
        self.root.to_json()
    }

    // ---- path-addressed lookup --------------------------------------------

    /// The item at `path`.
    pub fn item_at(&self, path: &PropertyPath) -> TreeResult<&ApiItem> {
        let mut current = &self.root;
        for segment in path.key_segments() {
            current = child_of(current, segment)?;
        }
        Ok(current)
    }

    /// The item at `path`, mutably.
    pub fn item_at_mut(&mut self, path: &PropertyPath) -> TreeResult<&mut ApiItem> {
        let mut current = &mut self.root;
        for segment in path.key_segments() {
            current = child_of_mut(current, segment)?;
        }
        Ok(current)
    }

    /// The effective permissions at `path`: the node's own permissions
    /// intersected with every ancestor's, computed on demand.
    pub fn effective_permissions_at(&self, path: &PropertyPath) -> TreeResult<EditPermission> {
        let mut current = &self.root;
        let mut effective = current.permissions();
        for segment in path.key_segments() {
            current = child_of(current, segment)?;
            effective &= current.permissions();
        }
        Ok(effective)
    }

    // ---- schema-checked property operations -------------------------------

    /// The existing property at `path` (alias for [`item_at`]).
    ///
    /// [`item_at`]: ApiResource::item_at
    pub fn get_property(&self, path: &PropertyPath) -> TreeResult<&ApiItem> {
        self.item_at(path)
    }

    /// Creates the property at `path`, building missing intermediate
    /// containers along the way.
    ///
    /// Every created node takes kind and permissions from the schema; a
    /// missing schema entry for any segment fails with
    /// [`TreeError::PropertyNotDefined`], and an already-existing terminal
    /// node fails with [`TreeError::PropertyAlreadyExists`]. Creation checks
    /// the parent's effective Modify and the new node's effective Create
    /// permission.
    pub fn create_property(&mut self, path: &PropertyPath) -> TreeResult<&mut ApiItem> {
        if self.item_at(path).is_ok() {
            return Err(TreeError::PropertyAlreadyExists(path.full_path().to_owned()));
        }

        let schema = Arc::clone(&self.schema);
        let mut current = &mut self.root;
        let mut effective = current.permissions();
        let mut partial = PropertyPath::root();
        for segment in path.key_segments() {
            partial = partial.try_append(segment)?;
            if !has_child(current, segment)? {
                let info = schema.require(&partial)?;
                effective.check(EditPermission::MODIFY, partial.full_path())?;
                let child_effective = info.permissions & effective;
                child_effective.check(EditPermission::CREATE, partial.full_path())?;

                let child = ApiItem::new_of_kind(info.kind, info.permissions);
                match current.kind() {
                    ItemKind::Dict => current.insert_unchecked(segment, child)?,
                    ItemKind::List => {
                        let index = parse_index(segment)?;
                        if index != current.len() {
                            return Err(TreeError::IndexOutOfBounds {
                                index,
                                len: current.len(),
                            });
                        }
                        current.push_unchecked(child)?;
                    }
                    kind => {
                        return Err(TreeError::TypeMismatch {
                            expected: "List or Dict",
                            actual: kind.name(),
                        })
                    }
                }
            }
            current = child_of_mut(current, segment)?;
            effective &= current.permissions();
        }
        Ok(current)
    }

    /// The property at `path`, created first if it doesn't exist yet.
    pub fn get_or_create_property(&mut self, path: &PropertyPath) -> TreeResult<&mut ApiItem> {
        if self.item_at(path).is_ok() {
            self.item_at_mut(path)
        } else {
            self.create_property(path)
        }
    }

    /// Writes a scalar at `path`.
    ///
    /// A missing property is created first (checking Create); an existing
    /// one requires the effective Modify permission.
    pub fn set_value(
        &mut self,
        path: &PropertyPath,
        value: impl Into<ItemValue>,
    ) -> TreeResult<()> {
        if self.item_at(path).is_ok() {
            let effective = self.effective_permissions_at(path)?;
            effective.check(EditPermission::MODIFY, path.full_path())?;
            self.item_at_mut(path)?.set_scalar_unchecked(value)
        } else {
            self.create_property(path)?.set_scalar_unchecked(value)
        }
    }

    /// Reads the scalar at `path`.
    pub fn get_value(&self, path: &PropertyPath) -> TreeResult<&ItemValue> {
        self.item_at(path)?.scalar()
    }

    /// Merges a JSON payload into the subtree at `path` and returns the
    /// merged subtree's JSON.
    ///
    /// The payload is first matched against the schema (unknown shapes are
    /// skipped, like [`from_json`]); the merge then checks the *effective*
    /// permission of every touched node, seeded with the ancestor
    /// intersection above the merge target, and follows the item-level
    /// merge rules.
    ///
    /// [`from_json`]: ApiResource::from_json
    pub fn merge_json_at(
        &mut self,
        path: &PropertyPath,
        json: &JsonValue,
    ) -> TreeResult<JsonValue> {
        let patch = build_item(&self.schema, path, json)?.ok_or_else(|| {
            TreeError::JsonData(format!(
                "payload of kind {} doesn't match the schema at '{}'",
                crate::value::json_kind_name(json),
                path.full_path()
            ))
        })?;

        // Permissions accumulated above the target; the merge intersects the
        // target's own bits itself.
        let inherited = match path.parent() {
            Some(parent) => self.effective_permissions_at(&parent)?,
            None => EditPermission::ALL,
        };

        let target = self.item_at_mut(path)?;
        target.update_from_named(&patch, inherited, path.full_path())?;
        Ok(target.to_json())
    }

    /// Merges another resource's tree into this one (item-level merge rules,
    /// effective permissions checked on every touched node).
    pub fn update_from(&mut self, other: &ApiResource) -> TreeResult<()> {
        self.root.update_from(&other.root, EditPermission::ALL)
    }

    /// Removes the property at `path` from its parent container.
    ///
    /// Requires the target's effective Delete and the parent's effective
    /// Modify permission.
    pub fn remove_property(&mut self, path: &PropertyPath) -> TreeResult<ApiItem> {
        let parent_path = path.parent().ok_or(TreeError::ItemNotContained)?;

        let effective = self.effective_permissions_at(path)?;
        effective.check(EditPermission::DELETE, path.full_path())?;
        let parent_effective = self.effective_permissions_at(&parent_path)?;
        parent_effective.check(EditPermission::MODIFY, parent_path.full_path())?;

        let segment = path
            .segment(path.len() - 1)
            .ok_or(TreeError::ItemNotContained)?
            .to_owned();
        let parent = self.item_at_mut(&parent_path)?;
        match parent.kind() {
            ItemKind::Dict => parent.remove(&segment),
            ItemKind::List => parent.remove_index(parse_index(&segment)?),
            kind => Err(TreeError::TypeMismatch {
                expected: "List or Dict",
                actual: kind.name(),
            }),
        }
    }
}

fn parse_index(segment: &str) -> TreeResult<usize> {
    segment
        .parse::<usize>()
        .map_err(|_| TreeError::InvalidIndex(segment.to_owned()))
}

fn child_of<'a>(item: &'a ApiItem, segment: &str) -> TreeResult<&'a ApiItem> {
    match item.kind() {
        ItemKind::Dict => item.get(segment),
        ItemKind::List => item.get_index(parse_index(segment)?),
        kind => Err(TreeError::TypeMismatch {
            expected: "List or Dict",
            actual: kind.name(),
        }),
    }
}

fn child_of_mut<'a>(item: &'a mut ApiItem, segment: &str) -> TreeResult<&'a mut ApiItem> {
    match item.kind() {
        ItemKind::Dict => item.get_mut(segment),
        ItemKind::List => item.get_index_mut(parse_index(segment)?),
        kind => Err(TreeError::TypeMismatch {
            expected: "List or Dict",
            actual: kind.name(),
        }),
    }
}

fn has_child(item: &ApiItem, segment: &str) -> TreeResult<bool> {
    match item.kind() {
        ItemKind::Dict => Ok(item.contains_key(segment)),
        ItemKind::List => {
            let index = parse_index(segment)?;
            Ok(index < item.len())
        }
        kind => Err(TreeError::TypeMismatch {
            expected: "List or Dict",
            actual: kind.name(),
        }),
    }
}

/// Recursive schema-matched JSON-to-item conversion. `None` means "no
/// matching schema entry, skip this shape".
fn build_item(
    schema: &ResourceSchema,
    path: &PropertyPath,
    json: &JsonValue,
) -> TreeResult<Option<ApiItem>> {
    let Some(info) = schema.lookup(path) else {
        return Ok(None);
    };

    let item = match (info.kind, json) {
        (ItemKind::Object, value) => ApiItem::object(value.clone(), info.permissions),
        (ItemKind::Value, scalar) if !scalar.is_object() && !scalar.is_array() => {
            ApiItem::value(ItemValue::from_json(scalar)?, info.permissions)
        }
        (ItemKind::Dict, JsonValue::Object(map)) => {
            let mut dict = ApiItem::dict(info.permissions);
            for (key, child) in map {
                let child_path = path.try_append(key)?;
                if let Some(child_item) = build_item(schema, &child_path, child)? {
                    dict.insert_unchecked(key, child_item)?;
                }
            }
            dict
        }
        (ItemKind::List, JsonValue::Array(values)) => {
            let mut list = ApiItem::list(info.permissions);
            for (index, child) in values.iter().enumerate() {
                let child_path = path.try_append(&index.to_string())?;
                if let Some(child_item) = build_item(schema, &child_path, child)? {
                    list.push_unchecked(child_item)?;
                }
            }
            list
        }
        _ => return Ok(None),
    };
    Ok(Some(item))
}
