//! The addressable item tree
//!
//! An [`ApiItem`] is one node of a resource tree. Each node carries its own
//! declared [`EditPermission`] and one of four payload shapes:
//!
//! * `Value` — a scalar ([`ItemValue`])
//! * `Object` — an opaque JSON document, treated as a single leaf
//! * `List` — an ordered sequence of child items
//! * `Dict` — a string-keyed map of child items
//!
//! Containers own their children by value. Mutation goes through checked
//! methods that enforce the edit permissions; the crate-private `*_unchecked`
//! variants exist for trusted copy/merge internals and never reach request
//! handlers.

use std::collections::HashMap;

use serde_json::Value as JsonValue;

use crate::error::{TreeError, TreeResult};
use crate::permission::EditPermission;
use crate::value::ItemValue;

/// Type tag identifying an item's payload shape.
///
/// Schemas store a tag (plus a permission) instead of a live type handle;
/// [`ApiItem::new_of_kind`] is the matching factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    /// Scalar leaf
    Value,
    /// Opaque JSON leaf
    Object,
    /// Ordered container
    List,
    /// Keyed container
    Dict,
}

impl ItemKind {
    /// Kind name as used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            ItemKind::Value => "Value",
            ItemKind::Object => "Object",
            ItemKind::List => "List",
            ItemKind::Dict => "Dict",
        }
    }
}

#[derive(Debug, Clone)]
enum ItemNode {
    Value(ItemValue),
    Object(JsonValue),
    List(Vec<ApiItem>),
    Dict(HashMap<String, ApiItem>),
}

/// One node of a permission-checked resource tree.
#[derive(Debug, Clone)]
pub struct ApiItem {
    permissions: EditPermission,
    node: ItemNode,
}

impl ApiItem {
    /// Creates a scalar item.
    pub fn value(value: impl Into<ItemValue>, permissions: EditPermission) -> Self {
        ApiItem {
            permissions,
            node: ItemNode::Value(value.into()),
        }
    }

    /// Creates an opaque JSON leaf.
    pub fn object(value: JsonValue, permissions: EditPermission) -> Self {
        ApiItem {
            permissions,
            node: ItemNode::Object(value),
        }
    }

    /// Creates an empty list container.
    pub fn list(permissions: EditPermission) -> Self {
        ApiItem {
            permissions,
            node: ItemNode::List(Vec::new()),
        }
    }

    /// Creates an empty dict container.
    pub fn dict(permissions: EditPermission) -> Self {
        ApiItem {
            permissions,
            node: ItemNode::Dict(HashMap::new()),
        }
    }

    /// Factory keyed by [`ItemKind`]: a default-valued node of that kind.
    ///
    /// `Value` defaults to null, `Object` to an empty JSON object.
    pub fn new_of_kind(kind: ItemKind, permissions: EditPermission) -> Self {
        match kind {
            ItemKind::Value => ApiItem::value(ItemValue::Null, permissions),
            ItemKind::Object => ApiItem::object(JsonValue::Object(Default::default()), permissions),
            ItemKind::List => ApiItem::list(permissions),
            ItemKind::Dict => ApiItem::dict(permissions),
        }
    }

    /// This node's payload shape.
    pub fn kind(&self) -> ItemKind {
        match &self.node {
            ItemNode::Value(_) => ItemKind::Value,
            ItemNode::Object(_) => ItemKind::Object,
            ItemNode::List(_) => ItemKind::List,
            ItemNode::Dict(_) => ItemKind::Dict,
        }
    }

    /// The node's own declared permissions (not intersected with ancestors).
    pub fn permissions(&self) -> EditPermission {
        self.permissions
    }

    /// Replaces the node's declared permissions.
    pub fn set_permissions(&mut self, permissions: EditPermission) {
        self.permissions = permissions;
    }

    /// True for `List` and `Dict` nodes.
    pub fn is_container(&self) -> bool {
        matches!(self.node, ItemNode::List(_) | ItemNode::Dict(_))
    }

    fn type_mismatch(&self, expected: &'static str) -> TreeError {
        TreeError::TypeMismatch {
            expected,
            actual: self.kind().name(),
        }
    }

    // ---- scalar access ----------------------------------------------------

    /// The scalar payload of a `Value` node.
    pub fn scalar(&self) -> TreeResult<&ItemValue> {
        match &self.node {
            ItemNode::Value(v) => Ok(v),
            _ => Err(self.type_mismatch("Value")),
        }
    }

    /// Writes the scalar payload, requiring the Modify permission.
    pub fn set_scalar(&mut self, value: impl Into<ItemValue>) -> TreeResult<()> {
        self.permissions
            .check(EditPermission::MODIFY, self.kind().name())?;
        self.set_scalar_unchecked(value)
    }

    pub(crate) fn set_scalar_unchecked(&mut self, value: impl Into<ItemValue>) -> TreeResult<()> {
        match &mut self.node {
            ItemNode::Value(v) => {
                *v = value.into();
                Ok(())
            }
            _ => Err(self.type_mismatch("Value")),
        }
    }

    /// The document payload of an `Object` node.
    pub fn document(&self) -> TreeResult<&JsonValue> {
        match &self.node {
            ItemNode::Object(v) => Ok(v),
            _ => Err(self.type_mismatch("Object")),
        }
    }

    /// Replaces the document payload, requiring the Modify permission.
    pub fn set_document(&mut self, value: JsonValue) -> TreeResult<()> {
        self.permissions
            .check(EditPermission::MODIFY, self.kind().name())?;
        self.set_document_unchecked(value)
    }

    pub(crate) fn set_document_unchecked(&mut self, value: JsonValue) -> TreeResult<()> {
        match &mut self.node {
            ItemNode::Object(v) => {
                *v = value;
                Ok(())
            }
            _ => Err(self.type_mismatch("Object")),
        }
    }

    // ---- container surface ------------------------------------------------

    /// Number of children (0 for leaves).
    pub fn len(&self) -> usize {
        match &self.node {
            ItemNode::List(items) => items.len(),
            ItemNode::Dict(items) => items.len(),
            _ => 0,
        }
    }

    /// True when the node has no children (always true for leaves).
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Containment test by node identity (not by value equality).
    pub fn contains(&self, item: &ApiItem) -> bool {
        match &self.node {
            ItemNode::List(items) => items.iter().any(|child| std::ptr::eq(child, item)),
            ItemNode::Dict(items) => items.values().any(|child| std::ptr::eq(child, item)),
            _ => false,
        }
    }

    /// The dict key under which `item` is stored, by node identity.
    pub fn name_of(&self, item: &ApiItem) -> TreeResult<&str> {
        match &self.node {
            ItemNode::Dict(items) => items
                .iter()
                .find(|(_, child)| std::ptr::eq(*child, item))
                .map(|(key, _)| key.as_str())
                .ok_or(TreeError::ItemNotContained),
            _ => Err(self.type_mismatch("Dict")),
        }
    }

    /// The list index at which `item` is stored, by node identity.
    pub fn index_of(&self, item: &ApiItem) -> TreeResult<usize> {
        match &self.node {
            ItemNode::List(items) => items
                .iter()
                .position(|child| std::ptr::eq(child, item))
                .ok_or(TreeError::ItemNotContained),
            _ => Err(self.type_mismatch("List")),
        }
    }

    /// Child of a dict by key.
    pub fn get(&self, key: &str) -> TreeResult<&ApiItem> {
        match &self.node {
            ItemNode::Dict(items) => items
                .get(key)
                .ok_or_else(|| TreeError::KeyNotFound(key.to_owned())),
            _ => Err(self.type_mismatch("Dict")),
        }
    }

    /// Mutable child of a dict by key.
    pub fn get_mut(&mut self, key: &str) -> TreeResult<&mut ApiItem> {
        // Kind check first: the returned borrow lives for the whole call, so
        // the error path must not touch `self` after matching the node.
        let actual = self.kind().name();
        match &mut self.node {
            ItemNode::Dict(items) => items
                .get_mut(key)
                .ok_or_else(|| TreeError::KeyNotFound(key.to_owned())),
            _ => Err(TreeError::TypeMismatch {
                expected: "Dict",
                actual,
            }),
        }
    }

    /// True when a dict holds the given key.
    pub fn contains_key(&self, key: &str) -> bool {
        matches!(&self.node, ItemNode::Dict(items) if items.contains_key(key))
    }

    /// Child of a list by index.
    pub fn get_index(&self, index: usize) -> TreeResult<&ApiItem> {
        match &self.node {
            ItemNode::List(items) => items.get(index).ok_or(TreeError::IndexOutOfBounds {
                index,
                len: items.len(),
            }),
            _ => Err(self.type_mismatch("List")),
        }
    }

    /// Mutable child of a list by index.
    pub fn get_index_mut(&mut self, index: usize) -> TreeResult<&mut ApiItem> {
        let actual = self.kind().name();
        match &mut self.node {
            ItemNode::List(items) => {
                let len = items.len();
                items
                    .get_mut(index)
                    .ok_or(TreeError::IndexOutOfBounds { index, len })
            }
            _ => Err(TreeError::TypeMismatch {
                expected: "List",
                actual,
            }),
        }
    }

    /// Iterates a dict's entries (arbitrary order).
    pub fn entries(&self) -> TreeResult<impl Iterator<Item = (&str, &ApiItem)>> {
        match &self.node {
            ItemNode::Dict(items) => Ok(items.iter().map(|(k, v)| (k.as_str(), v))),
            _ => Err(self.type_mismatch("Dict")),
        }
    }

    /// Iterates a list's items in order.
    pub fn items(&self) -> TreeResult<impl Iterator<Item = &ApiItem>> {
        match &self.node {
            ItemNode::List(items) => Ok(items.iter()),
            _ => Err(self.type_mismatch("List")),
        }
    }

    // ---- container mutation -----------------------------------------------

    /// Inserts a child into a dict.
    ///
    /// Requires the dict's Modify permission and the child's Create
    /// permission; fails on duplicate keys.
    pub fn insert(&mut self, key: &str, item: ApiItem) -> TreeResult<()> {
        self.permissions.check(EditPermission::MODIFY, key)?;
        item.permissions.check(EditPermission::CREATE, key)?;
        self.insert_unchecked(key, item)
    }

    pub(crate) fn insert_unchecked(&mut self, key: &str, item: ApiItem) -> TreeResult<()> {
        match &mut self.node {
            ItemNode::Dict(items) => {
                if items.contains_key(key) {
                    return Err(TreeError::DuplicateKey(key.to_owned()));
                }
                items.insert(key.to_owned(), item);
                Ok(())
            }
            ItemNode::List(_) | ItemNode::Value(_) | ItemNode::Object(_) => {
                Err(self.type_mismatch("Dict"))
            }
        }
    }

    /// Inserts a default-valued node of `kind` into a dict and returns a
    /// mutable reference to it.
    pub fn insert_new(
        &mut self,
        key: &str,
        kind: ItemKind,
        permissions: EditPermission,
    ) -> TreeResult<&mut ApiItem> {
        self.insert(key, ApiItem::new_of_kind(kind, permissions))?;
        self.get_mut(key)
    }

    /// Inserts a deep copy of `item` into a dict.
    pub fn insert_copy(&mut self, key: &str, item: &ApiItem) -> TreeResult<()> {
        self.insert(key, item.create_copy())
    }

    /// Inserts a scalar child into a dict.
    pub fn insert_value(
        &mut self,
        key: &str,
        value: impl Into<ItemValue>,
        permissions: EditPermission,
    ) -> TreeResult<()> {
        self.insert(key, ApiItem::value(value, permissions))
    }

    /// Appends a child to a list.
    ///
    /// Requires the list's Modify permission and the child's Create
    /// permission.
    pub fn push(&mut self, item: ApiItem) -> TreeResult<()> {
        // Name the checks after the slot the item would land in.
        let index = self.len().to_string();
        self.permissions.check(EditPermission::MODIFY, &index)?;
        item.permissions.check(EditPermission::CREATE, &index)?;
        self.push_unchecked(item)
    }

    /// Appends a scalar child to a list.
    pub fn push_value(
        &mut self,
        value: impl Into<ItemValue>,
        permissions: EditPermission,
    ) -> TreeResult<()> {
        self.push(ApiItem::value(value, permissions))
    }

    pub(crate) fn push_unchecked(&mut self, item: ApiItem) -> TreeResult<()> {
        match &mut self.node {
            ItemNode::List(items) => {
                items.push(item);
                Ok(())
            }
            ItemNode::Dict(_) | ItemNode::Value(_) | ItemNode::Object(_) => {
                Err(self.type_mismatch("List"))
            }
        }
    }

    /// Removes a dict child by key, requiring the dict's Modify permission.
    pub fn remove(&mut self, key: &str) -> TreeResult<ApiItem> {
        self.permissions.check(EditPermission::MODIFY, key)?;
        match &mut self.node {
            ItemNode::Dict(items) => items
                .remove(key)
                .ok_or_else(|| TreeError::KeyNotFound(key.to_owned())),
            ItemNode::List(_) | ItemNode::Value(_) | ItemNode::Object(_) => {
                Err(self.type_mismatch("Dict"))
            }
        }
    }

    /// Removes a list child by index, requiring the list's Modify permission.
    pub fn remove_index(&mut self, index: usize) -> TreeResult<ApiItem> {
        self.permissions
            .check(EditPermission::MODIFY, &index.to_string())?;
        match &mut self.node {
            ItemNode::List(items) => {
                if index >= items.len() {
                    return Err(TreeError::IndexOutOfBounds {
                        index,
                        len: items.len(),
                    });
                }
                Ok(items.remove(index))
            }
            ItemNode::Dict(_) | ItemNode::Value(_) | ItemNode::Object(_) => {
                Err(self.type_mismatch("List"))
            }
        }
    }

    /// Removes all children, requiring the container's Modify permission.
    pub fn clear(&mut self) -> TreeResult<()> {
        self.permissions
            .check(EditPermission::MODIFY, self.kind().name())?;
        self.clear_unchecked()
    }

    pub(crate) fn clear_unchecked(&mut self) -> TreeResult<()> {
        match &mut self.node {
            ItemNode::List(items) => {
                items.clear();
                Ok(())
            }
            ItemNode::Dict(items) => {
                items.clear();
                Ok(())
            }
            _ => Err(self.type_mismatch("List")),
        }
    }

    // ---- copy & merge -----------------------------------------------------

    /// A deep copy of this node and its whole subtree.
    ///
    /// The copy shares no state with the source; containers recursively copy
    /// all children into new containers.
    pub fn create_copy(&self) -> ApiItem {
        self.clone()
    }

    /// Merges `other` into this node.
    ///
    /// * `Value`/`Object`: the payload is replaced.
    /// * `Dict`: keys present in both are merged recursively, keys only in
    ///   `other` are inserted as copies, keys absent from `other` are left
    ///   untouched.
    /// * `List`: lists have no stable identity key, so the contents are
    ///   cleared and rebuilt as copies of `other`'s items in order.
    ///
    /// Permission checks fire on every touched node against its *effective*
    /// permission: the node's declared bits intersected with `inherited`,
    /// which carries the intersection of every ancestor above the merge
    /// target. Callers merging at a tree root pass [`EditPermission::ALL`].
    pub fn update_from(&mut self, other: &ApiItem, inherited: EditPermission) -> TreeResult<()> {
        self.update_from_inner(other, Some(inherited), "")
    }

    /// Checked merge that names the target in permission errors, for
    /// path-addressed callers.
    pub(crate) fn update_from_named(
        &mut self,
        other: &ApiItem,
        inherited: EditPermission,
        name: &str,
    ) -> TreeResult<()> {
        self.update_from_inner(other, Some(inherited), name)
    }

    fn update_from_inner(
        &mut self,
        other: &ApiItem,
        inherited: Option<EditPermission>,
        name: &str,
    ) -> TreeResult<()> {
        // `None` disables checking; `Some` carries the ancestor intersection.
        let effective = inherited.map(|inherited| inherited & self.permissions);
        if let Some(effective) = effective {
            let target = if name.is_empty() {
                self.kind().name()
            } else {
                name
            };
            effective.check(EditPermission::MODIFY, target)?;
        }
        match (self.kind(), other.kind()) {
            (ItemKind::Value, ItemKind::Value) => {
                self.set_scalar_unchecked(other.scalar()?.clone())
            }
            (ItemKind::Object, ItemKind::Object) => {
                self.set_document_unchecked(other.document()?.clone())
            }
            (ItemKind::List, ItemKind::List) => {
                self.clear_unchecked()?;
                for (index, item) in other.items()?.enumerate() {
                    if let Some(effective) = effective {
                        (item.permissions & effective)
                            .check(EditPermission::CREATE, &format!("{name}.{index}"))?;
                    }
                    self.push_unchecked(item.create_copy())?;
                }
                Ok(())
            }
            (ItemKind::Dict, ItemKind::Dict) => {
                for (key, src_item) in other.entries()? {
                    let child_name = format!("{name}.{key}");
                    if self.contains_key(key) {
                        self.get_mut(key)?
                            .update_from_inner(src_item, effective, &child_name)?;
                    } else {
                        if let Some(effective) = effective {
                            (src_item.permissions & effective)
                                .check(EditPermission::CREATE, &child_name)?;
                        }
                        self.insert_unchecked(key, src_item.create_copy())?;
                    }
                }
                Ok(())
            }
            (expected, actual) => Err(TreeError::TypeMismatch {
                expected: expected.name(),
                actual: actual.name(),
            }),
        }
    }

    // ---- JSON -------------------------------------------------------------

    /// The JSON representation of this subtree.
    pub fn to_json(&self) -> JsonValue {
        match &self.node {
            ItemNode::Value(v) => v.to_json(),
            ItemNode::Object(v) => v.clone(),
            ItemNode::List(items) => {
                JsonValue::Array(items.iter().map(ApiItem::to_json).collect())
            }
            ItemNode::Dict(items) => JsonValue::Object(
                items
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }

    /// Builds an item tree from JSON without schema validation: objects
    /// become dicts, arrays become lists, scalars become values. Every node
    /// gets `permissions`.
    ///
    /// Schema-aware parsing (target kinds and per-path permissions) lives on
    /// the resource layer.
    pub fn from_json(value: &JsonValue, permissions: EditPermission) -> TreeResult<ApiItem> {
        match value {
            JsonValue::Object(map) => {
                let mut dict = ApiItem::dict(permissions);
                for (key, child) in map {
                    dict.insert_unchecked(key, ApiItem::from_json(child, permissions)?)?;
                }
                Ok(dict)
            }
            JsonValue::Array(values) => {
                let mut list = ApiItem::list(permissions);
                for child in values {
                    list.push_unchecked(ApiItem::from_json(child, permissions)?)?;
                }
                Ok(list)
            }
            scalar => Ok(ApiItem::value(ItemValue::from_json(scalar)?, permissions)),
        }
    }

    /// Parses raw JSON text into an item tree.
    pub fn parse_json(text: &str, permissions: EditPermission) -> TreeResult<ApiItem> {
        let value: JsonValue =
            serde_json::from_str(text).map_err(|e| TreeError::JsonParse(e.to_string()))?;
        ApiItem::from_json(&value, permissions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sample_dict() -> ApiItem {
        let mut dict = ApiItem::dict(EditPermission::ALL);
        dict.insert_value("name", "alice", EditPermission::ALL)
            .unwrap();
        dict.insert_value("age", 30i64, EditPermission::ALL).unwrap();
        dict
    }

    #[test]
    fn factory_builds_default_nodes() {
        let item = ApiItem::new_of_kind(ItemKind::Value, EditPermission::ALL);
        assert_eq!(item.scalar().unwrap(), &ItemValue::Null);

        let item = ApiItem::new_of_kind(ItemKind::Dict, EditPermission::ALL);
        assert_eq!(item.kind(), ItemKind::Dict);
        assert!(item.is_empty());
    }

    #[test]
    fn read_only_value_rejects_writes() {
        let mut item = ApiItem::value("fixed", EditPermission::NONE);
        let err = item.set_scalar("changed").unwrap_err();
        assert!(matches!(err, TreeError::MissingPermissions { .. }));
        // The payload is untouched.
        assert_eq!(item.scalar().unwrap(), &ItemValue::from("fixed"));
    }

    #[test]
    fn insert_requires_parent_modify_and_child_create() {
        let mut locked = ApiItem::dict(EditPermission::NONE);
        let err = locked
            .insert("k", ApiItem::value(1i64, EditPermission::ALL))
            .unwrap_err();
        assert!(matches!(err, TreeError::MissingPermissions { .. }));

        let mut open = ApiItem::dict(EditPermission::ALL);
        let err = open
            .insert("k", ApiItem::value(1i64, EditPermission::MODIFY))
            .unwrap_err();
        assert!(matches!(err, TreeError::MissingPermissions { .. }));
    }

    #[test]
    fn container_permission_errors_name_the_key() {
        let mut locked = ApiItem::dict(EditPermission::CREATE);
        let err = locked
            .insert("email", ApiItem::value("x", EditPermission::ALL))
            .unwrap_err();
        assert!(err.to_string().contains("email"), "error was: {err}");

        let mut dict = sample_dict();
        dict.set_permissions(EditPermission::CREATE);
        let err = dict.remove("name").unwrap_err();
        assert!(err.to_string().contains("name"), "error was: {err}");

        let mut list = ApiItem::list(EditPermission::ALL);
        list.push_value("a", EditPermission::ALL).unwrap();
        list.push_value("b", EditPermission::ALL).unwrap();
        list.set_permissions(EditPermission::CREATE);
        let err = list.remove_index(1).unwrap_err();
        assert!(err.to_string().contains('1'), "error was: {err}");
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let mut dict = sample_dict();
        let err = dict
            .insert("name", ApiItem::value("bob", EditPermission::ALL))
            .unwrap_err();
        assert!(matches!(err, TreeError::DuplicateKey(k) if k == "name"));
    }

    #[test]
    fn identity_lookups() {
        let dict = sample_dict();
        let child = dict.get("name").unwrap();
        assert!(dict.contains(child));
        assert_eq!(dict.name_of(child).unwrap(), "name");

        let other = ApiItem::value("alice", EditPermission::ALL);
        // Equal payload, different node.
        assert!(!dict.contains(&other));
        assert!(matches!(
            dict.name_of(&other).unwrap_err(),
            TreeError::ItemNotContained
        ));
    }

    #[test]
    fn list_index_lookups() {
        let mut list = ApiItem::list(EditPermission::ALL);
        list.push_value(1i64, EditPermission::ALL).unwrap();
        list.push_value(2i64, EditPermission::ALL).unwrap();

        let second = list.get_index(1).unwrap();
        assert_eq!(list.index_of(second).unwrap(), 1);

        let err = list.get_index(5).unwrap_err();
        assert!(matches!(
            err,
            TreeError::IndexOutOfBounds { index: 5, len: 2 }
        ));
    }

    #[test]
    fn mutable_lookups_reject_wrong_kinds() {
        let mut value = ApiItem::value(1i64, EditPermission::ALL);
        assert!(matches!(
            value.get_mut("k").unwrap_err(),
            TreeError::TypeMismatch {
                expected: "Dict",
                actual: "Value"
            }
        ));
        assert!(matches!(
            value.get_index_mut(0).unwrap_err(),
            TreeError::TypeMismatch {
                expected: "List",
                actual: "Value"
            }
        ));
    }

    #[test]
    fn copy_is_isolated_from_source() {
        let original = ApiItem::object(json!({"nested": {"n": 1}}), EditPermission::ALL);
        let mut copy = original.create_copy();
        copy.set_document(json!({"nested": {"n": 99}})).unwrap();
        assert_eq!(original.document().unwrap(), &json!({"nested": {"n": 1}}));
        assert_eq!(copy.document().unwrap(), &json!({"nested": {"n": 99}}));
    }

    #[test]
    fn container_copy_is_deep() {
        let source = sample_dict();
        let mut copy = source.create_copy();
        copy.get_mut("name").unwrap().set_scalar("bob").unwrap();
        assert_eq!(
            source.get("name").unwrap().scalar().unwrap(),
            &ItemValue::from("alice")
        );
    }

    #[test]
    fn dict_merge_keeps_unmentioned_keys() {
        let mut target = sample_dict();
        let mut patch = ApiItem::dict(EditPermission::ALL);
        patch
            .insert("age", ApiItem::value(31i64, EditPermission::ALL))
            .unwrap();

        target.update_from(&patch, EditPermission::ALL).unwrap();
        assert_eq!(
            target.get("age").unwrap().scalar().unwrap(),
            &ItemValue::Long(31)
        );
        // "name" was not in the patch and survives.
        assert_eq!(
            target.get("name").unwrap().scalar().unwrap(),
            &ItemValue::from("alice")
        );
    }

    #[test]
    fn merge_intersects_inherited_permissions() {
        let mut target = sample_dict();
        let mut patch = ApiItem::dict(EditPermission::ALL);
        patch
            .insert_value("age", 31i64, EditPermission::ALL)
            .unwrap();

        // Every node declares ALL, but the ancestors above the merge target
        // only granted Create, so the merge must be rejected.
        let err = target
            .update_from(&patch, EditPermission::CREATE)
            .unwrap_err();
        assert!(matches!(err, TreeError::MissingPermissions { .. }));
        assert_eq!(
            target.get("age").unwrap().scalar().unwrap(),
            &ItemValue::Long(30)
        );
    }

    #[test]
    fn list_merge_replaces_contents() {
        let mut target = ApiItem::list(EditPermission::ALL);
        target.push(ApiItem::value(1i64, EditPermission::ALL)).unwrap();
        target.push(ApiItem::value(2i64, EditPermission::ALL)).unwrap();

        let mut source = ApiItem::list(EditPermission::ALL);
        source.push(ApiItem::value(9i64, EditPermission::ALL)).unwrap();

        target.update_from(&source, EditPermission::ALL).unwrap();
        assert_eq!(target.to_json(), json!([9]));
    }

    #[test]
    fn merge_rejects_kind_mismatch() {
        let mut dict = sample_dict();
        let list = ApiItem::list(EditPermission::ALL);
        assert!(matches!(
            dict.update_from(&list, EditPermission::ALL).unwrap_err(),
            TreeError::TypeMismatch { .. }
        ));
    }

    #[test]
    fn json_round_trip() {
        let input = json!({"a": 1, "b": [true, null, "x"]});
        let tree = ApiItem::from_json(&input, EditPermission::ALL).unwrap();
        assert_eq!(tree.to_json(), input);
    }

    #[test]
    fn parse_json_reports_syntax_errors() {
        let err = ApiItem::parse_json("{not json", EditPermission::ALL).unwrap_err();
        assert!(matches!(err, TreeError::JsonParse(_)));
    }
}
