//! Resource schemas
//!
//! A [`ResourceSchema`] maps property paths to the item kind and edit
//! permissions allowed at that location. Schemas are pure metadata shared by
//! every instance of a resource type; they are built once at registration
//! time and passed around behind an `Arc`.
//!
//! List positions are declared with the [`LIST_WILDCARD`] segment: the entry
//! `.tags.#` describes every element of the `.tags` list.

use std::collections::BTreeMap;

use crate::error::{TreeError, TreeResult};
use crate::item::ItemKind;
use crate::path::PropertyPath;
use crate::permission::EditPermission;

/// Schema segment standing for "any index" below a list entry.
pub const LIST_WILDCARD: &str = "#";

/// Kind and permissions declared for one property path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyInfo {
    /// Payload shape required at this path
    pub kind: ItemKind,
    /// Declared (not effective) edit permissions
    pub permissions: EditPermission,
}

impl PropertyInfo {
    /// Convenience constructor.
    pub fn new(kind: ItemKind, permissions: EditPermission) -> Self {
        PropertyInfo { kind, permissions }
    }
}

/// Path-keyed property metadata for one resource type.
///
/// The root path is implicitly declared as a fully-permitted `Dict` and can
/// be overridden with an explicit entry for the empty full path.
///
/// ```
/// use restree_core::item::ItemKind;
/// use restree_core::path::PropertyPath;
/// use restree_core::permission::EditPermission;
/// use restree_core::schema::ResourceSchema;
///
/// let schema = ResourceSchema::new()
///     .define(".name", ItemKind::Value, EditPermission::CREATE_MODIFY)
///     .define(".tags", ItemKind::List, EditPermission::ALL)
///     .define(".tags.#", ItemKind::Value, EditPermission::ALL);
///
/// let info = schema.lookup(&PropertyPath::from_full_path(".tags.2")).unwrap();
/// assert_eq!(info.kind, ItemKind::Value);
/// ```
#[derive(Debug, Clone)]
pub struct ResourceSchema {
    root: PropertyInfo,
    // Length-then-lexicographic key order keeps iteration least-specific
    // first, so ancestors always precede their descendants.
    entries: BTreeMap<PropertyPath, PropertyInfo>,
}

impl ResourceSchema {
    /// An empty schema: just the implicit root entry.
    pub fn new() -> Self {
        ResourceSchema {
            root: PropertyInfo::new(ItemKind::Dict, EditPermission::ALL),
            entries: BTreeMap::new(),
        }
    }

    /// Declares (or overrides) the entry at `full_path`.
    ///
    /// The empty path addresses the root entry. List element entries use the
    /// `#` wildcard segment, e.g. `.tags.#`.
    pub fn define(
        mut self,
        full_path: &str,
        kind: ItemKind,
        permissions: EditPermission,
    ) -> Self {
        let path = PropertyPath::from_full_path(full_path);
        let info = PropertyInfo::new(kind, permissions);
        if path.is_root() {
            self.root = info;
        } else {
            self.entries.insert(path, info);
        }
        self
    }

    /// The root entry.
    pub fn root_info(&self) -> PropertyInfo {
        self.root
    }

    /// Resolves the entry governing a concrete path.
    ///
    /// Descends entry by entry; whenever the governing entry is a list, the
    /// concrete index segment is canonicalized to the `#` wildcard before the
    /// next lookup. Returns `None` as soon as a segment has no entry.
    pub fn lookup(&self, path: &PropertyPath) -> Option<PropertyInfo> {
        let mut canonical = PropertyPath::root();
        let mut info = self.root;
        for segment in path.key_segments() {
            let schema_segment = if info.kind == ItemKind::List {
                LIST_WILDCARD
            } else {
                segment.as_str()
            };
            canonical = canonical.try_append(schema_segment).ok()?;
            info = *self.entries.get(&canonical)?;
        }
        Some(info)
    }

    /// Like [`lookup`](ResourceSchema::lookup) but failing with
    /// [`TreeError::PropertyNotDefined`] on unknown paths.
    pub fn require(&self, path: &PropertyPath) -> TreeResult<PropertyInfo> {
        self.lookup(path)
            .ok_or_else(|| TreeError::PropertyNotDefined(path.full_path().to_owned()))
    }

    /// All explicit entries, least-specific path first.
    pub fn entries(&self) -> impl Iterator<Item = (&PropertyPath, &PropertyInfo)> {
        self.entries.iter()
    }
}

impl Default for ResourceSchema {
    fn default() -> Self {
        ResourceSchema::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn contact_schema() -> ResourceSchema {
        ResourceSchema::new()
            .define(".name", ItemKind::Value, EditPermission::CREATE_MODIFY)
            .define(".address", ItemKind::Dict, EditPermission::ALL)
            .define(".address.city", ItemKind::Value, EditPermission::ALL)
            .define(".tags", ItemKind::List, EditPermission::ALL)
            .define(".tags.#", ItemKind::Value, EditPermission::ALL)
    }

    #[test]
    fn root_is_implicitly_a_dict() {
        let schema = ResourceSchema::new();
        let info = schema.lookup(&PropertyPath::root()).unwrap();
        assert_eq!(info.kind, ItemKind::Dict);
        assert_eq!(info.permissions, EditPermission::ALL);
    }

    #[test]
    fn root_can_be_overridden() {
        let schema = ResourceSchema::new().define("", ItemKind::List, EditPermission::MODIFY);
        let info = schema.root_info();
        assert_eq!(info.kind, ItemKind::List);
        assert_eq!(info.permissions, EditPermission::MODIFY);
    }

    #[test]
    fn nested_lookup_follows_entries() {
        let schema = contact_schema();
        let info = schema
            .lookup(&PropertyPath::from_full_path(".address.city"))
            .unwrap();
        assert_eq!(info.kind, ItemKind::Value);
    }

    #[test]
    fn list_indices_canonicalize_to_the_wildcard() {
        let schema = contact_schema();
        for index in ["0", "7", "1000"] {
            let path = PropertyPath::root().append("tags").append(index);
            let info = schema.lookup(&path).unwrap();
            assert_eq!(info.kind, ItemKind::Value);
        }
    }

    #[test]
    fn unknown_paths_resolve_to_none() {
        let schema = contact_schema();
        assert!(schema
            .lookup(&PropertyPath::from_full_path(".nope"))
            .is_none());
        assert!(schema
            .lookup(&PropertyPath::from_full_path(".address.street"))
            .is_none());

        let err = schema
            .require(&PropertyPath::from_full_path(".nope"))
            .unwrap_err();
        assert!(matches!(err, TreeError::PropertyNotDefined(p) if p == ".nope"));
    }
}
