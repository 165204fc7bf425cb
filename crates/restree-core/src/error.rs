//! Common error types for the item tree layer

use thiserror::Error;

use crate::permission::EditPermission;

/// Result type for tree operations
pub type TreeResult<T> = Result<T, TreeError>;

/// Errors that can occur while building or mutating an item tree.
///
/// These are transport-agnostic; the API layer maps them onto HTTP
/// status codes.
#[derive(Debug, Error)]
pub enum TreeError {
    /// An edit was attempted without the required permissions
    #[error("Item '{item}' is missing permissions: {missing}")]
    MissingPermissions {
        /// Name/path of the item that rejected the edit
        item: String,
        /// The permission bits that were required but absent
        missing: EditPermission,
    },

    /// An operation expected a different item variant
    #[error("Can't apply operation for {expected} items to a {actual} item")]
    TypeMismatch {
        /// Variant the operation is defined for
        expected: &'static str,
        /// Variant it was invoked on
        actual: &'static str,
    },

    /// A container operation targeted an item the container doesn't hold
    #[error("Container doesn't contain the referenced item")]
    ItemNotContained,

    /// Dict lookup with an unknown key
    #[error("Dict doesn't contain an item with key '{0}'")]
    KeyNotFound(String),

    /// Dict insertion with an already-present key
    #[error("Dict already contains an item with key '{0}'")]
    DuplicateKey(String),

    /// List lookup past the end
    #[error("List index {index} is out of bounds (len {len})")]
    IndexOutOfBounds {
        /// Requested index
        index: usize,
        /// Current list length
        len: usize,
    },

    /// A property path segment contained the separator character
    #[error("Path segment '{0}' can't contain the '.' separator")]
    InvalidSegment(String),

    /// A path segment addressing into a list was not a valid index
    #[error("List segment '{0}' is not a valid index")]
    InvalidIndex(String),

    /// A property path has no entry in the resource schema
    #[error("Property '{0}' is not defined by the resource schema")]
    PropertyNotDefined(String),

    /// Create was asked to build a property that already exists
    #[error("Property '{0}' already exists")]
    PropertyAlreadyExists(String),

    /// Raw JSON text could not be parsed
    #[error("Failed to parse JSON: {0}")]
    JsonParse(String),

    /// Parsed JSON could not be converted into the expected shape
    #[error("Failed to convert JSON data: {0}")]
    JsonData(String),

    /// A filter comparison was attempted on a non-comparable value kind
    #[error("Filtering is not defined for {0} values")]
    NotComparable(&'static str),
}

impl TreeError {
    /// Shorthand used by permission checks throughout the tree.
    pub(crate) fn missing_permissions(
        item: impl Into<String>,
        missing: EditPermission,
    ) -> Self {
        TreeError::MissingPermissions {
            item: item.into(),
            missing,
        }
    }
}
