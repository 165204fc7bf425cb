//! restree-core - Permission-checked item trees for REST resource servers
//!
//! This crate provides the data-model half of the framework: addressable
//! item trees with per-node edit permissions, property schemas, JSON
//! round-tripping and query-parameter filtering. The HTTP-facing half
//! (routing, dispatch, resource managers) lives in `restree-api`.

pub mod error;
pub mod filter;
pub mod item;
pub mod path;
pub mod permission;
pub mod resource;
pub mod schema;
pub mod value;

pub use error::{TreeError, TreeResult};
pub use filter::{filter_resources, parse_filters, FilterOperator, ValueFilter};
pub use item::{ApiItem, ItemKind};
pub use path::{PropertyPath, PATH_SEPARATOR};
pub use permission::EditPermission;
pub use resource::ApiResource;
pub use schema::{PropertyInfo, ResourceSchema, LIST_WILDCARD};
pub use value::ItemValue;
