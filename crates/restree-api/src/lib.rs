//! restree-api - Endpoint routing, dispatch and CRUD managers
//!
//! This crate is the HTTP-facing half of the framework: endpoint patterns
//! with placeholder matching, the request dispatcher, the CRUD resource
//! manager, and the TCP transport binding. The item-tree data model lives
//! in `restree-core`.
//!
//! # Usage
//!
//! ```ignore
//! use restree_api::{ApiEndpoint, ApiResponse, ApiServer, HttpServer};
//!
//! let api = ApiServer::new("/api");
//! api.register_handler(ApiEndpoint::new("GET", "/ping"), |_req| async {
//!     ApiResponse::ok(&"pong")
//! })?;
//!
//! let mut server = HttpServer::new(api);
//! server.start("127.0.0.1:8080".parse()?).await?;
//! ```

pub mod endpoint;
pub mod error;
pub mod manager;
pub mod request;
pub mod response;
pub mod serve;
pub mod server;

pub use endpoint::ApiEndpoint;
pub use error::{ApiError, ApiResult};
pub use manager::{ResourceHooks, ResourceManager, ResourceMethods};
pub use request::ApiRequest;
pub use response::ApiResponse;
pub use serve::HttpServer;
pub use server::{ApiServer, BoxHandler, HandlerFuture};
