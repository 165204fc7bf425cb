//! API error types and status mapping
//!
//! Every domain error carries an explicit HTTP status; the dispatcher is the
//! single place where errors become responses. The wire format for errors is
//! a plain JSON-encoded string, not a structured object.

use restree_core::TreeError;
use thiserror::Error;

use crate::response::ApiResponse;

/// Result type for request handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors a request handler can surface to the dispatcher.
#[derive(Debug, Error)]
pub enum ApiError {
    /// 404 — no registered endpoint matched the request
    #[error("No endpoint found for route: '{0}'")]
    EndpointNotFound(String),

    /// 404 — a resource id or sub-path didn't resolve
    #[error("Resource '{0}' not found")]
    ResourceNotFound(String),

    /// 404 — free-form not-found condition
    #[error("{0}")]
    NotFound(String),

    /// 400 — the handler requires a request body
    #[error("Request body cannot be empty.")]
    EmptyRequestBody,

    /// 400 — a required query parameter is absent
    #[error("Missing query parameter '{0}'")]
    MissingQueryParameter(String),

    /// 400 — free-form client error
    #[error("{0}")]
    BadRequest(String),

    /// 403 — caller rejected by policy
    #[error("{0}")]
    Forbidden(String),

    /// 405 — the resource manager doesn't implement this verb
    #[error("Method '{0}' is not implemented for this resource")]
    MethodNotImplemented(&'static str),

    /// 500 — unexpected failure inside a handler
    #[error("{0}")]
    Internal(String),

    /// Tree-layer error; status depends on the variant
    #[error(transparent)]
    Tree(#[from] TreeError),
}

impl ApiError {
    /// The HTTP status this error maps to.
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::EndpointNotFound(_)
            | ApiError::ResourceNotFound(_)
            | ApiError::NotFound(_) => 404,
            ApiError::EmptyRequestBody
            | ApiError::MissingQueryParameter(_)
            | ApiError::BadRequest(_) => 400,
            ApiError::Forbidden(_) => 403,
            ApiError::MethodNotImplemented(_) => 405,
            ApiError::Internal(_) => 500,
            ApiError::Tree(err) => match err {
                TreeError::MissingPermissions { .. } => 403,
                TreeError::KeyNotFound(_)
                | TreeError::IndexOutOfBounds { .. }
                | TreeError::ItemNotContained => 404,
                TreeError::TypeMismatch { .. }
                | TreeError::DuplicateKey(_)
                | TreeError::InvalidSegment(_)
                | TreeError::InvalidIndex(_)
                | TreeError::PropertyNotDefined(_)
                | TreeError::PropertyAlreadyExists(_)
                | TreeError::JsonParse(_)
                | TreeError::NotComparable(_) => 400,
                // Deserialize-stage failures are on us, not the client.
                TreeError::JsonData(_) => 500,
            },
        }
    }

    /// Converts the error into its wire response: the declared status plus a
    /// JSON-string body. Server errors are logged loudly, client errors
    /// quietly.
    pub fn to_response(&self) -> ApiResponse {
        let status = self.status_code();
        let message = self.to_string();
        if status >= 500 {
            tracing::error!(status, %message, "request failed");
        } else {
            tracing::debug!(status, %message, "request rejected");
        }
        ApiResponse::new(status, serde_json::Value::String(message).to_string())
    }
}
