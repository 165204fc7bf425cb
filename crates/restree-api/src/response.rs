//! The transport-agnostic response model

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::error::{ApiError, ApiResult};

/// Status code plus optional JSON body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    status: u16,
    content: Option<String>,
}

impl ApiResponse {
    /// A response with a pre-serialized JSON body.
    pub fn new(status: u16, content: impl Into<String>) -> Self {
        ApiResponse {
            status,
            content: Some(content.into()),
        }
    }

    /// A bodyless response.
    pub fn status_only(status: u16) -> Self {
        ApiResponse {
            status,
            content: None,
        }
    }

    /// Serializes `value` as the JSON body of a response with `status`.
    pub fn json<T: Serialize>(status: u16, value: &T) -> ApiResult<Self> {
        let content = serde_json::to_string(value)
            .map_err(|e| ApiError::Internal(format!("Failed to serialize response: {e}")))?;
        Ok(ApiResponse::new(status, content))
    }

    /// `200 OK` with a JSON body.
    pub fn ok<T: Serialize>(value: &T) -> ApiResult<Self> {
        ApiResponse::json(200, value)
    }

    /// `204 No Content`.
    pub fn no_content() -> Self {
        ApiResponse::status_only(204)
    }

    /// The status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// The body text, if any.
    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        match self.content {
            Some(body) => (
                status,
                [(header::CONTENT_TYPE, "application/json")],
                body,
            )
                .into_response(),
            None => status.into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn json_bodies_are_serialized() {
        let response = ApiResponse::ok(&json!({"pong": true})).unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(response.content(), Some(r#"{"pong":true}"#));
    }

    #[test]
    fn no_content_has_no_body() {
        let response = ApiResponse::no_content();
        assert_eq!(response.status(), 204);
        assert_eq!(response.content(), None);
    }
}
