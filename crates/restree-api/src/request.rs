//! The transport-agnostic request model
//!
//! The dispatcher hands every handler an [`ApiRequest`]: method, path,
//! extracted placeholder arguments, parsed query parameters, selected
//! headers and the optional body text. Handlers never see the transport.

use serde::de::DeserializeOwned;

use crate::error::{ApiError, ApiResult};

/// One dispatched request, as seen by a handler.
#[derive(Debug, Clone, Default)]
pub struct ApiRequest {
    method: String,
    path: String,
    arguments: Vec<String>,
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    body: Option<String>,
}

impl ApiRequest {
    /// Builds a request from its transport-level parts. The query string is
    /// the raw (still percent-encoded) text after `?`, or empty.
    pub fn new(
        method: impl Into<String>,
        path: impl Into<String>,
        query_string: &str,
        headers: Vec<(String, String)>,
        body: Option<String>,
    ) -> Self {
        ApiRequest {
            method: method.into(),
            path: path.into(),
            arguments: Vec::new(),
            query: parse_query(query_string),
            headers,
            body,
        }
    }

    pub(crate) fn set_arguments(&mut self, arguments: Vec<String>) {
        self.arguments = arguments;
    }

    /// The HTTP method.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The request path (base route already stripped).
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Placeholder values extracted by the matched endpoint, in declaration
    /// order.
    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    /// All query parameters, decoded, in wire order.
    pub fn query_params(&self) -> &[(String, String)] {
        &self.query
    }

    /// First value of a query parameter.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// A query parameter that must be present.
    pub fn require_query(&self, key: &str) -> ApiResult<&str> {
        self.query_value(key)
            .ok_or_else(|| ApiError::MissingQueryParameter(key.to_owned()))
    }

    /// Removes a query parameter and deserializes its first value as JSON.
    ///
    /// Returns `Ok(None)` when the parameter is absent; a present but
    /// unparseable value is a 400. Useful for control parameters that should
    /// not reach the filter machinery.
    pub fn take_json<T: DeserializeOwned>(&mut self, key: &str) -> ApiResult<Option<T>> {
        let Some(position) = self.query.iter().position(|(k, _)| k == key) else {
            return Ok(None);
        };
        let (_, value) = self.query.remove(position);
        serde_json::from_str(&value)
            .map(Some)
            .map_err(|e| ApiError::BadRequest(format!("Invalid value for parameter '{key}': {e}")))
    }

    /// First value of a header, by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The body text, if any was sent.
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// The body text, rejecting absent or blank bodies with the documented
    /// 400 error.
    pub fn require_body(&self) -> ApiResult<&str> {
        match self.body.as_deref() {
            Some(body) if !body.trim().is_empty() => Ok(body),
            _ => Err(ApiError::EmptyRequestBody),
        }
    }

    /// Deserializes the (required) body as JSON.
    pub fn json_body<T: DeserializeOwned>(&self) -> ApiResult<T> {
        let body = self.require_body()?;
        serde_json::from_str(body)
            .map_err(|e| ApiError::BadRequest(format!("Failed to parse JSON body: {e}")))
    }
}

fn parse_query(query_string: &str) -> Vec<(String, String)> {
    url::form_urlencoded::parse(query_string.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn request(query: &str, body: Option<&str>) -> ApiRequest {
        ApiRequest::new("GET", "/contacts", query, Vec::new(), body.map(str::to_owned))
    }

    #[test]
    fn query_parameters_are_decoded() {
        let request = request("name=~eq~%22alice%22&age=~gt~21", None);
        assert_eq!(request.query_value("name"), Some("~eq~\"alice\""));
        assert_eq!(request.query_value("age"), Some("~gt~21"));
        assert_eq!(request.query_value("missing"), None);
    }

    #[test]
    fn require_query_reports_the_key() {
        let request = request("", None);
        let err = request.require_query("filter").unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(err.to_string().contains("filter"));
    }

    #[test]
    fn blank_bodies_are_rejected() {
        for body in [None, Some(""), Some("   \n")] {
            let err = request("", body).require_body().unwrap_err();
            assert_eq!(err.to_string(), "Request body cannot be empty.");
        }
        assert!(request("", Some("{}")).require_body().is_ok());
    }

    #[test]
    fn json_body_deserializes() {
        let good = request("", Some(r#"{"a": 1}"#));
        let value: serde_json::Value = good.json_body().unwrap();
        assert_eq!(value["a"], 1);

        let bad = request("", Some("{nope"));
        let err = bad.json_body::<serde_json::Value>().unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn take_json_pops_the_parameter() {
        let mut req = request("limit=25&name=alice", None);
        let limit: Option<u32> = req.take_json("limit").unwrap();
        assert_eq!(limit, Some(25));
        // The popped parameter is gone, the rest stays.
        assert_eq!(req.query_value("limit"), None);
        assert_eq!(req.query_value("name"), Some("alice"));

        let absent: Option<u32> = req.take_json("limit").unwrap();
        assert_eq!(absent, None);

        let mut req = request("limit=zzz", None);
        assert!(req.take_json::<u32>("limit").is_err());
    }

    #[test]
    fn headers_match_case_insensitively() {
        let request = ApiRequest::new(
            "GET",
            "/",
            "",
            vec![("User-Agent".to_owned(), "restree-test".to_owned())],
            None,
        );
        assert_eq!(request.header("user-agent"), Some("restree-test"));
    }
}
