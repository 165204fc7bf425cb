//! Endpoint patterns and route matching
//!
//! An [`ApiEndpoint`] is a (method, route) pattern. Route segments are
//! either literals, single placeholders (`{name}` — matches exactly one
//! segment), or one trailing greedy placeholder (`{...}` — matches the rest
//! of the path, including zero segments). Percent-encoded brace forms are
//! accepted so patterns survive URL-encoding clients.

use std::fmt;

use crate::error::{ApiError, ApiResult};

const GREEDY_PLACEHOLDER: &str = "{...}";

/// One registered route pattern.
#[derive(Debug, Clone)]
pub struct ApiEndpoint {
    method: String,
    route: String,
    segments: Vec<String>,
}

impl ApiEndpoint {
    /// Creates an endpoint for `method` and `route`.
    ///
    /// Leading and trailing separators in the route are ignored, so `/a/b`,
    /// `a/b` and `a/b/` declare the same pattern.
    pub fn new(method: impl Into<String>, route: impl Into<String>) -> Self {
        let method = method.into();
        let route = route.into();
        let segments = split_segments(&route)
            .into_iter()
            .map(decode_braces)
            .collect();
        ApiEndpoint {
            method,
            route,
            segments,
        }
    }

    /// The declared HTTP method.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The declared route string, as given.
    pub fn route(&self) -> &str {
        &self.route
    }

    /// Whether this endpoint matches the request.
    ///
    /// In exact mode every segment must be byte-identical to the declared
    /// pattern (placeholders have no special meaning); in placeholder mode
    /// single placeholders match any one segment and a trailing greedy
    /// placeholder matches the whole remainder. Methods compare
    /// case-insensitively in both modes.
    pub fn matches(&self, method: &str, path: &str, exact: bool) -> bool {
        if !self.method.eq_ignore_ascii_case(method) {
            return false;
        }

        let target = split_segments(path);
        let declared_len = self.segments.len();
        let greedy_tail = !exact
            && declared_len > 0
            && is_greedy_placeholder(&self.segments[declared_len - 1]);
        if greedy_tail {
            if target.len() + 1 < declared_len {
                return false;
            }
        } else if target.len() != declared_len {
            return false;
        }

        for (declared, actual) in self.segments.iter().zip(target.iter()) {
            if !exact {
                if is_greedy_placeholder(declared) {
                    // Everything from here on belongs to the greedy match.
                    return true;
                }
                if is_single_placeholder(declared) {
                    continue;
                }
            }
            if declared != actual {
                return false;
            }
        }
        true
    }

    /// Extracts placeholder values from a matching path, in declaration
    /// order. A greedy placeholder contributes every remaining segment.
    ///
    /// Calling this for a (method, path) pair that doesn't match the
    /// endpoint is a caller bug and reported as an internal error.
    pub fn extract_arguments(&self, method: &str, path: &str) -> ApiResult<Vec<String>> {
        if !self.matches(method, path, false) {
            return Err(ApiError::Internal(format!(
                "can't extract arguments: '{} {}' doesn't match endpoint '{}'",
                method, path, self
            )));
        }

        let target = split_segments(path);
        let mut arguments = Vec::new();
        let mut greedy = false;
        for (index, actual) in target.iter().enumerate() {
            if greedy {
                arguments.push((*actual).to_owned());
                continue;
            }
            let declared = &self.segments[index];
            if is_greedy_placeholder(declared) {
                greedy = true;
                arguments.push((*actual).to_owned());
            } else if is_single_placeholder(declared) {
                arguments.push((*actual).to_owned());
            }
        }
        Ok(arguments)
    }
}

impl fmt::Display for ApiEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.route)
    }
}

fn split_segments(path: &str) -> Vec<&str> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        Vec::new()
    } else {
        trimmed.split('/').collect()
    }
}

fn decode_braces(segment: &str) -> String {
    segment
        .replace("%7B", "{")
        .replace("%7b", "{")
        .replace("%7D", "}")
        .replace("%7d", "}")
}

fn is_single_placeholder(segment: &str) -> bool {
    segment.starts_with('{') && segment.ends_with('}') && !is_greedy_placeholder(segment)
}

fn is_greedy_placeholder(segment: &str) -> bool {
    segment == GREEDY_PLACEHOLDER
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn literal_routes_match_exactly() {
        let endpoint = ApiEndpoint::new("GET", "/a/b");
        assert!(endpoint.matches("GET", "/a/b", true));
        assert!(endpoint.matches("get", "a/b/", true));
        assert!(!endpoint.matches("GET", "/a/c", true));
        assert!(!endpoint.matches("POST", "/a/b", true));
        assert!(!endpoint.matches("GET", "/a", true));
        assert!(!endpoint.matches("GET", "/a/b/c", true));
    }

    #[test]
    fn placeholders_have_no_meaning_in_exact_mode() {
        let endpoint = ApiEndpoint::new("GET", "/a/{x}");
        assert!(!endpoint.matches("GET", "/a/b", true));
        // Only the literal brace segment itself matches exactly.
        assert!(endpoint.matches("GET", "/a/{x}", true));
    }

    #[test]
    fn single_placeholder_matches_any_one_segment() {
        let endpoint = ApiEndpoint::new("GET", "/a/{x}");
        assert!(endpoint.matches("GET", "/a/b", false));
        assert!(endpoint.matches("GET", "/a/whatever", false));
        assert!(!endpoint.matches("GET", "/a", false));
        assert!(!endpoint.matches("GET", "/a/b/c", false));
    }

    #[test]
    fn greedy_placeholder_matches_the_remainder() {
        let endpoint = ApiEndpoint::new("GET", "/r/{id}/{...}");
        assert!(endpoint.matches("GET", "/r/5/x/y/z", false));
        assert_eq!(
            endpoint.extract_arguments("GET", "/r/5/x/y/z").unwrap(),
            ["5", "x", "y", "z"]
        );

        // Zero extra segments still match: the greedy tail may be empty.
        assert!(endpoint.matches("GET", "/r/5/", false));
        assert_eq!(endpoint.extract_arguments("GET", "/r/5/").unwrap(), ["5"]);

        // But the non-greedy prefix is still required.
        assert!(!endpoint.matches("GET", "/r", false));
    }

    #[test]
    fn percent_encoded_placeholders_are_recognized() {
        let endpoint = ApiEndpoint::new("GET", "/r/%7Bid%7D/%7B...%7D");
        assert!(endpoint.matches("GET", "/r/5/a/b", false));
        assert_eq!(
            endpoint.extract_arguments("GET", "/r/5/a/b").unwrap(),
            ["5", "a", "b"]
        );
    }

    #[test]
    fn extraction_on_non_match_is_an_error() {
        let endpoint = ApiEndpoint::new("GET", "/a/{x}");
        let err = endpoint.extract_arguments("POST", "/a/b").unwrap_err();
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn arguments_come_in_declaration_order() {
        let endpoint = ApiEndpoint::new("PUT", "/v/{a}/fixed/{b}");
        assert!(endpoint.matches("PUT", "/v/1/fixed/2", false));
        assert_eq!(
            endpoint.extract_arguments("PUT", "/v/1/fixed/2").unwrap(),
            ["1", "2"]
        );
        // A literal segment mismatch fails even with placeholders around it.
        assert!(!endpoint.matches("PUT", "/v/1/other/2", false));
    }

    #[test]
    fn empty_route_matches_the_bare_base() {
        let endpoint = ApiEndpoint::new("GET", "/");
        assert!(endpoint.matches("GET", "", false));
        assert!(endpoint.matches("GET", "/", false));
        assert!(!endpoint.matches("GET", "/x", false));
    }
}
