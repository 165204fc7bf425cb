//! Scalar item payloads
//!
//! [`ItemValue`] is the payload of a `Value` item: the JSON scalar kinds
//! plus dates, which arrive on the wire as RFC 3339 string literals.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value as JsonValue;

use crate::error::{TreeError, TreeResult};

/// A scalar value held by a `Value` item.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemValue {
    /// JSON null / unset value
    Null,
    /// Boolean
    Bool(bool),
    /// Integer number (JSON numbers without a fractional part)
    Long(i64),
    /// Floating-point number
    Double(f64),
    /// Plain string
    String(String),
    /// Date value, parsed from RFC 3339 string literals
    Date(DateTime<Utc>),
}

impl ItemValue {
    /// Human-readable kind name, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            ItemValue::Null => "null",
            ItemValue::Bool(_) => "boolean",
            ItemValue::Long(_) | ItemValue::Double(_) => "number",
            ItemValue::String(_) => "string",
            ItemValue::Date(_) => "date",
        }
    }

    /// Converts a JSON scalar into an [`ItemValue`].
    ///
    /// Strings parseable as RFC 3339 date literals become [`ItemValue::Date`];
    /// integers stay integers so round-trips don't turn `1` into `1.0`.
    /// Non-scalar input is rejected.
    pub fn from_json(value: &JsonValue) -> TreeResult<Self> {
        match value {
            JsonValue::Null => Ok(ItemValue::Null),
            JsonValue::Bool(b) => Ok(ItemValue::Bool(*b)),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(ItemValue::Long(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(ItemValue::Double(f))
                } else {
                    Err(TreeError::JsonData(format!("unrepresentable number: {n}")))
                }
            }
            JsonValue::String(s) => match DateTime::parse_from_rfc3339(s) {
                Ok(date) => Ok(ItemValue::Date(date.with_timezone(&Utc))),
                Err(_) => Ok(ItemValue::String(s.clone())),
            },
            other => Err(TreeError::JsonData(format!(
                "expected a scalar JSON value, got {}",
                json_kind_name(other)
            ))),
        }
    }

    /// The JSON representation of this value.
    pub fn to_json(&self) -> JsonValue {
        match self {
            ItemValue::Null => JsonValue::Null,
            ItemValue::Bool(b) => JsonValue::Bool(*b),
            ItemValue::Long(i) => JsonValue::from(*i),
            ItemValue::Double(f) => {
                serde_json::Number::from_f64(*f).map_or(JsonValue::Null, JsonValue::Number)
            }
            ItemValue::String(s) => JsonValue::String(s.clone()),
            ItemValue::Date(d) => {
                JsonValue::String(d.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
        }
    }

    /// Compares two values of comparable kinds.
    ///
    /// Numbers compare across `Long`/`Double`; strings, booleans and dates
    /// compare within their own kind. Everything else (and kind mismatches)
    /// is a domain error — query filters surface it as a 400.
    pub fn compare(&self, other: &ItemValue) -> TreeResult<Ordering> {
        match (self, other) {
            (ItemValue::String(a), ItemValue::String(b)) => Ok(a.cmp(b)),
            (ItemValue::Bool(a), ItemValue::Bool(b)) => Ok(a.cmp(b)),
            (ItemValue::Date(a), ItemValue::Date(b)) => Ok(a.cmp(b)),
            (ItemValue::Long(a), ItemValue::Long(b)) => Ok(a.cmp(b)),
            (a, b) if a.kind_name() == "number" && b.kind_name() == "number" => {
                let (a, b) = (a.as_f64(), b.as_f64());
                a.partial_cmp(&b)
                    .ok_or(TreeError::NotComparable("non-finite number"))
            }
            (ItemValue::Null, _) | (_, ItemValue::Null) => {
                Err(TreeError::NotComparable("null"))
            }
            (a, b) => {
                if a.kind_name() == b.kind_name() {
                    Err(TreeError::NotComparable(a.kind_name()))
                } else {
                    Err(TreeError::NotComparable("mixed-kind"))
                }
            }
        }
    }

    /// True for [`ItemValue::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, ItemValue::Null)
    }

    /// The boolean payload, if this is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ItemValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The integer payload, if this is a `Long`.
    pub fn as_long(&self) -> Option<i64> {
        match self {
            ItemValue::Long(i) => Some(*i),
            _ => None,
        }
    }

    /// The numeric payload as a float (`Long` values are widened).
    pub fn as_double(&self) -> Option<f64> {
        match self {
            ItemValue::Long(i) => Some(*i as f64),
            ItemValue::Double(f) => Some(*f),
            _ => None,
        }
    }

    /// The string payload, if this is a `String`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ItemValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// The date payload, if this is a `Date`.
    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            ItemValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    fn as_f64(&self) -> f64 {
        match self {
            ItemValue::Long(i) => *i as f64,
            ItemValue::Double(f) => *f,
            _ => f64::NAN,
        }
    }
}

impl fmt::Display for ItemValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl From<bool> for ItemValue {
    fn from(v: bool) -> Self {
        ItemValue::Bool(v)
    }
}

impl From<i64> for ItemValue {
    fn from(v: i64) -> Self {
        ItemValue::Long(v)
    }
}

impl From<f64> for ItemValue {
    fn from(v: f64) -> Self {
        ItemValue::Double(v)
    }
}

impl From<&str> for ItemValue {
    fn from(v: &str) -> Self {
        ItemValue::String(v.to_owned())
    }
}

impl From<String> for ItemValue {
    fn from(v: String) -> Self {
        ItemValue::String(v)
    }
}

impl From<DateTime<Utc>> for ItemValue {
    fn from(v: DateTime<Utc>) -> Self {
        ItemValue::Date(v)
    }
}

/// Kind name of an arbitrary JSON value, for error messages.
pub(crate) fn json_kind_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
