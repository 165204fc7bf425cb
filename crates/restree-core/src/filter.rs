//! Query-parameter filtering over resource collections
//!
//! A query parameter like `age=~gteq~21` becomes a [`ValueFilter`]: the key
//! names a property path inside each candidate resource, the value carries
//! an operator prefix and a comparison literal. A request's parameters form
//! an implicit AND over the collection.

use serde_json::Value as JsonValue;

use crate::error::TreeResult;
use crate::path::PropertyPath;
use crate::resource::ApiResource;
use crate::value::ItemValue;

/// Comparison operator encoded by a filter-value prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    /// `~null~` — the property is absent or null
    IsNull,
    /// `~notnull~` — the property exists and is not null
    IsNotNull,
    /// `~eq~`, or no prefix at all
    Equal,
    /// `~noteq~`
    NotEqual,
    /// `~gt~`
    Greater,
    /// `~gteq~`
    GreaterOrEqual,
    /// `~lt~`
    Less,
    /// `~lteq~`
    LessOrEqual,
}

/// One parsed filter predicate: property path, operator, comparison literal.
#[derive(Debug, Clone)]
pub struct ValueFilter {
    property: PropertyPath,
    operator: FilterOperator,
    literal: Option<ItemValue>,
}

impl ValueFilter {
    /// Parses one query parameter into a filter.
    ///
    /// The key is the property path (dot-separated for nested properties);
    /// the value starts with one of the operator prefixes, defaulting to
    /// equality. The comparison literal is parsed as JSON to recover its
    /// native type; text that isn't valid JSON is compared as a plain
    /// string, so `name=alice` works without quoting.
    pub fn from_query_param(key: &str, value: &str) -> ValueFilter {
        // Longest prefixes first, so `~noteq~` is never read as `~null~`
        // territory and `~gteq~` never as `~gt~`.
        let (operator, rest) = if let Some(rest) = value.strip_prefix("~notnull~") {
            (FilterOperator::IsNotNull, rest)
        } else if let Some(rest) = value.strip_prefix("~noteq~") {
            (FilterOperator::NotEqual, rest)
        } else if let Some(rest) = value.strip_prefix("~null~") {
            (FilterOperator::IsNull, rest)
        } else if let Some(rest) = value.strip_prefix("~gteq~") {
            (FilterOperator::GreaterOrEqual, rest)
        } else if let Some(rest) = value.strip_prefix("~lteq~") {
            (FilterOperator::LessOrEqual, rest)
        } else if let Some(rest) = value.strip_prefix("~eq~") {
            (FilterOperator::Equal, rest)
        } else if let Some(rest) = value.strip_prefix("~gt~") {
            (FilterOperator::Greater, rest)
        } else if let Some(rest) = value.strip_prefix("~lt~") {
            (FilterOperator::Less, rest)
        } else {
            (FilterOperator::Equal, value)
        };

        let literal = match operator {
            FilterOperator::IsNull | FilterOperator::IsNotNull => None,
            _ => Some(parse_literal(rest)),
        };

        ValueFilter {
            property: PropertyPath::from_full_path(key),
            operator,
            literal,
        }
    }

    /// The property path this filter inspects.
    pub fn property(&self) -> &PropertyPath {
        &self.property
    }

    /// The parsed operator.
    pub fn operator(&self) -> FilterOperator {
        self.operator
    }

    /// Evaluates the predicate against one resource.
    ///
    /// A property that doesn't exist counts as null: it satisfies `~null~`
    /// and fails everything else. Ordering comparisons on mismatched or
    /// non-comparable kinds are an error, not a silent false.
    pub fn check(&self, resource: &ApiResource) -> TreeResult<bool> {
        let scalar = match resource.item_at(&self.property) {
            Ok(item) => item.scalar()?.clone(),
            Err(_) => ItemValue::Null,
        };

        match self.operator {
            FilterOperator::IsNull => Ok(scalar.is_null()),
            FilterOperator::IsNotNull => Ok(!scalar.is_null()),
            operator => {
                // Literal is always present for comparison operators.
                let literal = self.literal.as_ref().unwrap_or(&ItemValue::Null);
                if scalar.is_null() {
                    // Absent/null properties never satisfy a comparison.
                    return Ok(false);
                }
                let ordering = scalar.compare(literal)?;
                Ok(match operator {
                    FilterOperator::Equal => ordering.is_eq(),
                    FilterOperator::NotEqual => !ordering.is_eq(),
                    FilterOperator::Greater => ordering.is_gt(),
                    FilterOperator::GreaterOrEqual => ordering.is_ge(),
                    FilterOperator::Less => ordering.is_lt(),
                    FilterOperator::LessOrEqual => ordering.is_le(),
                    FilterOperator::IsNull | FilterOperator::IsNotNull => unreachable!(),
                })
            }
        }
    }
}

fn parse_literal(text: &str) -> ItemValue {
    match serde_json::from_str::<JsonValue>(text) {
        Ok(json) => {
            ItemValue::from_json(&json).unwrap_or_else(|_| ItemValue::from(text))
        }
        Err(_) => ItemValue::from(text),
    }
}

/// Parses a whole query-parameter list into filters.
pub fn parse_filters(params: &[(String, String)]) -> Vec<ValueFilter> {
    params
        .iter()
        .map(|(key, value)| ValueFilter::from_query_param(key, value))
        .collect()
}

/// Keeps the resources satisfying every filter (implicit AND,
/// short-circuiting per candidate on the first failing predicate).
pub fn filter_resources(
    resources: Vec<ApiResource>,
    filters: &[ValueFilter],
) -> TreeResult<Vec<ApiResource>> {
    if filters.is_empty() {
        return Ok(resources);
    }

    let mut matching = Vec::with_capacity(resources.len());
    'candidates: for resource in resources {
        for filter in filters {
            if !filter.check(&resource)? {
                continue 'candidates;
            }
        }
        matching.push(resource);
    }
    Ok(matching)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TreeError;
    use crate::item::ItemKind;
    use crate::permission::EditPermission;
    use crate::schema::ResourceSchema;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;

    fn schema() -> Arc<ResourceSchema> {
        Arc::new(
            ResourceSchema::new()
                .define(".name", ItemKind::Value, EditPermission::ALL)
                .define(".age", ItemKind::Value, EditPermission::ALL),
        )
    }

    fn contact(name: &str, age: Option<i64>) -> ApiResource {
        let json = match age {
            Some(age) => json!({"name": name, "age": age}),
            None => json!({"name": name, "age": null}),
        };
        ApiResource::from_json(name, schema(), &json).unwrap()
    }

    #[test]
    fn prefixes_parse_to_operators() {
        let cases = [
            ("~null~", FilterOperator::IsNull),
            ("~notnull~", FilterOperator::IsNotNull),
            ("~eq~5", FilterOperator::Equal),
            ("~noteq~5", FilterOperator::NotEqual),
            ("~gt~5", FilterOperator::Greater),
            ("~gteq~5", FilterOperator::GreaterOrEqual),
            ("~lt~5", FilterOperator::Less),
            ("~lteq~5", FilterOperator::LessOrEqual),
            ("5", FilterOperator::Equal),
        ];
        for (value, expected) in cases {
            let filter = ValueFilter::from_query_param("age", value);
            assert_eq!(filter.operator(), expected, "for {value}");
        }
    }

    #[test]
    fn literals_recover_their_json_type() {
        let alice = contact("alice", Some(30));

        // Number literal compares numerically.
        let filter = ValueFilter::from_query_param("age", "~gteq~21");
        assert!(filter.check(&alice).unwrap());
        let filter = ValueFilter::from_query_param("age", "~lt~21");
        assert!(!filter.check(&alice).unwrap());

        // Unquoted text isn't valid JSON and falls back to string equality.
        let filter = ValueFilter::from_query_param("name", "alice");
        assert!(filter.check(&alice).unwrap());
        let filter = ValueFilter::from_query_param("name", "bob");
        assert!(!filter.check(&alice).unwrap());
    }

    #[test]
    fn null_checks_cover_absent_properties() {
        let no_age = contact("ghost", None);
        assert!(ValueFilter::from_query_param("age", "~null~")
            .check(&no_age)
            .unwrap());
        assert!(!ValueFilter::from_query_param("age", "~notnull~")
            .check(&no_age)
            .unwrap());
        // A property the schema doesn't even define counts as null too.
        assert!(ValueFilter::from_query_param("missing", "~null~")
            .check(&no_age)
            .unwrap());
        // Comparisons against a null property never match.
        assert!(!ValueFilter::from_query_param("age", "~gt~5")
            .check(&no_age)
            .unwrap());
    }

    #[test]
    fn mismatched_kinds_are_an_error() {
        let alice = contact("alice", Some(30));
        let filter = ValueFilter::from_query_param("name", "~gt~5");
        let err = filter.check(&alice).unwrap_err();
        assert!(matches!(err, TreeError::NotComparable(_)));
    }

    #[test]
    fn filtering_is_an_implicit_and() {
        let resources = vec![
            contact("alice", Some(30)),
            contact("bob", Some(17)),
            contact("carol", Some(45)),
        ];
        let filters = parse_filters(&[
            ("age".to_owned(), "~gteq~18".to_owned()),
            ("age".to_owned(), "~lt~40".to_owned()),
        ]);
        let matching = filter_resources(resources, &filters).unwrap();
        let names: Vec<&str> = matching.iter().map(ApiResource::name).collect();
        assert_eq!(names, ["alice"]);
    }

    #[test]
    fn no_filters_keeps_everything() {
        let resources = vec![contact("alice", Some(30)), contact("bob", Some(17))];
        let matching = filter_resources(resources, &[]).unwrap();
        assert_eq!(matching.len(), 2);
    }
}
