//! Dot-path attribute resolution.
//!
//! A path is a `.` separated list of segments. Each segment is looked up as
//! a key in the current object (or as an index in the current array). The
//! `*` segment resolves the rest of the path against every element of the
//! current container and flattens the results one level: array results are
//! concatenated, anything else is appended as a single element.
//!
//! A missing key, or a `null` value, short-circuits to the default for that
//! branch. Exhausted segments return the current value unchanged.

use serde_json::Value;

/// Segment that fans out over every element of the current container.
pub const WILDCARD: &str = "*";

/// Resolve `path` against `value`, falling back to `default`.
pub fn resolve(value: &Value, path: &str, default: &Value) -> Value {
    if path.is_empty() {
        return default.clone();
    }

    let segments: Vec<&str> = path.split('.').collect();
    resolve_segments(value, &segments, default)
}

fn resolve_segments(current: &Value, segments: &[&str], default: &Value) -> Value {
    let Some((segment, rest)) = segments.split_first() else {
        return current.clone();
    };

    if *segment == WILDCARD {
        let elements: Vec<&Value> = match current {
            Value::Array(items) => items.iter().collect(),
            Value::Object(map) => map.values().collect(),
            _ => return default.clone(),
        };

        let mut flattened = Vec::with_capacity(elements.len());
        for element in elements {
            match resolve_segments(element, rest, default) {
                Value::Array(nested) => flattened.extend(nested),
                other => flattened.push(other),
            }
        }
        return Value::Array(flattened);
    }

    let next = match current {
        Value::Object(map) => map.get(*segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    };

    match next {
        Some(value) if !value.is_null() => resolve_segments(value, rest, default),
        _ => default.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use test_case::test_case;

    fn profiles() -> Value {
        json!({
            "data": [
                {"profile": {"address": [{"city": "A"}]}},
                {"profile": {"address": [{"city": "B"}]}}
            ]
        })
    }

    #[test]
    fn test_wildcard_collects_keys() {
        let value = json!({"data": [{"id": 1}, {"id": 2}, {"id": 3}]});
        assert_eq!(resolve(&value, "data.*.id", &Value::Null), json!([1, 2, 3]));
    }

    #[test]
    fn test_nested_wildcards_flatten() {
        assert_eq!(
            resolve(&profiles(), "data.*.profile.address.*.city", &Value::Null),
            json!(["A", "B"])
        );
    }

    #[test]
    fn test_missing_key_under_wildcard_falls_back_per_element() {
        assert_eq!(
            resolve(&profiles(), "data.*.missing", &Value::Null),
            json!([null, null])
        );
    }

    #[test_case("" ; "empty path")]
    #[test_case("nope" ; "missing top level key")]
    #[test_case("data.nope" ; "missing key on array")]
    #[test_case("user.name.first" ; "descends into scalar")]
    #[test_case("user.deleted_at" ; "null value")]
    fn test_misses_return_default(path: &str) {
        let value = json!({
            "data": [1, 2],
            "user": {"name": "ann", "deleted_at": null}
        });
        let default = json!("fallback");

        assert_eq!(resolve(&value, path, &default), default);
    }

    #[test_case("errors.0.code", json!(401) ; "numeric index")]
    #[test_case("errors.1", json!({"code": 500}) ; "index returns object")]
    #[test_case("errors", json!([{"code": 401}, {"code": 500}]) ; "whole array")]
    #[test_case("errors.*", json!([{"code": 401}, {"code": 500}]) ; "trailing wildcard")]
    fn test_exhausted_segments_return_value(path: &str, expected: Value) {
        let value = json!({"errors": [{"code": 401}, {"code": 500}]});
        assert_eq!(resolve(&value, path, &Value::Null), expected);
    }

    #[test]
    fn test_wildcard_concatenates_array_results() {
        let value = json!({"groups": [{"ids": [1, 2]}, {"ids": [3]}, {"ids": 4}]});
        assert_eq!(
            resolve(&value, "groups.*.ids", &Value::Null),
            json!([1, 2, 3, 4])
        );
    }

    #[test]
    fn test_wildcard_over_object_values() {
        let value = json!({"users": {"a": {"id": 1}, "b": {"id": 2}}});
        assert_eq!(resolve(&value, "users.*.id", &Value::Null), json!([1, 2]));
    }

    #[test]
    fn test_wildcard_over_scalar_returns_default() {
        let value = json!({"count": 3});
        assert_eq!(resolve(&value, "count.*", &json!([])), json!([]));
    }
}
