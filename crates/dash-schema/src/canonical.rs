//! Canonical JSON form used for diffing and round-trip comparison

use serde_json::{Map, Value};

/// Deep-sort object keys and drop object entries whose value is `null`
///
/// Arrays keep their order; their elements are canonicalized but nulls inside
/// arrays are kept. The function is idempotent.
#[must_use]
pub fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(obj) => {
            let mut keys: Vec<&String> = obj.keys().collect();
            keys.sort();
            let mut out = Map::with_capacity(obj.len());
            for key in keys {
                let child = &obj[key.as_str()];
                if child.is_null() {
                    continue;
                }
                out.insert(key.clone(), canonicalize(child));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn strips_nulls_and_sorts() {
        let input = json!({"b": 1, "a": {"z": null, "y": [null, {"d": null, "c": 2}]}});
        let out = canonicalize(&input);

        assert_eq!(out, json!({"a": {"y": [null, {"c": 2}]}, "b": 1}));
        let keys: Vec<&String> = out.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn scalars_unchanged() {
        assert_eq!(canonicalize(&json!(3.5)), json!(3.5));
        assert_eq!(canonicalize(&json!(null)), json!(null));
    }
}
