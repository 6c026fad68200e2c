use serde_json::{Map, Value};
use std::cmp::Ordering;

/// Deep merge with deduplicating, sorted array union.
///
/// Objects merge key by key (keys of `base` keep their order, new keys from `overlay` are
/// appended). Arrays are concatenated, deduplicated and sorted. Any other conflict takes the
/// `overlay` value.
pub fn merge(base: &Value, overlay: &Value) -> Value {
    merge_with(base, overlay, ArrayPolicy::SortedUnion)
}

/// Deep merge with ordered array concatenation.
///
/// Like [`merge`], but arrays are `base` followed by `overlay`, duplicates and order kept.
pub fn merge_raw(base: &Value, overlay: &Value) -> Value {
    merge_with(base, overlay, ArrayPolicy::Concat)
}

/// The parts of `defaults` that `base` does not already have.
///
/// Objects recurse; arrays yield the items missing from `base`; scalars already present in
/// `base` are kept as they are. Merging the result into `base` fills gaps without overriding
/// anything, and yields `None` once there is nothing left to fill.
pub fn missing_entries(base: &Value, defaults: &Value) -> Option<Value> {
    match (base, defaults) {
        (Value::Object(have), Value::Object(want)) => {
            let mut out = Map::new();
            for (key, default) in want {
                match have.get(key) {
                    None => {
                        out.insert(key.clone(), default.clone());
                    }
                    Some(existing) => {
                        if let Some(sub) = missing_entries(existing, default) {
                            out.insert(key.clone(), sub);
                        }
                    }
                }
            }
            (!out.is_empty()).then_some(Value::Object(out))
        }
        (Value::Array(have), Value::Array(want)) => {
            let missing: Vec<Value> = want.iter().filter(|v| !have.contains(v)).cloned().collect();
            (!missing.is_empty()).then_some(Value::Array(missing))
        }
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArrayPolicy {
    SortedUnion,
    Concat,
}

fn merge_with(base: &Value, overlay: &Value, policy: ArrayPolicy) -> Value {
    match (base, overlay) {
        (Value::Object(a), Value::Object(b)) => Value::Object(merge_objects(a, b, policy)),
        (Value::Array(a), Value::Array(b)) => {
            let mut items: Vec<Value> = a.iter().chain(b.iter()).cloned().collect();
            if policy == ArrayPolicy::SortedUnion {
                items.sort_by(compare_values);
                items.dedup();
            }
            Value::Array(items)
        }
        (_, overlay) => overlay.clone(),
    }
}

fn merge_objects(a: &Map<String, Value>, b: &Map<String, Value>, policy: ArrayPolicy) -> Map<String, Value> {
    let mut out = a.clone();
    for (key, value) in b {
        let merged = match a.get(key) {
            Some(existing) => merge_with(existing, value, policy),
            None => value.clone(),
        };
        out.insert(key.clone(), merged);
    }
    out
}

fn type_rank(v: &Value) -> u8 {
    match v {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Total order over JSON values used for sorted array unions.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.total_cmp(&y)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(_), Value::Array(_)) | (Value::Object(_), Value::Object(_)) => {
            a.to_string().cmp(&b.to_string())
        }
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn merge_dedups_and_sorts_arrays() {
        assert_eq!(
            merge(&json!({"a": [1, 3]}), &json!({"a": [2, 4, 3]})),
            json!({"a": [1, 2, 3, 4]})
        );
    }

    #[test]
    fn merge_raw_concatenates_arrays() {
        assert_eq!(
            merge_raw(&json!({"a": [1, 3]}), &json!({"a": [2, 4, 3]})),
            json!({"a": [1, 3, 2, 4, 3]})
        );
    }

    #[test]
    fn nested_objects_merge_and_scalars_take_overlay() {
        let base = json!({"compilerOptions": {"strict": false, "lib": ["dom"]}, "name": "x"});
        let overlay = json!({"compilerOptions": {"strict": true, "lib": ["es2022"]}});
        assert_eq!(
            merge(&base, &overlay),
            json!({"compilerOptions": {"strict": true, "lib": ["dom", "es2022"]}, "name": "x"})
        );
    }

    #[test]
    fn merge_keeps_base_key_order() {
        let base = json!({"z": 1, "a": 2});
        let merged = merge(&base, &json!({"m": 3, "z": 4}));
        let keys: Vec<&str> = merged
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn mixed_type_arrays_sort_by_type_rank() {
        assert_eq!(
            merge(&json!(["b", 2, null]), &json!([true, "a", 1])),
            json!([null, true, 1, 2, "a", "b"])
        );
    }

    #[test]
    fn missing_entries_fill_gaps_only() {
        let base = json!({"scripts": {"lint": "eslint ."}, "lib": ["dom"]});
        let defaults = json!({"scripts": {"lint": "confsync lint", "format": "confsync format"}, "lib": ["dom", "es2022"]});
        let overlay = missing_entries(&base, &defaults).unwrap();
        assert_eq!(
            overlay,
            json!({"scripts": {"format": "confsync format"}, "lib": ["es2022"]})
        );
        let filled = merge_raw(&base, &overlay);
        assert_eq!(filled["scripts"]["lint"], "eslint .");
        assert_eq!(missing_entries(&filled, &defaults), None);
    }

    #[test]
    fn type_conflict_takes_overlay() {
        assert_eq!(merge(&json!({"a": [1]}), &json!({"a": "x"})), json!({"a": "x"}));
    }
}
