use confsync_merge::{diff_dependencies, merge, merge_raw, DependencyMap};
use proptest::prelude::*;
use serde_json::{json, Value};

fn int_array() -> impl Strategy<Value = Vec<i64>> {
    prop::collection::vec(-50i64..50, 0..8)
}

fn dep_map() -> impl Strategy<Value = DependencyMap> {
    prop::collection::btree_map(
        "[a-d]",
        prop::option::of(prop::sample::select(vec!["1.0.0", "1.0.1", "2.0.0"]).prop_map(String::from)),
        0..4,
    )
}

proptest! {
    #[test]
    fn merge_arrays_are_sorted_and_unique(a in int_array(), b in int_array()) {
        let merged = merge(&json!({"k": a}), &json!({"k": b}));
        let items: Vec<i64> = merged["k"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_i64().unwrap())
            .collect();
        prop_assert!(items.windows(2).all(|w| w[0] < w[1]));
        for x in a.iter().chain(b.iter()) {
            prop_assert!(items.contains(x));
        }
    }

    #[test]
    fn merge_raw_arrays_are_concatenations(a in int_array(), b in int_array()) {
        let merged = merge_raw(&json!({"k": a.clone()}), &json!({"k": b.clone()}));
        let expected: Vec<i64> = a.into_iter().chain(b).collect();
        prop_assert_eq!(merged, json!({"k": expected}));
    }

    #[test]
    fn merge_is_idempotent(a in int_array(), b in int_array()) {
        let base = json!({"k": a, "nested": {"x": 1}});
        let overlay = json!({"k": b, "nested": {"y": 2}});
        let once = merge(&base, &overlay);
        let twice = merge(&once, &overlay);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn diff_against_self_is_empty(m in dep_map()) {
        prop_assert!(diff_dependencies(&m, &m).is_empty());
    }

    #[test]
    fn diff_never_reports_no_opinion(old in dep_map(), new in dep_map()) {
        for (name, diff) in diff_dependencies(&old, &new) {
            let sides = [old.get(&name), new.get(&name)];
            prop_assert!(sides.iter().all(|s| !matches!(s, Some(None))), "{name}: {diff:?}");
        }
    }
}

#[test]
fn scalar_overlay_wins_at_any_depth() {
    let base: Value = json!({"a": {"b": {"c": 1, "d": 2}}});
    let overlay: Value = json!({"a": {"b": {"c": 3}}});
    assert_eq!(merge(&base, &overlay), json!({"a": {"b": {"c": 3, "d": 2}}}));
}
