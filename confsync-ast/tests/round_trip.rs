use confsync_ast::{Dialect, Property, appender, transform};
use proptest::prelude::*;
use std::collections::BTreeMap;

fn render_object(entries: &BTreeMap<String, u32>, multiline: bool) -> String {
    if entries.is_empty() {
        return "export default {};\n".to_string();
    }
    let body: Vec<String> = entries.iter().map(|(k, v)| format!("{k}: {v}")).collect();
    if multiline {
        format!("export default {{\n  {},\n}};\n", body.join(",\n  "))
    } else {
        format!("export default {{ {} }};\n", body.join(", "))
    }
}

proptest! {
    #[test]
    fn identity_transform_preserves_source(
        entries in prop::collection::btree_map("k[a-z]{0,5}", 0u32..1000, 0..6),
        multiline in any::<bool>(),
        header in prop::sample::select(vec!["", "// config\n", "/* eslint-disable */\n"]),
    ) {
        let src = format!("{header}{}", render_object(&entries, multiline));
        let out = transform(&src, Dialect::JavaScript, |_, props| props).unwrap();
        prop_assert_eq!(out, src);
    }

    #[test]
    fn appending_existing_entries_is_a_no_op(
        entries in prop::collection::btree_map("k[a-z]{0,5}", 0u32..1000, 1..6),
        multiline in any::<bool>(),
    ) {
        let src = render_object(&entries, multiline);
        let same: Vec<Property> = entries
            .iter()
            .map(|(k, v)| Property::pair(k, v.to_string()))
            .collect();
        let out = transform(&src, Dialect::JavaScript, appender(same)).unwrap();
        prop_assert_eq!(out, src);
    }

    #[test]
    fn appended_keys_are_readable(
        entries in prop::collection::btree_map("k[a-z]{0,5}", 0u32..1000, 0..6),
        value in 0u32..1000,
    ) {
        let src = render_object(&entries, true);
        let out = transform(&src, Dialect::JavaScript, appender([Property::pair("added", value.to_string())])).unwrap();
        let prop = confsync_ast::read_property(&out, Dialect::JavaScript, "added").unwrap();
        prop_assert_eq!(prop.map(|p| p.value().to_string()), Some(value.to_string()));
    }
}
