use crate::matcher::RuleError;
use crate::registry::ModuleRule;
use crate::template::Template;
use confsync_merge::{DependencySet, merge, merge_raw, migrate_dependencies, missing_entries};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Serializer, Value, json};
use std::sync::Arc;

pub(super) fn package_json_rule(template: &Arc<Template>) -> Result<ModuleRule, RuleError> {
    let t = Arc::clone(template);
    ModuleRule::new("package-json", "package.json", move |current, _, _| {
        let current = current?;
        Some(reconcile_manifest(current, &t).unwrap_or_else(|| current.to_string()))
    })
}

pub(super) fn tsconfig_rule(template: &Arc<Template>) -> Result<ModuleRule, RuleError> {
    let defaults = json!({ "compilerOptions": template.compiler_options });
    ModuleRule::new("tsconfig", "tsconfig.json", move |current, _, _| {
        let current = current?;
        let config: Value = match serde_json::from_str(current) {
            Ok(v) => v,
            Err(err) => {
                // JSONC (comments, trailing commas) is left for the user.
                tracing::warn!(path = "tsconfig.json", error = %err, "not plain JSON; leaving as is");
                return Some(current.to_string());
            }
        };
        let Some(overlay) = missing_entries(&config, &defaults) else {
            return Some(current.to_string());
        };
        let merged = merge_raw(&config, &overlay);
        Some(write_json_like(&merged, current).unwrap_or_else(|| current.to_string()))
    })
}

/// Fill template `scripts`/`engines` gaps and run dependency migrations over a
/// `package.json` text. `None` when the text is not a JSON object or nothing changes.
pub fn reconcile_manifest(current: &str, template: &Template) -> Option<String> {
    let mut manifest: Value = match serde_json::from_str(current) {
        Ok(v @ Value::Object(_)) => v,
        Ok(_) => return None,
        Err(err) => {
            tracing::warn!(path = "package.json", error = %err, "unparseable manifest; leaving as is");
            return None;
        }
    };
    let original = manifest.clone();

    if let Some(overlay) = missing_entries(&manifest, &template.package_json) {
        manifest = merge(&manifest, &overlay);
    }

    let mut deps = DependencySet::from_manifest(&manifest, template.project_type);
    let report = migrate_dependencies(&mut deps, &template.migrations);
    if !report.is_empty() {
        deps.write_to_manifest(&mut manifest);
    }

    if manifest == original {
        return None;
    }
    write_json_like(&manifest, current)
}

/// Pretty-print `value` with the indentation and final newline style of `like`.
pub fn write_json_like(value: &Value, like: &str) -> Option<String> {
    let indent = detect_indent(like);
    let mut buf = Vec::new();
    let mut ser = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(indent.as_bytes()));
    value.serialize(&mut ser).ok()?;
    let mut out = String::from_utf8(buf).ok()?;
    if like.is_empty() || like.ends_with('\n') {
        out.push('\n');
    }
    Some(out)
}

fn detect_indent(text: &str) -> String {
    text.lines()
        .skip(1)
        .map(|line| {
            line.chars()
                .take_while(|c| *c == ' ' || *c == '\t')
                .collect::<String>()
        })
        .find(|ws| !ws.is_empty())
        .unwrap_or_else(|| "  ".to_string())
}
