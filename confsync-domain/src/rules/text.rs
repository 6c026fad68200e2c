use crate::matcher::RuleError;
use crate::registry::ModuleRule;
use crate::template::Template;
use confsync_merge::merge_raw;
use serde_json::{Value, json};
use std::collections::BTreeSet;
use std::sync::Arc;

pub(super) fn ignore_file_rules(template: &Arc<Template>) -> Result<Vec<ModuleRule>, RuleError> {
    let mut rules = Vec::new();

    let t = Arc::clone(template);
    rules.push(ModuleRule::new("gitignore", ".gitignore", move |current, _, _| {
        append_missing_lines(current, &t.gitignore)
    })?);

    let t = Arc::clone(template);
    rules.push(ModuleRule::new("prettierignore", ".prettierignore", move |current, _, _| {
        append_missing_lines(current, &t.prettierignore)
    })?);

    if template.project_type.is_package() {
        let t = Arc::clone(template);
        rules.push(ModuleRule::new("npmignore", ".npmignore", move |current, _, _| {
            append_missing_lines(current, &t.npmignore)
        })?);
    }

    Ok(rules)
}

pub(super) fn nvmrc_rule(template: &Arc<Template>) -> Result<ModuleRule, RuleError> {
    let version = format!("{}\n", template.node_version);
    ModuleRule::new("nvmrc", ".nvmrc", move |current, _, _| {
        Some(current.map(str::to_string).unwrap_or_else(|| version.clone()))
    })
}

/// Append template lines the file does not already contain. User lines, their order and
/// duplicates are kept; an already complete (or absent and unneeded) file is left as it is.
pub fn append_missing_lines(current: Option<&str>, template: &[String]) -> Option<String> {
    let existing: Vec<&str> = current.map(|c| c.lines().collect()).unwrap_or_default();
    let present: BTreeSet<&str> = existing.iter().map(|l| l.trim()).collect();
    let missing: Vec<&str> = template
        .iter()
        .map(String::as_str)
        .filter(|l| !present.contains(l.trim()))
        .collect();
    if missing.is_empty() {
        return current.map(str::to_string);
    }

    let newline = match current {
        Some(c) if c.contains("\r\n") => "\r\n",
        _ => "\n",
    };
    let merged = merge_raw(&json!(existing), &json!(missing));
    let mut out: Vec<&str> = merged
        .as_array()
        .map(|items| items.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    out.push("");
    Some(out.join(newline))
}
