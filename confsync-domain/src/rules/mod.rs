//! Built-in template rules for `configure`, in registration order.

use crate::matcher::RuleError;
use crate::registry::ModuleRule;
use crate::template::Template;
use camino::Utf8Path;
use confsync_types::ops::FileSet;
use std::sync::Arc;

mod json;
mod modules;
mod text;

pub use json::{reconcile_manifest, write_json_like};
pub use modules::{ESLINT_FLAT_CONFIGS, ESLINT_LEGACY_CONFIGS, JEST_CONFIGS, PRETTIER_CONFIGS};
pub use text::append_missing_lines;

/// Build the built-in rule table for `template`.
pub fn builtin_rules(template: Template) -> Result<Vec<ModuleRule>, RuleError> {
    let template = Arc::new(template);
    let mut rules = Vec::new();

    rules.extend(text::ignore_file_rules(&template)?);
    rules.push(json::package_json_rule(&template)?);
    rules.push(json::tsconfig_rule(&template)?);
    rules.push(text::nvmrc_rule(&template)?);
    rules.push(modules::eslint_flat_existing_rule()?);
    rules.push(modules::eslint_flat_config_rule(&template)?);
    rules.push(modules::eslint_legacy_cleanup_rule()?);
    rules.extend(modules::jest_rules(&template)?);
    rules.extend(modules::prettier_rules(&template)?);

    Ok(rules)
}

/// Whether a config module at `path` may use ES module syntax in this project.
///
/// `.mjs`/`.mts`/`.ts` always can, `.cjs`/`.cts` never can, and `.js` can when `package.json`
/// declares `"type": "module"`.
pub fn supports_esm(path: &Utf8Path, files: &FileSet) -> bool {
    match path.extension() {
        Some("mjs" | "mts" | "ts") => true,
        Some("js") => package_type_is_module(files),
        _ => false,
    }
}

fn package_type_is_module(files: &FileSet) -> bool {
    files
        .get(Utf8Path::new("package.json"))
        .and_then(|raw| serde_json::from_str::<serde_json::Value>(raw).ok())
        .and_then(|manifest| {
            manifest
                .get("type")
                .and_then(|t| t.as_str())
                .map(|t| t == "module")
        })
        .unwrap_or(false)
}
