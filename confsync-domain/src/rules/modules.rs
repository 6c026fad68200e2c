use super::supports_esm;
use crate::matcher::RuleError;
use crate::registry::ModuleRule;
use crate::template::Template;
use camino::Utf8Path;
use confsync_ast::{Dialect, ExportShape, Property, PropertyList, appender, filter, rewrite_config, transform};
use confsync_types::ops::FileSet;
use std::sync::Arc;

pub const ESLINT_FLAT_CONFIGS: [&str; 4] = [
    "eslint.config.js",
    "eslint.config.mjs",
    "eslint.config.cjs",
    "eslint.config.ts",
];

pub const ESLINT_LEGACY_CONFIGS: [&str; 3] = [".eslintrc.js", ".eslintrc.cjs", ".eslintrc.json"];

pub const JEST_CONFIGS: [&str; 4] = [
    "jest.config.js",
    "jest.config.ts",
    "jest.config.cjs",
    "jest.config.mjs",
];

pub const PRETTIER_CONFIGS: [&str; 5] = [
    "prettier.config.js",
    "prettier.config.cjs",
    "prettier.config.mjs",
    ".prettierrc.js",
    ".prettierrc.cjs",
];

const CREATED_ESLINT_CONFIG: &str = "eslint.config.mjs";

fn any_present(files: &FileSet, paths: &[&str]) -> bool {
    paths.iter().any(|p| files.contains_key(Utf8Path::new(p)))
}

/// Keep existing flat configs other than the one this tool creates. Registering them makes
/// them candidates, so the rules below see them in the working set.
pub(super) fn eslint_flat_existing_rule() -> Result<ModuleRule, RuleError> {
    ModuleRule::new("eslint-flat-existing", "eslint.config.{js,cjs,ts}", |current, _, _| {
        current.map(str::to_string)
    })
}

/// Create a flat ESLint config for projects migrating off a legacy `.eslintrc.*`.
pub(super) fn eslint_flat_config_rule(template: &Arc<Template>) -> Result<ModuleRule, RuleError> {
    let content = template.eslint_config.clone();
    ModuleRule::new("eslint-flat-config", CREATED_ESLINT_CONFIG, move |current, working, original| {
        if let Some(existing) = current {
            return Some(existing.to_string());
        }
        if any_present(working, &ESLINT_FLAT_CONFIGS) || !any_present(original, &ESLINT_LEGACY_CONFIGS) {
            return None;
        }
        Some(content.clone())
    })
}

/// Delete legacy `.eslintrc.*` files once a flat config exists.
pub(super) fn eslint_legacy_cleanup_rule() -> Result<ModuleRule, RuleError> {
    ModuleRule::new("eslint-legacy-cleanup", ".eslintrc.{js,cjs,json}", |current, working, _| {
        if any_present(working, &ESLINT_FLAT_CONFIGS) {
            None
        } else {
            current.map(str::to_string)
        }
    })
}

pub(super) fn jest_rules(template: &Arc<Template>) -> Result<Vec<ModuleRule>, RuleError> {
    JEST_CONFIGS
        .iter()
        .map(|&path| {
            let t = Arc::clone(template);
            ModuleRule::new("jest-config", path, move |current, working, original| {
                let current = current?;
                if !original.contains_key(Utf8Path::new(path)) {
                    return Some(current.to_string());
                }
                let preset = Property::string("preset", &t.jest_preset);
                // A user-chosen preset is kept.
                let ensure_preset = move |shape: &ExportShape, props: PropertyList| {
                    if props.iter().any(|p| p.key() == "preset") {
                        props
                    } else {
                        appender([preset])(shape, props)
                    }
                };
                rewrite_module(path, current, working, ensure_preset)
            })
        })
        .collect()
}

pub(super) fn prettier_rules(template: &Arc<Template>) -> Result<Vec<ModuleRule>, RuleError> {
    PRETTIER_CONFIGS
        .iter()
        .map(|&path| {
            let t = Arc::clone(template);
            ModuleRule::new("prettier-config", path, move |current, _, _| {
                let current = current?;
                let keys = t.prettier_keys.clone();
                let supported_only = move |shape: &ExportShape, props: PropertyList| {
                    // Spreads of shared configs are kept.
                    let spreads: Vec<String> = props
                        .iter()
                        .map(Property::key)
                        .filter(|k| k.starts_with("..."))
                        .map(str::to_string)
                        .collect();
                    filter(keys.into_iter().chain(spreads))(shape, props)
                };
                let dialect = Dialect::from_path(Utf8Path::new(path));
                match transform(current, dialect, supported_only) {
                    Ok(out) => Some(out),
                    Err(err) => {
                        tracing::warn!(path, error = %err, "cannot parse config module; leaving as is");
                        Some(current.to_string())
                    }
                }
            })
        })
        .collect()
}

/// Normalize (when the module may use ESM) and transform a config module, passing it
/// through unchanged on parse failure.
fn rewrite_module<F>(path: &str, current: &str, working: &FileSet, prop_transform: F) -> Option<String>
where
    F: FnOnce(&ExportShape, PropertyList) -> PropertyList,
{
    let rel = Utf8Path::new(path);
    let dialect = Dialect::from_path(rel);
    let result = if supports_esm(rel, working) {
        rewrite_config(current, dialect, prop_transform)
    } else {
        transform(current, dialect, prop_transform)
    };
    match result {
        Ok(out) => Some(out),
        Err(err) => {
            tracing::warn!(path, error = %err, "cannot parse config module; leaving as is");
            Some(current.to_string())
        }
    }
}
