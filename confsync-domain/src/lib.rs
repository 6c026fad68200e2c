//! Domain logic: reconcile a project's generated files against the template.
//!
//! This crate owns *what* the files should look like. It does not own reading or writing
//! them; `confsync-core` takes the snapshot and `confsync-edit` applies the operations.

mod matcher;
mod registry;
pub mod rules;
mod template;

pub use matcher::{RuleError, RuleMatcher, RulePattern};
pub use registry::{ModuleRule, RuleRegistry, TransformFn, apply_to_file_set};
pub use template::{DEFAULT_NODE_VERSION, TOOL_PACKAGE, Template};

/// The built-in rule table for `template`, with `exclude` globs applied.
pub fn builtin_registry(template: Template, exclude: &[String]) -> Result<RuleRegistry, RuleError> {
    RuleRegistry::new(rules::builtin_rules(template)?)?.with_exclude(exclude.iter().map(String::as_str))
}
