//! Built-in versioned patches applied by `confsync lint` / `confsync format`.
//!
//! Every patch is idempotent: once its change is on disk it reports `Skip`. In lint mode a
//! patch reports `Apply` for a pending change without performing it.

use confsync_core::{Patch, PatchCatalog};

mod esm_config_modules;
mod gitignore_npmrc;
mod node_engine;
mod remove_lint_key;

pub use esm_config_modules::EsmConfigModulesPatch;
pub use gitignore_npmrc::GitignoreNpmrcPatch;
pub use node_engine::NodeEnginePatch;
pub use remove_lint_key::RemoveLintKeyPatch;

pub fn builtin_patches(node_version: &str) -> Vec<Box<dyn Patch>> {
    vec![
        Box::new(EsmConfigModulesPatch),
        Box::new(GitignoreNpmrcPatch),
        Box::new(NodeEnginePatch::new(node_version)),
        Box::new(RemoveLintKeyPatch),
    ]
}

pub fn builtin_catalog(node_version: &str) -> PatchCatalog {
    PatchCatalog::new(builtin_patches(node_version))
}
