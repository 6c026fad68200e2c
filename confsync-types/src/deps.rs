use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How a dependency changed between two version maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DependencyOperation {
    #[serde(rename = "A")]
    Added,
    #[serde(rename = "M")]
    Modified,
    #[serde(rename = "D")]
    Deleted,
}

impl DependencyOperation {
    pub fn code(self) -> char {
        match self {
            DependencyOperation::Added => 'A',
            DependencyOperation::Modified => 'M',
            DependencyOperation::Deleted => 'D',
        }
    }
}

/// One entry of a dependency diff.
///
/// `version` is the new version for `A`, the removed version for `D`, and `"old -> new"` for `M`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyDiff {
    pub operation: DependencyOperation,
    pub version: String,
}

/// Name-keyed dependency diff, sorted by package name.
pub type DependencyDiffMap = BTreeMap<String, DependencyDiff>;

/// Dependency diffs for both manifest sections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyReport {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dependencies: DependencyDiffMap,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty", rename = "devDependencies")]
    pub dev_dependencies: DependencyDiffMap,
}

impl DependencyReport {
    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty() && self.dev_dependencies.is_empty()
    }
}
