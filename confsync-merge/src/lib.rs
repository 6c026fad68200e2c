//! Dependency and manifest merging.
//!
//! Two merge policies over JSON values:
//! - [`merge`]: deduplicating, sorted union of arrays.
//! - [`merge_raw`]: ordered concatenation of arrays, for lists whose order matters.
//!
//! Plus [`diff_dependencies`] for reporting how dependency versions changed, and
//! [`migrate_dependencies`] for data-driven renames and section moves.

mod deps;
mod value;

pub use deps::{
    DependencyMap, DependencyMigrations, DependencySet, ProjectType, Rename, diff_dependencies,
    diff_dependency_sets, migrate_dependencies,
};
pub use value::{compare_values, merge, merge_raw, missing_entries};
