//! Embeddable core library for confsync.
//!
//! Provides the clap-free entry points behind the `confsync` binary.
//!
//! # Port traits
//!
//! All orchestrator I/O goes through the traits in [`ports`]:
//! - [`ProjectFs`](ports::ProjectFs): read and write project files
//! - [`CommandRunner`](ports::CommandRunner): run package-manager commands
//! - [`VersionStore`](ports::VersionStore): load and persist `lastPatchedVersion`
//!
//! The [`adapters`] module provides tokio-backed and in-memory implementations, plus the
//! read-only fs and refusing runner that lint mode hands to patches.
//!
//! # Entry points
//!
//! - [`run_configure`](pipeline::run_configure): reconcile project files with the template
//! - [`run_upgrade`](upgrade::run_upgrade): run the versioned patch catalog in lint or format mode

pub mod adapters;
pub mod package_manager;
pub mod pipeline;
pub mod ports;
pub mod settings;
pub mod tasks;
pub mod upgrade;
pub mod version;

pub use package_manager::PackageManager;
pub use pipeline::{ConfigureOutcome, ToolError, run_configure};
pub use upgrade::{Patch, PatchCatalog, PatchContext, PatchMeta, UpgradeOutcome, run_upgrade};

// Re-export the result types so patch authors don't need confsync-types directly.
pub use confsync_types::patch::{PatchMode, PatchResult};
