//! Clap-free settings for the configure and upgrade pipelines.

use crate::package_manager::PackageManager;
use camino::Utf8PathBuf;
use confsync_domain::DEFAULT_NODE_VERSION;
use confsync_merge::ProjectType;
use confsync_types::patch::PatchMode;

/// Settings for the configure pipeline.
#[derive(Debug, Clone)]
pub struct ConfigureSettings {
    pub repo_root: Utf8PathBuf,
    pub project_type: ProjectType,
    pub node_version: String,

    /// Globs (relative to `repo_root`) the diff never touches.
    pub exclude: Vec<String>,

    /// Compute and preview operations without writing them.
    pub dry_run: bool,
}

impl Default for ConfigureSettings {
    fn default() -> Self {
        Self {
            repo_root: Utf8PathBuf::from("."),
            project_type: ProjectType::default(),
            node_version: DEFAULT_NODE_VERSION.to_string(),
            exclude: Vec::new(),
            dry_run: false,
        }
    }
}

/// Settings for one orchestrator pass.
#[derive(Debug, Clone)]
pub struct UpgradeSettings {
    pub repo_root: Utf8PathBuf,
    pub mode: PatchMode,

    /// Detected from lockfiles when `None`.
    pub package_manager: Option<PackageManager>,
}

impl Default for UpgradeSettings {
    fn default() -> Self {
        Self {
            repo_root: Utf8PathBuf::from("."),
            mode: PatchMode::Lint,
            package_manager: None,
        }
    }
}
