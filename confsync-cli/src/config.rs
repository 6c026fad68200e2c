//! Configuration file loading for confsync.
//!
//! Discovers and loads `confsync.toml` from the project root.
//! Merges config file settings with CLI arguments (CLI takes precedence).

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use confsync_core::PackageManager;
use confsync_domain::DEFAULT_NODE_VERSION;
use confsync_merge::ProjectType;
use fs_err as fs;
use serde::Deserialize;
use tracing::debug;

/// The config file name to search for.
pub const CONFIG_FILE_NAME: &str = "confsync.toml";

/// Top-level configuration from confsync.toml.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConfsyncConfig {
    /// Project facts the template and patches depend on.
    pub project: ProjectConfig,

    /// Settings for `confsync configure`.
    pub configure: ConfigureConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// `application` or `package`.
    #[serde(rename = "type")]
    pub project_type: Option<ProjectType>,

    /// Skips lockfile detection when set.
    pub package_manager: Option<PackageManager>,

    /// Major Node.js version written to `.nvmrc` and `engines.node`.
    pub node_version: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConfigureConfig {
    /// Globs the configure diff never touches.
    pub exclude: Vec<String>,
}

/// Discover the confsync.toml config file.
///
/// Returns `None` if the project root has no config file.
pub fn discover_config(repo_root: &Utf8Path) -> Option<Utf8PathBuf> {
    let config_path = repo_root.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        debug!("found config file at {}", config_path);
        Some(config_path)
    } else {
        debug!("no config file found at {}", config_path);
        None
    }
}

/// Load and parse a confsync.toml config file.
pub fn load_config(path: &Utf8Path) -> anyhow::Result<ConfsyncConfig> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config file {}", path))?;
    parse_config(&contents).with_context(|| format!("parse config file {}", path))
}

pub fn parse_config(contents: &str) -> anyhow::Result<ConfsyncConfig> {
    let config: ConfsyncConfig = toml::from_str(contents).context("invalid TOML")?;
    Ok(config)
}

/// Load config from the project root, or return the default if there is none.
pub fn load_or_default(repo_root: &Utf8Path) -> anyhow::Result<ConfsyncConfig> {
    match discover_config(repo_root) {
        Some(path) => load_config(&path),
        None => Ok(ConfsyncConfig::default()),
    }
}

/// Config file and CLI arguments folded together.
#[derive(Debug, Clone)]
pub struct MergedConfig {
    pub project_type: ProjectType,
    pub package_manager: Option<PackageManager>,
    pub node_version: String,

    /// Exclude globs (from config file, extended by CLI).
    pub exclude: Vec<String>,
}

/// Builder for merging config file with CLI arguments.
pub struct ConfigMerger {
    config: ConfsyncConfig,
}

impl ConfigMerger {
    pub fn new(config: ConfsyncConfig) -> Self {
        Self { config }
    }

    /// Merge with `configure` arguments. Scalars from the CLI win; CLI excludes extend the
    /// config file list.
    pub fn merge_configure_args(
        self,
        cli_type: Option<ProjectType>,
        cli_node_version: Option<&str>,
        cli_exclude: &[String],
    ) -> MergedConfig {
        let mut exclude = self.config.configure.exclude.clone();
        for pattern in cli_exclude {
            if !exclude.contains(pattern) {
                exclude.push(pattern.clone());
            }
        }

        let mut merged = self.merge_upgrade_args(None, cli_node_version);
        if let Some(project_type) = cli_type {
            merged.project_type = project_type;
        }
        merged.exclude = exclude;
        merged
    }

    /// Merge with `lint`/`format` arguments.
    pub fn merge_upgrade_args(
        self,
        cli_package_manager: Option<PackageManager>,
        cli_node_version: Option<&str>,
    ) -> MergedConfig {
        let project = self.config.project;
        MergedConfig {
            project_type: project.project_type.unwrap_or_default(),
            package_manager: cli_package_manager.or(project.package_manager),
            node_version: cli_node_version
                .map(str::to_string)
                .or(project.node_version)
                .unwrap_or_else(|| DEFAULT_NODE_VERSION.to_string()),
            exclude: Vec::new(),
        }
    }
}
