use crate::ports::ProjectFs;
use camino::Utf8Path;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// JavaScript package manager used for install commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageManager {
    #[default]
    Npm,
    Pnpm,
    Yarn,
}

impl PackageManager {
    pub const ALL: [PackageManager; 3] = [PackageManager::Pnpm, PackageManager::Yarn, PackageManager::Npm];

    pub fn command(self) -> &'static str {
        match self {
            PackageManager::Npm => "npm",
            PackageManager::Pnpm => "pnpm",
            PackageManager::Yarn => "yarn",
        }
    }

    pub fn lockfile(self) -> &'static str {
        match self {
            PackageManager::Npm => "package-lock.json",
            PackageManager::Pnpm => "pnpm-lock.yaml",
            PackageManager::Yarn => "yarn.lock",
        }
    }

    pub fn install_args(self) -> Vec<String> {
        vec!["install".to_string()]
    }

    /// Pick the manager whose lockfile is present; npm when there is none.
    pub async fn detect(fs: &dyn ProjectFs) -> Self {
        for manager in Self::ALL {
            if fs.exists(Utf8Path::new(manager.lockfile())).await {
                tracing::debug!(manager = %manager, "detected package manager from lockfile");
                return manager;
            }
        }
        PackageManager::default()
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.command())
    }
}

impl FromStr for PackageManager {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "npm" => Ok(PackageManager::Npm),
            "pnpm" => Ok(PackageManager::Pnpm),
            "yarn" => Ok(PackageManager::Yarn),
            other => Err(format!("unknown package manager `{other}` (expected npm, pnpm or yarn)")),
        }
    }
}
