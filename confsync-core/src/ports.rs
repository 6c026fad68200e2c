//! Port traits abstracting all I/O away from the orchestrator.

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use semver::Version;

/// The project's file tree. Paths are relative to the project root.
#[async_trait]
pub trait ProjectFs: Send + Sync {
    /// File contents, or `None` when the file does not exist.
    async fn read(&self, path: &Utf8Path) -> anyhow::Result<Option<String>>;

    /// Create or replace a file, creating parent directories as needed.
    async fn write(&self, path: &Utf8Path, contents: &str) -> anyhow::Result<()>;

    async fn remove(&self, path: &Utf8Path) -> anyhow::Result<()>;

    /// Whether a file or directory exists at `path`.
    async fn exists(&self, path: &Utf8Path) -> bool;
}

/// Package-manager command runner, run in the project root.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn exec(&self, cmd: &str, args: &[String]) -> anyhow::Result<()>;
}

/// Where `lastPatchedVersion` lives between runs.
#[async_trait]
pub trait VersionStore: Send + Sync {
    async fn load(&self) -> anyhow::Result<Option<Version>>;
    async fn store(&self, version: &Version) -> anyhow::Result<()>;
}

/// A lint-mode patch tried to mutate the project.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LintModeViolation {
    #[error("write to {path} attempted in lint mode")]
    Write { path: Utf8PathBuf },

    #[error("removal of {path} attempted in lint mode")]
    Remove { path: Utf8PathBuf },

    #[error("command `{command}` attempted in lint mode")]
    Exec { command: String },
}

impl LintModeViolation {
    /// Whether `err` (or anything in its chain) is a lint-mode violation.
    pub fn is_in(err: &anyhow::Error) -> bool {
        err.chain().any(|cause| cause.is::<LintModeViolation>())
    }
}
