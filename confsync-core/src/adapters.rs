//! Default port implementations: tokio-backed, in-memory, and the lint-mode guards.

use crate::ports::{CommandRunner, LintModeViolation, ProjectFs, VersionStore};
use anyhow::Context;
use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use confsync_types::ops::FileSet;
use semver::Version;
use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Project files on disk under `root`, via `tokio::fs`.
#[derive(Debug, Clone)]
pub struct TokioFs {
    root: Utf8PathBuf,
}

impl TokioFs {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    fn abs(&self, rel: &Utf8Path) -> Utf8PathBuf {
        if rel.is_absolute() {
            rel.to_path_buf()
        } else {
            self.root.join(rel)
        }
    }
}

#[async_trait]
impl ProjectFs for TokioFs {
    async fn read(&self, path: &Utf8Path) -> anyhow::Result<Option<String>> {
        let abs = self.abs(path);
        match tokio::fs::read_to_string(&abs).await {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err).with_context(|| format!("read {}", abs)),
        }
    }

    async fn write(&self, path: &Utf8Path, contents: &str) -> anyhow::Result<()> {
        let abs = self.abs(path);
        if let Some(parent) = abs.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("create parent dir for {}", abs))?;
        }
        tokio::fs::write(&abs, contents)
            .await
            .with_context(|| format!("write {}", abs))
    }

    async fn remove(&self, path: &Utf8Path) -> anyhow::Result<()> {
        let abs = self.abs(path);
        tokio::fs::remove_file(&abs)
            .await
            .with_context(|| format!("remove {}", abs))
    }

    async fn exists(&self, path: &Utf8Path) -> bool {
        tokio::fs::try_exists(self.abs(path)).await.unwrap_or(false)
    }
}

/// In-memory project for embedding and testing.
///
/// Directories are implied by file paths; [`InMemoryFs::with_dir`] adds an empty one
/// (e.g. `.git`). Every mutation is recorded in order.
#[derive(Debug, Default)]
pub struct InMemoryFs {
    files: Mutex<FileSet>,
    dirs: BTreeSet<Utf8PathBuf>,
    mutations: Mutex<Vec<Utf8PathBuf>>,
}

impl InMemoryFs {
    pub fn new(files: FileSet) -> Self {
        Self {
            files: Mutex::new(files),
            ..Default::default()
        }
    }

    pub fn from_entries<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self::new(
            entries
                .into_iter()
                .map(|(path, contents)| (Utf8PathBuf::from(path), contents.to_string()))
                .collect(),
        )
    }

    pub fn with_dir(mut self, path: impl Into<Utf8PathBuf>) -> Self {
        self.dirs.insert(path.into());
        self
    }

    pub fn snapshot(&self) -> FileSet {
        lock(&self.files).clone()
    }

    pub fn get(&self, path: &str) -> Option<String> {
        lock(&self.files).get(Utf8Path::new(path)).cloned()
    }

    /// Paths written or removed so far, in order.
    pub fn mutations(&self) -> Vec<Utf8PathBuf> {
        lock(&self.mutations).clone()
    }
}

#[async_trait]
impl ProjectFs for InMemoryFs {
    async fn read(&self, path: &Utf8Path) -> anyhow::Result<Option<String>> {
        Ok(lock(&self.files).get(path).cloned())
    }

    async fn write(&self, path: &Utf8Path, contents: &str) -> anyhow::Result<()> {
        lock(&self.files).insert(path.to_path_buf(), contents.to_string());
        lock(&self.mutations).push(path.to_path_buf());
        Ok(())
    }

    async fn remove(&self, path: &Utf8Path) -> anyhow::Result<()> {
        if lock(&self.files).remove(path).is_none() {
            anyhow::bail!("remove {}: no such file", path);
        }
        lock(&self.mutations).push(path.to_path_buf());
        Ok(())
    }

    async fn exists(&self, path: &Utf8Path) -> bool {
        if self.dirs.contains(path) {
            return true;
        }
        lock(&self.files)
            .keys()
            .any(|file| file == path || file.starts_with(path))
    }
}

/// Runs package-manager commands as child processes in `root`.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    root: Utf8PathBuf,
}

impl ProcessRunner {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn exec(&self, cmd: &str, args: &[String]) -> anyhow::Result<()> {
        let rendered = render_command(cmd, args);
        debug!(command = %rendered, cwd = %self.root, "running command");
        let status = tokio::process::Command::new(cmd)
            .args(args)
            .current_dir(&self.root)
            .status()
            .await
            .with_context(|| format!("spawn `{}`", rendered))?;
        if !status.success() {
            anyhow::bail!("`{}` exited with {}", rendered, status);
        }
        Ok(())
    }
}

/// Records commands instead of running them.
#[derive(Debug, Default)]
pub struct RecordingRunner {
    calls: Mutex<Vec<String>>,
}

impl RecordingRunner {
    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn exec(&self, cmd: &str, args: &[String]) -> anyhow::Result<()> {
        lock(&self.calls).push(render_command(cmd, args));
        Ok(())
    }
}

/// Read-through view that refuses every mutation. Handed to patches in lint mode.
pub struct ReadOnlyFs<'a> {
    inner: &'a dyn ProjectFs,
}

impl<'a> ReadOnlyFs<'a> {
    pub fn new(inner: &'a dyn ProjectFs) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl ProjectFs for ReadOnlyFs<'_> {
    async fn read(&self, path: &Utf8Path) -> anyhow::Result<Option<String>> {
        self.inner.read(path).await
    }

    async fn write(&self, path: &Utf8Path, _contents: &str) -> anyhow::Result<()> {
        Err(LintModeViolation::Write {
            path: path.to_path_buf(),
        }
        .into())
    }

    async fn remove(&self, path: &Utf8Path) -> anyhow::Result<()> {
        Err(LintModeViolation::Remove {
            path: path.to_path_buf(),
        }
        .into())
    }

    async fn exists(&self, path: &Utf8Path) -> bool {
        self.inner.exists(path).await
    }
}

/// Command runner that refuses everything. Handed to patches in lint mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct RefusingRunner;

#[async_trait]
impl CommandRunner for RefusingRunner {
    async fn exec(&self, cmd: &str, args: &[String]) -> anyhow::Result<()> {
        Err(LintModeViolation::Exec {
            command: render_command(cmd, args),
        }
        .into())
    }
}

/// Version store held in memory.
#[derive(Debug, Default)]
pub struct InMemoryVersionStore {
    version: Mutex<Option<Version>>,
}

impl InMemoryVersionStore {
    pub fn new(version: Option<Version>) -> Self {
        Self {
            version: Mutex::new(version),
        }
    }

    pub fn current(&self) -> Option<Version> {
        lock(&self.version).clone()
    }
}

#[async_trait]
impl VersionStore for InMemoryVersionStore {
    async fn load(&self) -> anyhow::Result<Option<Version>> {
        Ok(self.current())
    }

    async fn store(&self, version: &Version) -> anyhow::Result<()> {
        *lock(&self.version) = Some(version.clone());
        Ok(())
    }
}

fn render_command(cmd: &str, args: &[String]) -> String {
    std::iter::once(cmd)
        .chain(args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn tokio_fs_reads_missing_as_none_and_creates_parents() {
        let td = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(td.path().to_path_buf()).unwrap();
        let fs = TokioFs::new(root.clone());

        assert_eq!(fs.read(Utf8Path::new("nope.json")).await.unwrap(), None);
        fs.write(Utf8Path::new(".github/workflows/ci.yml"), "on: push\n")
            .await
            .unwrap();
        assert!(fs.exists(Utf8Path::new(".github")).await);
        assert_eq!(
            fs.read(Utf8Path::new(".github/workflows/ci.yml")).await.unwrap().as_deref(),
            Some("on: push\n")
        );

        fs.remove(Utf8Path::new(".github/workflows/ci.yml")).await.unwrap();
        assert!(!fs.exists(Utf8Path::new(".github/workflows/ci.yml")).await);
    }

    #[tokio::test]
    async fn in_memory_fs_records_mutations() {
        let fs = InMemoryFs::from_entries([("a/b.txt", "1")]).with_dir(".git");
        assert!(fs.exists(Utf8Path::new("a")).await);
        assert!(fs.exists(Utf8Path::new(".git")).await);
        assert!(!fs.exists(Utf8Path::new("a/b")).await);

        fs.write(Utf8Path::new("c.txt"), "2").await.unwrap();
        fs.remove(Utf8Path::new("a/b.txt")).await.unwrap();
        assert!(fs.remove(Utf8Path::new("a/b.txt")).await.is_err());

        assert_eq!(
            fs.mutations(),
            vec![Utf8PathBuf::from("c.txt"), Utf8PathBuf::from("a/b.txt")]
        );
    }

    #[tokio::test]
    async fn read_only_fs_refuses_writes_but_reads_through() {
        let inner = InMemoryFs::from_entries([("package.json", "{}")]);
        let guarded = ReadOnlyFs::new(&inner);

        assert_eq!(
            guarded.read(Utf8Path::new("package.json")).await.unwrap().as_deref(),
            Some("{}")
        );
        let err = guarded.write(Utf8Path::new("package.json"), "[]").await.unwrap_err();
        assert!(LintModeViolation::is_in(&err));
        let err = guarded.remove(Utf8Path::new("package.json")).await.unwrap_err();
        assert!(LintModeViolation::is_in(&err));
        assert!(inner.mutations().is_empty());
    }

    #[tokio::test]
    async fn refusing_runner_names_the_command() {
        let err = RefusingRunner
            .exec("pnpm", &["install".to_string()])
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "command `pnpm install` attempted in lint mode");
    }

    #[tokio::test]
    async fn recording_runner_keeps_calls() {
        let runner = RecordingRunner::default();
        runner.exec("npm", &["install".to_string()]).await.unwrap();
        assert_eq!(runner.calls(), vec!["npm install".to_string()]);
    }
}
