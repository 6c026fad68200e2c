use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Snapshot of file contents keyed by repo-relative path. Absent keys are absent files.
pub type FileSet = BTreeMap<Utf8PathBuf, String>;

/// Kind of change a [`FileOperation`] performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileOpKind {
    Add,
    Modify,
    Delete,
}

impl FileOpKind {
    /// Single-letter code used in summaries (`A`, `M`, `D`).
    pub fn code(self) -> char {
        match self {
            FileOpKind::Add => 'A',
            FileOpKind::Modify => 'M',
            FileOpKind::Delete => 'D',
        }
    }
}

/// One file-level change produced by the diff engine.
///
/// Operations are emitted once and consumed once by the writer; nothing mutates them in between.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileOperation {
    pub path: Utf8PathBuf,
    pub kind: FileOpKind,

    /// New contents. Always present for `Add`/`Modify`, absent for `Delete`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl FileOperation {
    pub fn add(path: impl Into<Utf8PathBuf>, content: String) -> Self {
        Self {
            path: path.into(),
            kind: FileOpKind::Add,
            content: Some(content),
        }
    }

    pub fn modify(path: impl Into<Utf8PathBuf>, content: String) -> Self {
        Self {
            path: path.into(),
            kind: FileOpKind::Modify,
            content: Some(content),
        }
    }

    pub fn delete(path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: FileOpKind::Delete,
            content: None,
        }
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}
