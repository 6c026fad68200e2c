//! Write pass for confsync file operations.
//!
//! Responsibilities:
//! - Record what the read pass saw (sha256 per touched path).
//! - Refuse to write when the project drifted from that snapshot.
//! - Write all operations, or generate a unified diff preview instead.

pub mod error;

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use confsync_types::ops::{FileOpKind, FileOperation, FileSet};
use diffy::PatchFormatter;
use fs_err as fs;
use sha2::{Digest, Sha256};

pub use error::{EditError, EditResult, PreconditionError};

#[derive(Debug, Clone, Default)]
pub struct ApplyOptions {
    pub dry_run: bool,
}

/// Expected state of one path before writing. `sha256: None` means the path must be absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePrecondition {
    pub path: Utf8PathBuf,
    pub sha256: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteOutcome {
    pub written: Vec<Utf8PathBuf>,
    pub deleted: Vec<Utf8PathBuf>,
}

/// Preconditions for every path touched by `ops`, derived from the read-pass snapshot.
pub fn snapshot_preconditions(original: &FileSet, ops: &[FileOperation]) -> Vec<FilePrecondition> {
    ops.iter()
        .map(|op| FilePrecondition {
            path: op.path.clone(),
            sha256: original.get(&op.path).map(|c| sha256_hex(c.as_bytes())),
        })
        .collect()
}

/// Check all preconditions against disk. Every mismatching path is reported.
pub fn check_preconditions(root: &Utf8Path, preconditions: &[FilePrecondition]) -> EditResult<()> {
    let mut drift = Vec::new();
    for pre in preconditions {
        let abs = abs_path(root, &pre.path);
        let actual = if abs.exists() {
            let bytes = fs::read(&abs).with_context(|| format!("read {}", abs))?;
            Some(sha256_hex(&bytes))
        } else {
            None
        };
        if actual != pre.sha256 {
            tracing::debug!(path = %pre.path, "snapshot drift");
            drift.push(pre.path.clone());
        }
    }

    if drift.is_empty() {
        Ok(())
    } else {
        Err(PreconditionError::Drift { paths: drift }.into())
    }
}

/// Write `ops` under `root`.
///
/// All preconditions are checked before the first write, so drift aborts the whole pass
/// with nothing touched. With `opts.dry_run` nothing is written.
pub fn write_operations(
    root: &Utf8Path,
    original: &FileSet,
    ops: &[FileOperation],
    opts: &ApplyOptions,
) -> EditResult<WriteOutcome> {
    check_preconditions(root, &snapshot_preconditions(original, ops))?;

    let mut outcome = WriteOutcome::default();
    if opts.dry_run {
        return Ok(outcome);
    }

    for op in ops {
        let abs = abs_path(root, &op.path);
        match (op.kind, &op.content) {
            (FileOpKind::Delete, _) => {
                fs::remove_file(&abs).with_context(|| format!("delete {}", abs))?;
                outcome.deleted.push(op.path.clone());
            }
            (_, Some(content)) => {
                if let Some(parent) = abs.parent() {
                    fs::create_dir_all(parent).with_context(|| format!("create {}", parent))?;
                }
                fs::write(&abs, content).with_context(|| format!("write {}", abs))?;
                outcome.written.push(op.path.clone());
            }
            (kind, None) => {
                return Err(anyhow::anyhow!("{} operation for {} has no content", kind.code(), op.path).into());
            }
        }
    }

    tracing::info!(
        written = outcome.written.len(),
        deleted = outcome.deleted.len(),
        "applied file operations"
    );
    Ok(outcome)
}

/// Unified diff of `ops` against the snapshot they were computed from.
pub fn render_patch(original: &FileSet, ops: &[FileOperation]) -> String {
    let mut out = String::new();
    let formatter = PatchFormatter::new();

    for op in ops {
        let old = original.get(&op.path).map(String::as_str).unwrap_or_default();
        let new = op.content.as_deref().unwrap_or_default();
        if old == new && op.kind == FileOpKind::Modify {
            continue;
        }

        let path = &op.path;
        out.push_str(&format!("diff --git a/{0} b/{0}\n", path));
        match op.kind {
            FileOpKind::Add => {
                out.push_str("new file mode 100644\n");
                out.push_str(&format!("--- /dev/null\n+++ b/{0}\n", path));
            }
            FileOpKind::Delete => {
                out.push_str("deleted file mode 100644\n");
                out.push_str(&format!("--- a/{0}\n+++ /dev/null\n", path));
            }
            FileOpKind::Modify => out.push_str(&format!("--- a/{0}\n+++ b/{0}\n", path)),
        }

        let patch = diffy::create_patch(old, new);
        let body = formatter.fmt_patch(&patch).to_string();
        // Drop diffy's own ---/+++ header; ours carries the git paths.
        let hunks = body.split_once("\n@@").map(|(_, rest)| format!("@@{rest}"));
        if let Some(hunks) = hunks {
            out.push_str(&hunks);
        }
        if !out.ends_with('\n') {
            out.push('\n');
        }
    }

    out
}

fn abs_path(root: &Utf8Path, rel: &Utf8Path) -> Utf8PathBuf {
    if rel.is_absolute() {
        rel.to_path_buf()
    } else {
        root.join(rel)
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
