//! Write-pass tests against on-disk projects.

use camino::{Utf8Path, Utf8PathBuf};
use confsync_edit::{ApplyOptions, EditError, PreconditionError, render_patch, write_operations};
use confsync_types::ops::{FileOperation, FileSet};
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::TempDir;

fn project(entries: &[(&str, &str)]) -> (TempDir, Utf8PathBuf, FileSet) {
    let td = tempfile::tempdir().expect("tempdir");
    let root = Utf8PathBuf::from_path_buf(td.path().to_path_buf()).expect("utf8 tempdir");
    let mut snapshot = FileSet::new();
    for (path, content) in entries {
        fs::write(root.join(path), content).unwrap();
        snapshot.insert(Utf8PathBuf::from(*path), content.to_string());
    }
    (td, root, snapshot)
}

fn read(root: &Utf8Path, path: &str) -> Option<String> {
    fs::read_to_string(root.join(path)).ok()
}

fn ops() -> Vec<FileOperation> {
    vec![
        FileOperation::delete(".eslintrc.json"),
        FileOperation::add(".nvmrc", "22\n".to_string()),
        FileOperation::modify(".gitignore", "node_modules/\ndist/\n".to_string()),
    ]
}

#[test]
fn writes_all_operations() {
    let (_td, root, snapshot) = project(&[(".eslintrc.json", "{}\n"), (".gitignore", "node_modules/\n")]);

    let outcome = write_operations(&root, &snapshot, &ops(), &ApplyOptions::default()).unwrap();

    assert_eq!(outcome.deleted, vec![Utf8PathBuf::from(".eslintrc.json")]);
    assert_eq!(outcome.written.len(), 2);
    assert_eq!(read(&root, ".eslintrc.json"), None);
    assert_eq!(read(&root, ".nvmrc").as_deref(), Some("22\n"));
    assert_eq!(read(&root, ".gitignore").as_deref(), Some("node_modules/\ndist/\n"));
}

#[test]
fn creates_parent_directories() {
    let (_td, root, snapshot) = project(&[]);
    let ops = vec![FileOperation::add(".github/workflows/ci.yml", "on: push\n".to_string())];
    write_operations(&root, &snapshot, &ops, &ApplyOptions::default()).unwrap();
    assert_eq!(read(&root, ".github/workflows/ci.yml").as_deref(), Some("on: push\n"));
}

#[test]
fn dry_run_writes_nothing() {
    let (_td, root, snapshot) = project(&[(".eslintrc.json", "{}\n"), (".gitignore", "node_modules/\n")]);

    let outcome = write_operations(&root, &snapshot, &ops(), &ApplyOptions { dry_run: true }).unwrap();

    assert!(outcome.written.is_empty());
    assert_eq!(read(&root, ".eslintrc.json").as_deref(), Some("{}\n"));
    assert_eq!(read(&root, ".nvmrc"), None);
}

#[test]
fn drift_aborts_before_any_write() {
    let (_td, root, snapshot) = project(&[(".eslintrc.json", "{}\n"), (".gitignore", "node_modules/\n")]);
    // Someone edits the file and creates .nvmrc between read and write.
    fs::write(root.join(".gitignore"), "changed\n").unwrap();
    fs::write(root.join(".nvmrc"), "18\n").unwrap();

    let err = write_operations(&root, &snapshot, &ops(), &ApplyOptions::default()).unwrap_err();

    match err {
        EditError::Precondition(PreconditionError::Drift { paths }) => {
            assert_eq!(paths, vec![Utf8PathBuf::from(".nvmrc"), Utf8PathBuf::from(".gitignore")]);
        }
        other => panic!("expected drift, got {other}"),
    }
    assert_eq!(read(&root, ".eslintrc.json").as_deref(), Some("{}\n"));
    assert_eq!(read(&root, ".nvmrc").as_deref(), Some("18\n"));
}

#[test]
fn patch_preview_uses_git_headers() {
    let mut snapshot = FileSet::new();
    snapshot.insert(".gitignore".into(), "node_modules/\n".to_string());
    snapshot.insert(".eslintrc.json".into(), "{}\n".to_string());

    let patch = render_patch(&snapshot, &ops());

    assert!(patch.contains("diff --git a/.eslintrc.json b/.eslintrc.json\ndeleted file mode 100644\n--- a/.eslintrc.json\n+++ /dev/null\n"));
    assert!(patch.contains("new file mode 100644\n--- /dev/null\n+++ b/.nvmrc\n@@"));
    assert!(patch.contains("+22\n"));
    assert!(patch.contains("--- a/.gitignore\n+++ b/.gitignore\n@@"));
    assert!(patch.contains(" node_modules/\n+dist/\n"));
}
