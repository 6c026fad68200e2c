//! The configure pipeline: snapshot, diff, preview, write.
//!
//! One read pass builds the snapshot, the rule table computes the full target state, and
//! one write pass applies it. Nothing is written when the project drifted in between.

use crate::settings::ConfigureSettings;
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use confsync_domain::{RuleError, RuleRegistry, Template, builtin_registry};
use confsync_edit::{ApplyOptions, EditError, PreconditionError, render_patch, write_operations};
use confsync_merge::{DependencySet, diff_dependency_sets};
use confsync_types::deps::DependencyReport;
use confsync_types::ops::{FileOperation, FileSet};
use confsync_types::report::{ConfigureReport, ConfigureSummary, ToolInfo};
use fs_err as fs;
use ignore::WalkBuilder;
use serde_json::Value;
use std::collections::BTreeSet;
use std::io::ErrorKind;
use tracing::{debug, info, warn};

/// Pipeline error. Every variant maps to exit code 1.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("nothing written: {0}")]
    Precondition(#[from] PreconditionError),

    #[error("invalid rule table: {0}")]
    Rules(#[from] RuleError),

    #[error("{0:#}")]
    Internal(#[from] anyhow::Error),
}

impl From<EditError> for ToolError {
    fn from(err: EditError) -> Self {
        match err {
            EditError::Precondition(pre) => ToolError::Precondition(pre),
            EditError::Runtime(err) => ToolError::Internal(err),
        }
    }
}

/// Outcome of [`run_configure`].
#[derive(Debug, Clone)]
pub struct ConfigureOutcome {
    pub report: ConfigureReport,

    /// Unified diff of the operations against the snapshot.
    pub patch: String,
}

/// What the read pass saw.
#[derive(Debug, Clone, Default)]
pub struct ProjectSnapshot {
    /// Rule candidates and existing implied paths, by relative path.
    pub files: FileSet,

    /// Number of files walked.
    pub files_scanned: u64,

    /// Rule-relevant paths that exist but are not UTF-8. The diff never touches them.
    pub unreadable: BTreeSet<Utf8PathBuf>,
}

/// Reconcile the project at `settings.repo_root` with the built-in template.
pub fn run_configure(settings: &ConfigureSettings, tool: ToolInfo) -> Result<ConfigureOutcome, ToolError> {
    let template = Template::builtin(settings.project_type, &settings.node_version);
    let project_type = template.project_type;
    let registry = builtin_registry(template, &settings.exclude)?;

    let ProjectSnapshot {
        files: snapshot,
        files_scanned,
        unreadable,
    } = collect_snapshot(&settings.repo_root, &registry)?;
    info!(
        root = %settings.repo_root,
        scanned = files_scanned,
        candidates = snapshot.len(),
        "read project snapshot"
    );

    let mut operations = registry.diff(&snapshot);
    operations.retain(|op| {
        let keep = !unreadable.contains(&op.path);
        if !keep {
            warn!(path = %op.path, "not UTF-8; leaving as is");
        }
        keep
    });
    let patch = render_patch(&snapshot, &operations);
    let dependencies = dependency_report(&snapshot, &operations, project_type);

    let mut report = ConfigureReport::new(tool, settings.repo_root.as_str());
    report.summary = ConfigureSummary::from_operations(&operations, files_scanned);
    report.dependencies = dependencies;

    if operations.is_empty() {
        debug!("project already matches the template");
    } else {
        let opts = ApplyOptions {
            dry_run: settings.dry_run,
        };
        write_operations(&settings.repo_root, &snapshot, &operations, &opts)?;
        report.written = !settings.dry_run;
    }
    report.operations = operations;

    Ok(ConfigureOutcome { report, patch })
}

/// Read every file the rule table cares about.
///
/// The project is walked with `.gitignore` honoured and `node_modules`/`.git` skipped. Files
/// rules may create are read directly too, so an ignored but existing `.nvmrc` is seen rather
/// than clobbered.
pub fn collect_snapshot(
    root: &Utf8Path,
    registry: &RuleRegistry,
) -> anyhow::Result<ProjectSnapshot> {
    let mut snapshot = ProjectSnapshot::default();

    let walker = WalkBuilder::new(root)
        .hidden(false)
        .require_git(false)
        .filter_entry(|entry| !matches!(entry.file_name().to_str(), Some("node_modules" | ".git")))
        .build();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(error = %err, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        let Some(rel) = entry
            .path()
            .strip_prefix(root)
            .ok()
            .and_then(Utf8Path::from_path)
        else {
            debug!(path = %entry.path().display(), "skipping non-UTF-8 path");
            continue;
        };
        snapshot.files_scanned += 1;
        if registry.is_candidate(rel) {
            read_into(&mut snapshot, root, rel)?;
        }
    }

    for implied in registry.implied_paths() {
        let seen = snapshot.files.contains_key(&implied) || snapshot.unreadable.contains(&implied);
        if !seen && root.join(&implied).is_file() {
            read_into(&mut snapshot, root, &implied)?;
        }
    }

    Ok(snapshot)
}

fn read_into(
    snapshot: &mut ProjectSnapshot,
    root: &Utf8Path,
    rel: &Utf8Path,
) -> anyhow::Result<()> {
    let abs = root.join(rel);
    match fs::read_to_string(&abs) {
        Ok(contents) => {
            snapshot.files.insert(Utf8PathBuf::from(rel), contents);
            Ok(())
        }
        Err(err) if err.kind() == ErrorKind::InvalidData => {
            debug!(path = %rel, "not UTF-8");
            snapshot.unreadable.insert(Utf8PathBuf::from(rel));
            Ok(())
        }
        Err(err) => Err(err).with_context(|| format!("read {}", abs)),
    }
}

/// Dependency changes between the snapshot's `package.json` and the one the operations leave.
fn dependency_report(
    snapshot: &FileSet,
    operations: &[FileOperation],
    project_type: confsync_merge::ProjectType,
) -> DependencyReport {
    let manifest_path = Utf8Path::new("package.json");
    let Some(after) = operations
        .iter()
        .find(|op| op.path == manifest_path)
        .and_then(|op| op.content.as_deref())
    else {
        return DependencyReport::default();
    };
    let before = snapshot.get(manifest_path).map(String::as_str).unwrap_or("{}");

    let parse = |raw: &str| serde_json::from_str::<Value>(raw).unwrap_or(Value::Null);
    let old = DependencySet::from_manifest(&parse(before), project_type);
    let new = DependencySet::from_manifest(&parse(after), project_type);
    diff_dependency_sets(&old, &new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use confsync_types::deps::DependencyOperation;
    use confsync_types::ops::FileOpKind;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn tool() -> ToolInfo {
        ToolInfo {
            name: "confsync".to_string(),
            version: Some("0.1.0".to_string()),
        }
    }

    fn project(entries: &[(&str, &str)]) -> (TempDir, Utf8PathBuf) {
        let td = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(td.path().to_path_buf()).unwrap();
        for (path, contents) in entries {
            let abs = root.join(path);
            std::fs::create_dir_all(abs.parent().unwrap()).unwrap();
            std::fs::write(abs, contents).unwrap();
        }
        (td, root)
    }

    fn settings(root: &Utf8Path) -> ConfigureSettings {
        ConfigureSettings {
            repo_root: root.to_path_buf(),
            ..Default::default()
        }
    }

    const MANIFEST: &str = "{\n  \"name\": \"app\",\n  \"scripts\": {\n    \"lint\": \"confsync lint\",\n    \"format\": \"confsync format\"\n  },\n  \"engines\": {\n    \"node\": \">=22\"\n  },\n  \"dependencies\": {\n    \"confsync-cli\": \"^1.0.0\"\n  }\n}\n";

    #[test]
    fn snapshot_skips_node_modules_and_gitignored_files() {
        let (_td, root) = project(&[
            ("package.json", "{}"),
            ("node_modules/dep/package.json", "{}"),
            (".gitignore", "generated/\n"),
            ("generated/tsconfig.json", "{}"),
            ("src/index.ts", "export {};\n"),
        ]);
        let registry = builtin_registry(Template::default(), &[]).unwrap();
        let snapshot = collect_snapshot(&root, &registry).unwrap();

        assert_eq!(
            snapshot.files.keys().map(|p| p.as_str()).collect::<Vec<_>>(),
            vec![".gitignore", "package.json"]
        );
        assert_eq!(snapshot.files_scanned, 3);
    }

    #[test]
    fn ignored_but_existing_literal_paths_are_read() {
        let (_td, root) = project(&[(".gitignore", ".nvmrc\n"), (".nvmrc", "20\n")]);
        let registry = builtin_registry(Template::default(), &[]).unwrap();
        let snapshot = collect_snapshot(&root, &registry).unwrap();
        assert_eq!(snapshot.files.get(Utf8Path::new(".nvmrc")).map(String::as_str), Some("20\n"));
    }

    #[test]
    fn configure_writes_and_reports_dependency_moves() {
        let (_td, root) = project(&[("package.json", MANIFEST)]);

        let outcome = run_configure(&settings(&root), tool()).unwrap();
        let report = &outcome.report;

        assert!(report.written);
        assert_eq!(
            report
                .operations
                .iter()
                .map(|op| (op.path.as_str(), op.kind))
                .collect::<Vec<_>>(),
            vec![
                (".gitignore", FileOpKind::Add),
                (".nvmrc", FileOpKind::Add),
                (".prettierignore", FileOpKind::Add),
                ("package.json", FileOpKind::Modify),
            ]
        );
        assert_eq!(
            report.dependencies.dependencies["confsync-cli"].operation,
            DependencyOperation::Deleted
        );
        assert_eq!(
            report.dependencies.dev_dependencies["confsync"].operation,
            DependencyOperation::Added
        );
        assert!(outcome.patch.contains("+++ b/.nvmrc"));
        assert_eq!(std::fs::read_to_string(root.join(".nvmrc")).unwrap(), "22\n");

        let again = run_configure(&settings(&root), tool()).unwrap();
        assert!(again.report.operations.is_empty());
        assert!(!again.report.written);
    }

    #[test]
    fn dry_run_previews_without_writing() {
        let (_td, root) = project(&[("package.json", MANIFEST)]);
        let mut settings = settings(&root);
        settings.dry_run = true;

        let outcome = run_configure(&settings, tool()).unwrap();

        assert!(!outcome.report.written);
        assert_eq!(outcome.report.summary.added, 3);
        assert!(outcome.patch.contains("diff --git a/package.json b/package.json"));
        assert!(!root.join(".nvmrc").exists());
    }

    #[test]
    fn excluded_paths_are_left_alone() {
        let (_td, root) = project(&[("package.json", MANIFEST)]);
        let mut settings = settings(&root);
        settings.exclude = vec![".nvmrc".to_string(), "package.json".to_string()];

        let outcome = run_configure(&settings, tool()).unwrap();
        let paths: Vec<&str> = outcome.report.operations.iter().map(|op| op.path.as_str()).collect();
        assert_eq!(paths, vec![".gitignore", ".prettierignore"]);
        assert!(outcome.report.dependencies.is_empty());
    }

    #[test]
    fn existing_flat_eslint_config_is_kept_as_the_only_one() {
        let (_td, root) = project(&[
            ("package.json", MANIFEST),
            (".eslintrc.json", "{ \"root\": true }\n"),
            ("eslint.config.js", "export default [];\n"),
        ]);
        let mut settings = settings(&root);
        settings.dry_run = true;

        let outcome = run_configure(&settings, tool()).unwrap();
        let ops: Vec<(&str, FileOpKind)> = outcome
            .report
            .operations
            .iter()
            .map(|op| (op.path.as_str(), op.kind))
            .collect();

        assert!(ops.contains(&(".eslintrc.json", FileOpKind::Delete)));
        assert!(!ops.iter().any(|(path, _)| path.starts_with("eslint.config.")));
    }

    #[test]
    fn non_utf8_files_are_left_alone() {
        let (_td, root) = project(&[("package.json", MANIFEST)]);
        std::fs::write(root.join(".nvmrc"), [0xff, 0xfe, b'2', b'2']).unwrap();

        let outcome = run_configure(&settings(&root), tool()).unwrap();
        let paths: Vec<&str> = outcome.report.operations.iter().map(|op| op.path.as_str()).collect();

        assert_eq!(paths, vec![".gitignore", ".prettierignore", "package.json"]);
        assert!(outcome.report.written);
        assert_eq!(std::fs::read(root.join(".nvmrc")).unwrap(), vec![0xff, 0xfe, b'2', b'2']);
    }

    #[test]
    fn invalid_exclude_glob_is_a_rules_error() {
        let (_td, root) = project(&[]);
        let mut settings = settings(&root);
        settings.exclude = vec!["src/[".to_string()];
        assert!(matches!(run_configure(&settings, tool()), Err(ToolError::Rules(_))));
    }
}
