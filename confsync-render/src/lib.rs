//! Rendering helpers (plain text and markdown) for human-readable summaries.

use confsync_types::deps::{DependencyDiffMap, DependencyReport};
use confsync_types::patch::{PatchOutcome, PatchResult, UpgradeReport};
use confsync_types::report::ConfigureReport;

pub fn render_configure_text(report: &ConfigureReport) -> String {
    let mut out = String::new();
    if report.operations.is_empty() {
        out.push_str("Project files already match the template.\n");
        return out;
    }

    for op in &report.operations {
        out.push_str(&format!("{} {}\n", op.kind.code(), op.path));
    }
    out.push_str(&dependency_lines(&report.dependencies, ""));

    let s = &report.summary;
    let verb = if report.written { "applied" } else { "pending" };
    out.push_str(&format!(
        "\n{} changes {}: {} added, {} modified, {} deleted ({} files scanned)\n",
        s.total(),
        verb,
        s.added,
        s.modified,
        s.deleted,
        s.files_scanned
    ));
    out
}

pub fn render_configure_md(report: &ConfigureReport) -> String {
    let mut out = String::new();
    out.push_str("# confsync configure\n\n");
    let s = &report.summary;
    out.push_str(&format!(
        "- Added: {}\n- Modified: {}\n- Deleted: {}\n- Files scanned: {}\n- Written: `{}`\n\n",
        s.added, s.modified, s.deleted, s.files_scanned, report.written
    ));

    out.push_str("## Files\n\n");
    if report.operations.is_empty() {
        out.push_str("_No changes._\n");
        return out;
    }
    for op in &report.operations {
        out.push_str(&format!("- `{}` `{}`\n", op.kind.code(), op.path));
    }

    if !report.dependencies.is_empty() {
        out.push_str("\n## Dependencies\n\n");
        out.push_str(&dependency_lines(&report.dependencies, "- "));
    }
    out
}

pub fn render_upgrade_text(report: &UpgradeReport) -> String {
    let mut out = String::new();
    if report.patches.is_empty() {
        out.push_str(&format!("{}: no patches to evaluate\n", report.mode));
        return out;
    }

    for patch in &report.patches {
        out.push_str(&format!(
            "{:<8} {:<6} {}",
            patch.version,
            result_label(patch),
            patch.description
        ));
        if let PatchResult::Skip { reason } = &patch.result {
            out.push_str(&format!(" ({})", reason));
        }
        out.push('\n');
    }

    let s = &report.summary;
    out.push_str(&format!(
        "\n{}: {} evaluated, {} applied, {} skipped, {} errored\n",
        report.mode, s.evaluated, s.applied, s.skipped, s.errored
    ));
    if s.lint_violations > 0 {
        out.push_str(&format!(
            "{} patch(es) tried to modify the project in lint mode\n",
            s.lint_violations
        ));
    }
    if let Some(version) = &report.persisted_version {
        out.push_str(&format!("lastPatchedVersion is now {}\n", version));
    }
    out
}

pub fn render_upgrade_md(report: &UpgradeReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("# confsync {}\n\n", report.mode));
    let s = &report.summary;
    out.push_str(&format!(
        "- Evaluated: {}\n- Applied: {}\n- Skipped: {}\n- Errored: {}\n",
        s.evaluated, s.applied, s.skipped, s.errored
    ));
    if let Some(previous) = &report.previous_version {
        out.push_str(&format!("- Previous version: `{}`\n", previous));
    }
    if let Some(version) = &report.persisted_version {
        out.push_str(&format!("- Persisted version: `{}`\n", version));
    }
    out.push_str(&format!("- OK: `{}`\n\n", report.ok));

    out.push_str("## Patches\n\n");
    if report.patches.is_empty() {
        out.push_str("_No patches evaluated._\n");
        return out;
    }

    out.push_str("| Version | Result | Description | Reason |\n");
    out.push_str("|---|---|---|---|\n");
    for patch in &report.patches {
        let reason = match &patch.result {
            PatchResult::Skip { reason } => reason.as_str(),
            PatchResult::Apply => "",
        };
        out.push_str(&format!(
            "| `{}` | {} | {} | {} |\n",
            patch.version,
            result_label(patch),
            escape_cell(&patch.description),
            escape_cell(reason)
        ));
    }

    let errors: Vec<&PatchOutcome> = report.patches.iter().filter(|p| p.errored()).collect();
    if !errors.is_empty() {
        out.push_str("\n## Errors\n\n");
        for patch in errors {
            out.push_str(&format!(
                "- `{}`: {}\n",
                patch.version,
                patch.error.as_deref().unwrap_or_default()
            ));
        }
    }
    out
}

fn result_label(patch: &PatchOutcome) -> &'static str {
    match (&patch.result, patch.errored()) {
        (_, true) => "error",
        (PatchResult::Apply, _) => "apply",
        (PatchResult::Skip { .. }, _) => "skip",
    }
}

fn dependency_lines(report: &DependencyReport, prefix: &str) -> String {
    let mut out = String::new();
    let mut section = |name: &str, diffs: &DependencyDiffMap| {
        for (dep, diff) in diffs {
            out.push_str(&format!(
                "{}{} {} {} {}\n",
                prefix,
                name,
                diff.operation.code(),
                dep,
                diff.version
            ));
        }
    };
    section("dependencies", &report.dependencies);
    section("devDependencies", &report.dev_dependencies);
    out
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

#[cfg(test)]
mod tests {
    use super::*;
    use confsync_types::deps::{DependencyDiff, DependencyOperation};
    use confsync_types::ops::FileOperation;
    use confsync_types::patch::PatchMode;
    use confsync_types::report::{ConfigureSummary, ToolInfo};
    use pretty_assertions::assert_eq;

    fn configure_report() -> ConfigureReport {
        let mut report = ConfigureReport::new(
            ToolInfo {
                name: "confsync".to_string(),
                version: None,
            },
            ".",
        );
        report.operations = vec![
            FileOperation::delete(".eslintrc.json"),
            FileOperation::add(".nvmrc", "22\n".to_string()),
            FileOperation::modify("package.json", "{}\n".to_string()),
        ];
        report.summary = ConfigureSummary::from_operations(&report.operations, 12);
        report.dependencies.dev_dependencies.insert(
            "confsync".to_string(),
            DependencyDiff {
                operation: DependencyOperation::Added,
                version: "^2.0.0".to_string(),
            },
        );
        report
    }

    fn upgrade_report() -> UpgradeReport {
        let mut report = UpgradeReport::new(PatchMode::Format);
        report.patches = vec![
            PatchOutcome {
                version: "1.1.0".to_string(),
                description: "Rename a | b".to_string(),
                result: PatchResult::errored(),
                error: Some("boom".to_string()),
            },
            PatchOutcome {
                version: "1.2.0".to_string(),
                description: "Ignore .npmrc".to_string(),
                result: PatchResult::Apply,
                error: None,
            },
        ];
        report.summary.evaluated = 2;
        report.summary.applied = 1;
        report.summary.skipped = 1;
        report.summary.errored = 1;
        report.persisted_version = Some("1.2.0".to_string());
        report.ok = false;
        report
    }

    #[test]
    fn configure_text_lists_operations_and_summary() {
        assert_eq!(
            render_configure_text(&configure_report()),
            "D .eslintrc.json\nA .nvmrc\nM package.json\ndevDependencies A confsync ^2.0.0\n\n3 changes pending: 1 added, 1 modified, 1 deleted (12 files scanned)\n"
        );
    }

    #[test]
    fn configure_text_when_nothing_to_do() {
        let mut report = configure_report();
        report.operations.clear();
        assert_eq!(
            render_configure_text(&report),
            "Project files already match the template.\n"
        );
    }

    #[test]
    fn configure_md_has_dependency_section() {
        let md = render_configure_md(&configure_report());
        assert!(md.starts_with("# confsync configure\n\n- Added: 1\n"));
        assert!(md.contains("- `A` `.nvmrc`\n"));
        assert!(md.contains("## Dependencies\n\n- devDependencies A confsync ^2.0.0\n"));
    }

    #[test]
    fn upgrade_text_marks_errors() {
        assert_eq!(
            render_upgrade_text(&upgrade_report()),
            "1.1.0    error  Rename a | b (due to an error)\n1.2.0    apply  Ignore .npmrc\n\nformat: 2 evaluated, 1 applied, 1 skipped, 1 errored\nlastPatchedVersion is now 1.2.0\n"
        );
    }

    #[test]
    fn upgrade_md_escapes_cells_and_lists_errors() {
        let md = render_upgrade_md(&upgrade_report());
        assert!(md.contains("| `1.1.0` | error | Rename a \\| b | due to an error |\n"));
        assert!(md.contains("| `1.2.0` | apply | Ignore .npmrc |  |\n"));
        assert!(md.contains("## Errors\n\n- `1.1.0`: boom\n"));
        assert!(md.contains("- OK: `false`\n"));
    }

    #[test]
    fn empty_upgrade_renders_placeholder() {
        let report = UpgradeReport::new(PatchMode::Lint);
        assert_eq!(render_upgrade_text(&report), "lint: no patches to evaluate\n");
        assert!(render_upgrade_md(&report).ends_with("_No patches evaluated._\n"));
    }
}
