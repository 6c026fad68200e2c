//! Versioned patch orchestrator.
//!
//! `select -> evaluate each patch in ascending version order -> aggregate -> persist`.
//!
//! - Only patches newer than the recorded `lastPatchedVersion` run (all of them when there
//!   is no record).
//! - A patch that returns an error is recorded as `Skip("due to an error")`; the remaining
//!   patches still run.
//! - In lint mode patches get a read-only fs and a refusing command runner, so an attempted
//!   mutation surfaces as a [`LintModeViolation`] error instead of touching the project.
//! - The highest processed version is persisted once, at the end of a format pass.

use crate::adapters::{ReadOnlyFs, RefusingRunner};
use crate::package_manager::PackageManager;
use crate::pipeline::ToolError;
use crate::ports::{CommandRunner, LintModeViolation, ProjectFs, VersionStore};
use crate::settings::UpgradeSettings;
use crate::tasks::run_sequentially;
use anyhow::Context;
use async_trait::async_trait;
use camino::Utf8Path;
use confsync_types::patch::{PatchMode, PatchOutcome, PatchResult, UpgradeReport};
use semver::Version;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

const MANIFEST: &str = "package.json";

/// Identity of a patch: the release it ships with and what it does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatchMeta {
    pub version: Version,
    pub description: String,
}

impl PatchMeta {
    pub fn new(version: Version, description: impl Into<String>) -> Self {
        Self {
            version,
            description: description.into(),
        }
    }
}

/// Read-only view handed to every patch invocation.
pub struct PatchContext<'a> {
    pub mode: PatchMode,

    /// Parsed `package.json` as it is on disk when the patch starts, if it is readable.
    pub manifest: Option<Value>,
    pub package_manager: PackageManager,
    pub fs: &'a dyn ProjectFs,
    pub runner: &'a dyn CommandRunner,
}

impl PatchContext<'_> {
    /// Raw `package.json` text, for patches that rewrite it in its own style.
    pub async fn manifest_text(&self) -> anyhow::Result<String> {
        self.fs
            .read(Utf8Path::new(MANIFEST))
            .await?
            .context("package.json disappeared")
    }

    /// Run the package manager's install command.
    pub async fn install(&self) -> anyhow::Result<()> {
        self.runner
            .exec(
                self.package_manager.command(),
                &self.package_manager.install_args(),
            )
            .await
    }
}

/// A versioned, idempotent migration.
///
/// `apply` must leave the project untouched when it returns `Skip`, and in lint mode it must
/// only report what it would do.
#[async_trait]
pub trait Patch: Send + Sync {
    fn meta(&self) -> PatchMeta;

    async fn apply(&self, ctx: &PatchContext<'_>) -> anyhow::Result<PatchResult>;
}

/// Flat catalog of patches, kept in ascending version order.
#[derive(Default)]
pub struct PatchCatalog {
    patches: Vec<Box<dyn Patch>>,
}

impl PatchCatalog {
    pub fn new(mut patches: Vec<Box<dyn Patch>>) -> Self {
        patches.sort_by(|a, b| a.meta().version.cmp(&b.meta().version));
        Self { patches }
    }

    pub fn patches(&self) -> &[Box<dyn Patch>] {
        &self.patches
    }

    pub fn metas(&self) -> Vec<PatchMeta> {
        self.patches.iter().map(|p| p.meta()).collect()
    }

    /// Patches strictly newer than `last`, ascending. Everything when `last` is `None`.
    pub fn applicable(&self, last: Option<&Version>) -> Vec<&dyn Patch> {
        self.patches
            .iter()
            .filter(|p| last.is_none_or(|last| p.meta().version > *last))
            .map(|p| p.as_ref())
            .collect()
    }
}

/// Outcome of [`run_upgrade`].
#[derive(Debug, Clone)]
pub struct UpgradeOutcome {
    pub report: UpgradeReport,
}

impl UpgradeOutcome {
    /// No patch errored, and in lint mode no patch has a pending change.
    pub fn ok(&self) -> bool {
        self.report.ok
    }
}

struct Pass {
    report: UpgradeReport,
    highest: Option<Version>,
}

/// Run one orchestrator pass over `catalog`.
pub async fn run_upgrade(
    settings: &UpgradeSettings,
    catalog: &PatchCatalog,
    fs: &dyn ProjectFs,
    runner: &dyn CommandRunner,
    store: &dyn VersionStore,
) -> Result<UpgradeOutcome, ToolError> {
    let mode = settings.mode;
    let previous = store.load().await.context("read lastPatchedVersion")?;
    let selected = catalog.applicable(previous.as_ref());
    info!(
        mode = %mode,
        previous = %previous.as_ref().map(ToString::to_string).unwrap_or_default(),
        selected = selected.len(),
        "selected patches"
    );

    let package_manager = match settings.package_manager {
        Some(pm) => pm,
        None => PackageManager::detect(fs).await,
    };

    let read_only = ReadOnlyFs::new(fs);
    let (patch_fs, patch_runner): (&dyn ProjectFs, &dyn CommandRunner) = if mode.is_lint() {
        (&read_only, &RefusingRunner)
    } else {
        (fs, runner)
    };

    let mut initial = UpgradeReport::new(mode);
    initial.previous_version = previous.as_ref().map(ToString::to_string);
    let pass = run_sequentially(
        selected,
        Pass {
            report: initial,
            highest: None,
        },
        move |mut pass, patch| async move {
            let meta = patch.meta();
            let ctx = PatchContext {
                mode,
                manifest: read_manifest(patch_fs).await,
                package_manager,
                fs: patch_fs,
                runner: patch_runner,
            };
            let (outcome, violation) = evaluate(patch, &meta, &ctx).await;
            record(&mut pass.report, outcome, violation);
            pass.highest = Some(meta.version);
            pass
        },
    )
    .await;

    let Pass { mut report, highest } = pass;
    report.ok = report.summary.errored == 0 && !(mode.is_lint() && report.summary.applied > 0);

    if mode.is_format()
        && let Some(version) = highest
    {
        store
            .store(&version)
            .await
            .with_context(|| format!("persist lastPatchedVersion {}", version))?;
        info!(version = %version, "recorded lastPatchedVersion");
        report.persisted_version = Some(version.to_string());
    }

    Ok(UpgradeOutcome { report })
}

/// Run one patch, turning an error into `Skip("due to an error")`. The flag reports whether
/// the error was a lint-mode violation.
async fn evaluate(patch: &dyn Patch, meta: &PatchMeta, ctx: &PatchContext<'_>) -> (PatchOutcome, bool) {
    let mut outcome = PatchOutcome {
        version: meta.version.to_string(),
        description: meta.description.clone(),
        result: PatchResult::errored(),
        error: None,
    };
    let mut violation = false;
    match patch.apply(ctx).await {
        Ok(result) => {
            debug!(version = %meta.version, result = ?result, "patch evaluated");
            outcome.result = result;
        }
        Err(err) => {
            violation = LintModeViolation::is_in(&err);
            debug!(version = %meta.version, error = %format!("{err:#}"), "patch failed");
            warn!(
                version = %meta.version,
                description = %meta.description,
                lint_violation = violation,
                "patch skipped {}",
                PatchResult::ERROR_REASON
            );
            outcome.error = Some(format!("{err:#}"));
        }
    }
    (outcome, violation)
}

fn record(report: &mut UpgradeReport, outcome: PatchOutcome, lint_violation: bool) {
    let summary = &mut report.summary;
    summary.evaluated += 1;
    if outcome.errored() {
        summary.errored += 1;
    }
    if lint_violation {
        summary.lint_violations += 1;
    }
    match outcome.result {
        PatchResult::Apply => summary.applied += 1,
        PatchResult::Skip { .. } => summary.skipped += 1,
    }
    report.patches.push(outcome);
}

async fn read_manifest(fs: &dyn ProjectFs) -> Option<Value> {
    match fs.read(Utf8Path::new(MANIFEST)).await {
        Ok(Some(raw)) => serde_json::from_str(&raw)
            .inspect_err(|err| debug!(error = %err, "package.json is not valid JSON"))
            .ok(),
        Ok(None) => None,
        Err(err) => {
            debug!(error = %format!("{err:#}"), "cannot read package.json");
            None
        }
    }
}
