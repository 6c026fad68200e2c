use serde::{Deserialize, Serialize};
use std::fmt;

/// Evaluation mode for the patch orchestrator.
///
/// - lint: dry check; a patch may only report what it would do
/// - format: apply; a patch performs the mutation it describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatchMode {
    Lint,
    Format,
}

impl PatchMode {
    pub fn is_lint(self) -> bool {
        matches!(self, PatchMode::Lint)
    }

    pub fn is_format(self) -> bool {
        matches!(self, PatchMode::Format)
    }
}

impl fmt::Display for PatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatchMode::Lint => f.write_str("lint"),
            PatchMode::Format => f.write_str("format"),
        }
    }
}

/// Result reported by a single patch invocation.
///
/// A `Skip` means nothing was written. An `Apply` in format mode means the described mutation
/// happened; in lint mode it means the mutation is pending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum PatchResult {
    Skip { reason: String },
    Apply,
}

impl PatchResult {
    /// Reason recorded when a patch raised an error instead of returning a result.
    pub const ERROR_REASON: &'static str = "due to an error";

    pub fn skip(reason: impl Into<String>) -> Self {
        PatchResult::Skip {
            reason: reason.into(),
        }
    }

    pub fn errored() -> Self {
        Self::skip(Self::ERROR_REASON)
    }

    pub fn is_apply(&self) -> bool {
        matches!(self, PatchResult::Apply)
    }

    pub fn is_skip(&self) -> bool {
        matches!(self, PatchResult::Skip { .. })
    }
}

/// Per-patch record kept by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchOutcome {
    pub version: String,
    pub description: String,
    #[serde(flatten)]
    pub result: PatchResult,

    /// Error chain when the patch raised instead of returning.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PatchOutcome {
    pub fn errored(&self) -> bool {
        self.error.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeSummary {
    pub evaluated: u64,
    pub applied: u64,
    pub skipped: u64,
    pub errored: u64,

    /// Lint-mode patches that tried to write or run a command.
    #[serde(default)]
    pub lint_violations: u64,
}

/// Serializable report for one orchestrator pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpgradeReport {
    pub schema: String,
    pub mode: PatchMode,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_version: Option<String>,

    /// Version persisted at the end of a format pass.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persisted_version: Option<String>,

    #[serde(default)]
    pub patches: Vec<PatchOutcome>,

    pub summary: UpgradeSummary,
    pub ok: bool,
}

impl UpgradeReport {
    pub fn new(mode: PatchMode) -> Self {
        Self {
            schema: crate::schema::CONFSYNC_UPGRADE_V1.to_string(),
            mode,
            previous_version: None,
            persisted_version: None,
            patches: vec![],
            summary: UpgradeSummary::default(),
            ok: true,
        }
    }
}
