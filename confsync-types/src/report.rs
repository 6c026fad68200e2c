use crate::deps::DependencyReport;
use crate::ops::{FileOpKind, FileOperation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigureSummary {
    pub added: u64,
    pub modified: u64,
    pub deleted: u64,
    pub files_scanned: u64,
}

impl ConfigureSummary {
    pub fn from_operations(ops: &[FileOperation], files_scanned: u64) -> Self {
        let mut summary = ConfigureSummary {
            files_scanned,
            ..Default::default()
        };
        for op in ops {
            match op.kind {
                FileOpKind::Add => summary.added += 1,
                FileOpKind::Modify => summary.modified += 1,
                FileOpKind::Delete => summary.deleted += 1,
            }
        }
        summary
    }

    pub fn total(&self) -> u64 {
        self.added + self.modified + self.deleted
    }
}

/// Serializable report for one `configure` run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigureReport {
    pub schema: String,
    pub tool: ToolInfo,
    pub root: String,

    /// Whether the operations were written to disk.
    pub written: bool,

    #[serde(default)]
    pub operations: Vec<FileOperation>,

    #[serde(default, skip_serializing_if = "DependencyReport::is_empty")]
    pub dependencies: DependencyReport,

    pub summary: ConfigureSummary,
}

impl ConfigureReport {
    pub fn new(tool: ToolInfo, root: impl Into<String>) -> Self {
        Self {
            schema: crate::schema::CONFSYNC_CONFIGURE_V1.to_string(),
            tool,
            root: root.into(),
            written: false,
            operations: vec![],
            dependencies: DependencyReport::default(),
            summary: ConfigureSummary::default(),
        }
    }
}
