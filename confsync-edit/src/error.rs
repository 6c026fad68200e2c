//! Error types for confsync-edit.
//!
//! Distinguishes snapshot drift (the project changed between the read pass and the write
//! pass) from runtime failures such as I/O errors.

use camino::Utf8PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EditError {
    /// The project no longer matches the snapshot the operations were computed from.
    #[error("precondition failed: {0}")]
    Precondition(#[from] PreconditionError),

    #[error("runtime error: {0}")]
    Runtime(#[from] anyhow::Error),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PreconditionError {
    /// Files whose current contents differ from the snapshot.
    #[error("files changed since they were read: {}", join(.paths))]
    Drift { paths: Vec<Utf8PathBuf> },
}

fn join(paths: &[Utf8PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl EditError {
    pub fn is_precondition(&self) -> bool {
        matches!(self, EditError::Precondition(_))
    }
}

pub type EditResult<T> = Result<T, EditError>;
