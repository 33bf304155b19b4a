use std::path::PathBuf;

use serde::Serialize;
use vellum_core::Encoding;

/// One committed result document, as reported to the run's caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProducedOutput {
    pub path: PathBuf,
    pub media_type: String,
    pub encoding: Encoding,
}

/// Deferred operation that makes a staged write visible at its destination.
/// Recorded at staging time, executed in staging order by `complete`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CommitAction {
    MoveIntoPlace {
        staging: PathBuf,
        destination: PathBuf,
    },
    ReplaceWithBackup {
        staging: PathBuf,
        destination: PathBuf,
        backup: PathBuf,
    },
}

/// Deferred operation that reverses a staged write. Exactly one is recorded
/// per staged write, paired with its commit action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum UndoAction {
    DeleteStagingFile {
        staging: PathBuf,
    },
    DeleteStagingAndRestoreBackup {
        staging: PathBuf,
        destination: PathBuf,
        backup: PathBuf,
    },
}
