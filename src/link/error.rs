use std::path::PathBuf;

use crate::fork::Fork;

/// Failures of the link core that callers may want to tell apart.
///
/// These travel inside `anyhow::Error`; recover them with
/// `err.downcast_ref::<LinkError>()`.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("Release directory does not exist: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to scan {}: {reason}", root.display())]
    Scan { root: PathBuf, reason: String },

    #[error("No valid {fork} versions found in {} to relink", root.display())]
    NoVersions { fork: Fork, root: PathBuf },
}
