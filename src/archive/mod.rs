//! Release archive extraction.

mod tarball;

use crate::runtime::Runtime;
use anyhow::Result;
use std::path::Path;

pub use tarball::TarExtractor;

/// Compression wrapped around a release tarball.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    Gzip,
    Xz,
}

impl Compression {
    /// Detect the compression from the archive's file name.
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_lowercase();
        if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Some(Self::Gzip)
        } else if name.ends_with(".tar.xz") || name.ends_with(".txz") {
            Some(Self::Xz)
        } else {
            None
        }
    }
}

#[cfg_attr(test, mockall::automock)]
pub trait ArchiveExtractor: Send + Sync {
    fn can_handle(&self, archive_path: &Path) -> bool;

    /// Unpack `archive_path` into `extract_to`, which must already exist.
    fn extract<R: Runtime + 'static>(
        &self,
        runtime: &R,
        archive_path: &Path,
        extract_to: &Path,
    ) -> Result<()>;
}
