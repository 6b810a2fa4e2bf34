use anyhow::{Context, Result, anyhow};
use flate2::read::GzDecoder;
use log::{debug, info};
use std::io::Read;
use std::path::Path;
use tar::Archive;
use xz2::read::XzDecoder;

use super::{ArchiveExtractor, Compression};
use crate::runtime::Runtime;

/// Extracts `.tar.gz` and `.tar.xz` release archives.
#[derive(Debug, Default, Clone, Copy)]
pub struct TarExtractor;

impl ArchiveExtractor for TarExtractor {
    fn can_handle(&self, archive_path: &Path) -> bool {
        Compression::from_path(archive_path).is_some()
    }

    #[tracing::instrument(skip(self, runtime))]
    fn extract<R: Runtime + 'static>(
        &self,
        runtime: &R,
        archive_path: &Path,
        extract_to: &Path,
    ) -> Result<()> {
        let compression = Compression::from_path(archive_path).ok_or_else(|| {
            anyhow!("Unsupported archive format: {}", archive_path.display())
        })?;

        info!("Extracting {:?} into {:?}", archive_path, extract_to);
        let file = runtime.open(archive_path)?;
        let reader: Box<dyn Read> = match compression {
            Compression::Gzip => Box::new(GzDecoder::new(file)),
            Compression::Xz => Box::new(XzDecoder::new(file)),
        };

        let mut archive = Archive::new(reader);
        archive.set_preserve_permissions(true);
        archive
            .unpack(extract_to)
            .with_context(|| format!("Failed to extract archive {:?}", archive_path))?;

        debug!("Extraction of {:?} finished", archive_path);
        Ok(())
    }
}
