//! End-to-end fetch: resolve a release, download it, unpack it and relink.

use anyhow::{Context, Result};
use log::info;
use std::path::{Path, PathBuf};

use crate::archive::ArchiveExtractor;
use crate::download::Downloader;
use crate::fork::{Fork, ForkRegistry};
use crate::http::HttpClient;
use crate::link::{LinkManager, ReleaseRemover};
use crate::release::ReleaseSource;
use crate::runtime::{Runtime, ensure_directory_is_writable};

pub struct Fetcher<'a, R, S, E>
where
    R: Runtime + 'static,
    S: ReleaseSource + ?Sized,
    E: ArchiveExtractor,
{
    runtime: &'a R,
    registry: &'a ForkRegistry,
    source: &'a S,
    http: &'a HttpClient,
    extractor: &'a E,
}

impl<'a, R, S, E> Fetcher<'a, R, S, E>
where
    R: Runtime + 'static,
    S: ReleaseSource + ?Sized,
    E: ArchiveExtractor,
{
    pub fn new(
        runtime: &'a R,
        registry: &'a ForkRegistry,
        source: &'a S,
        http: &'a HttpClient,
        extractor: &'a E,
    ) -> Self {
        Self {
            runtime,
            registry,
            source,
            http,
            extractor,
        }
    }

    /// Install `release` (or the latest release) of `fork` and update its links.
    ///
    /// Returns the release directory under `extract_dir`. When that directory
    /// already exists nothing is downloaded and the links are only touched
    /// if they are out of date.
    #[tracing::instrument(skip(self))]
    pub async fn fetch_and_extract(
        &self,
        fork: Fork,
        output_dir: &Path,
        extract_dir: &Path,
        release: Option<&str>,
    ) -> Result<PathBuf> {
        let spec = self.registry.spec(fork);
        let is_manual_release = release.is_some();

        ensure_directory_is_writable(self.runtime, output_dir)?;
        ensure_directory_is_writable(self.runtime, extract_dir)?;

        let tag = match release {
            Some(tag) => tag.to_string(),
            None => {
                info!("Fetching latest {} release...", fork);
                self.source.latest_tag(spec.repo).await?
            }
        };
        info!("Using {} release {}", fork, tag);

        if let Some(dir) = self.installed(extract_dir, &tag, fork, is_manual_release)? {
            return Ok(dir);
        }

        let asset = self.source.find_asset(spec, &tag).await?;
        let archive = Downloader::new(self.runtime, self.source, self.http)
            .download_asset(spec, &tag, &asset, output_dir)
            .await?;

        // Another run may have unpacked the release while we downloaded
        if let Some(dir) = self.installed(extract_dir, &tag, fork, is_manual_release)? {
            return Ok(dir);
        }

        self.extractor
            .extract(self.runtime, &archive, extract_dir)
            .with_context(|| format!("Failed to extract {} release {}", fork, tag))?;

        self.links()
            .manage_proton_links(extract_dir, &tag, fork, is_manual_release)?;

        let dir = self
            .remover()
            .locate(extract_dir, &tag, fork)
            .unwrap_or_else(|| extract_dir.join(&tag));
        info!("{} {} is installed at {:?}", fork, tag, dir);
        Ok(dir)
    }

    /// The release directory if `tag` is already unpacked, after bringing
    /// the links up to date.
    fn installed(
        &self,
        extract_dir: &Path,
        tag: &str,
        fork: Fork,
        is_manual_release: bool,
    ) -> Result<Option<PathBuf>> {
        let Some(dir) = self.remover().locate(extract_dir, tag, fork) else {
            return Ok(None);
        };
        info!("{:?} already exists, skipping download and extraction", dir);

        let links = self.links();
        if links.are_links_up_to_date(extract_dir, tag, fork, is_manual_release)? {
            info!("{} links are already up to date", fork);
        } else {
            links.manage_proton_links(extract_dir, tag, fork, is_manual_release)?;
        }
        Ok(Some(dir))
    }

    fn links(&self) -> LinkManager<'a, R> {
        LinkManager::new(self.runtime, self.registry)
    }

    fn remover(&self) -> ReleaseRemover<'a, R> {
        ReleaseRemover::new(self.runtime, self.registry)
    }
}
