//! Streams release archives into the output directory.

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use crate::fork::ForkSpec;
use crate::http::HttpClient;
use crate::release::ReleaseSource;
use crate::runtime::Runtime;

/// Fetches one asset of a release to disk.
pub struct Downloader<'a, R: Runtime, S: ReleaseSource + ?Sized> {
    runtime: &'a R,
    source: &'a S,
    http: &'a HttpClient,
}

impl<'a, R: Runtime, S: ReleaseSource + ?Sized> Downloader<'a, R, S> {
    pub fn new(runtime: &'a R, source: &'a S, http: &'a HttpClient) -> Self {
        Self {
            runtime,
            source,
            http,
        }
    }

    /// Download `asset` of `tag` into `output_dir` and return the archive path.
    ///
    /// An existing file whose size matches the remote one is reused as is.
    /// If the remote size cannot be determined the file is downloaded again.
    #[tracing::instrument(skip(self, spec))]
    pub async fn download_asset(
        &self,
        spec: &ForkSpec,
        tag: &str,
        asset: &str,
        output_dir: &Path,
    ) -> Result<PathBuf> {
        let archive = output_dir.join(asset);

        if self.runtime.exists(&archive) {
            match self.source.remote_asset_size(spec.repo, tag, asset).await {
                Ok(remote) => {
                    let local = self.runtime.file_size(&archive)?;
                    if local == remote {
                        info!(
                            "Local file {:?} already exists with matching size, skipping download",
                            archive
                        );
                        return Ok(archive);
                    }
                    info!(
                        "Local file size ({}) differs from remote ({}), downloading again",
                        local, remote
                    );
                }
                Err(e) => warn!("Could not check remote size of {}: {:#}", asset, e),
            }
        }

        let url = self.source.download_url(spec.repo, tag, asset);
        info!("Downloading {} to {:?}", url, archive);

        let progress = progress_bar();
        let result = self
            .http
            .download_file(
                &url,
                || {
                    self.runtime
                        .create_file(&archive)
                        .with_context(|| format!("Failed to create {:?}", archive))
                },
                &progress,
            )
            .await;
        progress.finish_and_clear();

        let bytes = result.with_context(|| format!("Failed to download {}", url))?;
        info!("Downloaded {} ({} bytes)", asset, bytes);
        Ok(archive)
    }
}

/// A byte progress bar on interactive terminals, hidden otherwise.
fn progress_bar() -> ProgressBar {
    if !std::io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(0);
    let style = ProgressStyle::with_template(
        "[{elapsed_precise}] {bar:40.cyan/blue} {bytes}/{total_bytes} ({bytes_per_sec})",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("#>-");
    bar.set_style(style);
    bar
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fork::{Fork, ForkRegistry};
    use crate::release::MockReleaseSource;
    use crate::runtime::{MockRuntime, RealRuntime};
    use mockall::predicate::eq;
    use reqwest::Client;
    use tempfile::tempdir;

    const TAG: &str = "GE-Proton10-20";
    const ASSET: &str = "GE-Proton10-20.tar.gz";

    fn source_for(server_url: String) -> MockReleaseSource {
        let mut source = MockReleaseSource::new();
        source
            .expect_download_url()
            .returning(move |repo, tag, asset| {
                format!("{}/{}/releases/download/{}/{}", server_url, repo, tag, asset)
            });
        source
    }

    #[tokio::test]
    async fn test_download_asset_writes_archive() {
        // --- Setup ---
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock(
                "GET",
                "/GloriousEggroll/proton-ge-custom/releases/download/GE-Proton10-20/GE-Proton10-20.tar.gz",
            )
            .with_status(200)
            .with_body("archive bytes")
            .create_async()
            .await;
        let dir = tempdir().unwrap();
        let registry = ForkRegistry::builtin().unwrap();
        let source = source_for(server.url());
        let http = HttpClient::new(Client::new());

        // --- Execute & Verify ---
        let archive = Downloader::new(&RealRuntime, &source, &http)
            .download_asset(registry.spec(Fork::GeProton), TAG, ASSET, dir.path())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(archive, dir.path().join(ASSET));
        assert_eq!(std::fs::read(&archive).unwrap(), b"archive bytes");
    }

    #[tokio::test]
    async fn test_download_asset_skips_matching_local_file() {
        // --- Setup ---
        let output = PathBuf::from("/downloads");
        let archive = output.join(ASSET);
        let registry = ForkRegistry::builtin().unwrap();

        let mut runtime = MockRuntime::new();
        runtime
            .expect_exists()
            .with(eq(archive.clone()))
            .returning(|_| true);
        runtime
            .expect_file_size()
            .with(eq(archive.clone()))
            .returning(|_| Ok(1024));
        // No create_file expectation: a download would panic

        let mut source = MockReleaseSource::new();
        source
            .expect_remote_asset_size()
            .with(
                eq("GloriousEggroll/proton-ge-custom"),
                eq(TAG),
                eq(ASSET),
            )
            .returning(|_, _, _| Ok(1024));

        let http = HttpClient::new(Client::new());

        // --- Execute & Verify ---
        let result = Downloader::new(&runtime, &source, &http)
            .download_asset(registry.spec(Fork::GeProton), TAG, ASSET, &output)
            .await
            .unwrap();
        assert_eq!(result, archive);
    }

    #[tokio::test]
    async fn test_download_asset_replaces_size_mismatch() {
        // --- Setup ---
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock(
                "GET",
                "/GloriousEggroll/proton-ge-custom/releases/download/GE-Proton10-20/GE-Proton10-20.tar.gz",
            )
            .with_status(200)
            .with_body("complete archive")
            .create_async()
            .await;
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(ASSET), b"partial").unwrap();

        let registry = ForkRegistry::builtin().unwrap();
        let mut source = source_for(server.url());
        source
            .expect_remote_asset_size()
            .returning(|_, _, _| Ok(16));
        let http = HttpClient::new(Client::new());

        // --- Execute & Verify ---
        let archive = Downloader::new(&RealRuntime, &source, &http)
            .download_asset(registry.spec(Fork::GeProton), TAG, ASSET, dir.path())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(std::fs::read(&archive).unwrap(), b"complete archive");
    }

    #[tokio::test]
    async fn test_download_asset_not_found() {
        // --- Setup ---
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock(
                "GET",
                "/GloriousEggroll/proton-ge-custom/releases/download/GE-Proton10-20/GE-Proton10-20.tar.gz",
            )
            .with_status(404)
            .create_async()
            .await;
        let dir = tempdir().unwrap();
        let registry = ForkRegistry::builtin().unwrap();
        let source = source_for(server.url());
        let http = HttpClient::new(Client::new());

        // --- Execute & Verify ---
        let err = Downloader::new(&RealRuntime, &source, &http)
            .download_asset(registry.spec(Fork::GeProton), TAG, ASSET, dir.path())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to download"));
        assert!(!dir.path().join(ASSET).exists());
    }
}
