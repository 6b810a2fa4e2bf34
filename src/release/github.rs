use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use log::{debug, info};
use regex::Regex;
use serde::Deserialize;

use super::cache::SizeCache;
use super::{RECENT_RELEASES, ReleaseSource};
use crate::fork::{Fork, ForkSpec};
use crate::http::{HttpClient, NonRetryableError};
use crate::runtime::Runtime;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_GITHUB_URL: &str = "https://github.com";

#[derive(Debug, Deserialize)]
struct GitHubRelease {
    tag_name: String,
    #[serde(default)]
    assets: Vec<GitHubAsset>,
}

#[derive(Debug, Deserialize)]
struct GitHubAsset {
    name: String,
}

/// Releases served by github.com and its REST API.
pub struct GitHubReleases<R: Runtime> {
    http: HttpClient,
    api_url: String,
    github_url: String,
    sizes: SizeCache<R>,
}

impl<R: Runtime> GitHubReleases<R> {
    pub fn new(
        http: HttpClient,
        api_url: Option<String>,
        github_url: Option<String>,
        sizes: SizeCache<R>,
    ) -> Self {
        let trim = |url: String| url.trim_end_matches('/').to_string();
        Self {
            http,
            api_url: trim(api_url.unwrap_or_else(|| DEFAULT_API_URL.to_string())),
            github_url: trim(github_url.unwrap_or_else(|| DEFAULT_GITHUB_URL.to_string())),
            sizes,
        }
    }

    async fn find_asset_via_api(&self, spec: &ForkSpec, tag: &str) -> Result<String> {
        let url = format!("{}/repos/{}/releases/tags/{}", self.api_url, spec.repo, tag);
        info!("Fetching release info from API: {}", url);
        let release: GitHubRelease = self.http.get_json(&url).await?;
        select_asset(spec, tag, &release.assets)
    }

    async fn find_asset_via_html(&self, spec: &ForkSpec, tag: &str) -> Result<String> {
        let expected = spec.asset_name(tag);
        let url = format!("{}/{}/releases/tag/{}", self.github_url, spec.repo, tag);
        info!("Fetching release page: {}", url);
        let page = self
            .http
            .get_text(&url)
            .await
            .with_context(|| format!("Failed to fetch release page for {}/{}", spec.repo, tag))?;

        if page.contains(&expected) {
            return Ok(expected);
        }
        debug!("Release page snippet: {}", page.chars().take(500).collect::<String>());
        bail!("Asset '{}' not found in {}/{}", expected, spec.repo, tag)
    }
}

/// Pick the archive from a release's asset list.
///
/// CachyOS publishes one archive per CPU level and only the plain x86_64
/// one is wanted. Other forks take the first archive with the expected
/// extension, then the first asset of any kind.
fn select_asset(spec: &ForkSpec, tag: &str, assets: &[GitHubAsset]) -> Result<String> {
    if spec.fork == Fork::CachyOs {
        let expected = spec.asset_name(tag);
        if let Some(asset) = assets.iter().find(|a| a.name == expected) {
            return Ok(asset.name.clone());
        }
    }
    assets
        .iter()
        .find(|a| a.name.to_lowercase().ends_with(spec.archive_extension))
        .or_else(|| assets.first())
        .map(|a| a.name.clone())
        .ok_or_else(|| anyhow!("No assets found in release {}", tag))
}

fn tag_from_release_url(url: &str) -> Result<String> {
    let pattern = Regex::new(r"/releases/tag/([^/?#]+)").context("Invalid release URL pattern")?;
    pattern
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| anyhow!("Could not determine latest tag from URL: {}", url))
}

#[async_trait]
impl<R: Runtime + 'static> ReleaseSource for GitHubReleases<R> {
    #[tracing::instrument(skip(self))]
    async fn latest_tag(&self, repo: &str) -> Result<String> {
        let url = format!("{}/{}/releases/latest", self.github_url, repo);
        let head = self
            .http
            .head(&url)
            .await
            .with_context(|| format!("Failed to fetch latest tag for {}", repo))?;
        let tag = tag_from_release_url(&head.url)?;
        info!("Found latest tag: {}", tag);
        Ok(tag)
    }

    #[tracing::instrument(skip(self, spec))]
    async fn find_asset(&self, spec: &ForkSpec, tag: &str) -> Result<String> {
        match self.find_asset_via_api(spec, tag).await {
            Ok(name) => {
                info!("Found asset via API: {}", name);
                Ok(name)
            }
            Err(api_error) => {
                debug!(
                    "API lookup failed ({:#}), falling back to the release page",
                    api_error
                );
                let name = self.find_asset_via_html(spec, tag).await.with_context(|| {
                    format!("Could not find asset for release {} in {}", tag, spec.repo)
                })?;
                info!("Found asset: {}", name);
                Ok(name)
            }
        }
    }

    #[tracing::instrument(skip(self))]
    async fn list_recent_releases(&self, repo: &str) -> Result<Vec<String>> {
        let url = format!("{}/repos/{}/releases", self.api_url, repo);
        let releases: Vec<GitHubRelease> = match self.http.get_json(&url).await {
            Ok(releases) => releases,
            Err(e) => {
                if let Some(NonRetryableError::RateLimitExceeded) = e.downcast_ref() {
                    return Err(e);
                }
                return Err(e.context(format!("Failed to fetch releases for {}", repo)));
            }
        };
        Ok(releases
            .into_iter()
            .map(|r| r.tag_name)
            .take(RECENT_RELEASES)
            .collect())
    }

    #[tracing::instrument(skip(self))]
    async fn remote_asset_size(&self, repo: &str, tag: &str, asset: &str) -> Result<u64> {
        if let Some(size) = self.sizes.get(repo, tag, asset) {
            debug!("Using cached size {} for {}", size, asset);
            return Ok(size);
        }

        let url = self.download_url(repo, tag, asset);
        info!("Getting remote asset size from: {}", url);
        let head = self
            .http
            .head(&url)
            .await
            .with_context(|| format!("Failed to get remote asset size for {}", asset))?;

        match head.content_length.filter(|&size| size > 0) {
            Some(size) => {
                self.sizes.put(repo, tag, asset, size);
                Ok(size)
            }
            None => bail!("Could not determine size of remote asset: {}", asset),
        }
    }

    fn download_url(&self, repo: &str, tag: &str, asset: &str) -> String {
        format!(
            "{}/{}/releases/download/{}/{}",
            self.github_url, repo, tag, asset
        )
    }
}
