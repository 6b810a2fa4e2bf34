//! Release discovery on GitHub.
//!
//! - `github` - [`GitHubReleases`], the real [`ReleaseSource`]
//! - `cache` - on-disk cache of remote asset sizes

mod cache;
mod github;

use anyhow::Result;
use async_trait::async_trait;

use crate::fork::ForkSpec;

pub use cache::{CACHE_MAX_AGE, SizeCache, cache_key};
pub use github::{DEFAULT_API_URL, DEFAULT_GITHUB_URL, GitHubReleases};

/// Number of tags shown by `--list`.
pub const RECENT_RELEASES: usize = 20;

/// Where releases, their assets and asset metadata come from.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReleaseSource: Send + Sync {
    /// Tag of the newest release of `repo`.
    async fn latest_tag(&self, repo: &str) -> Result<String>;

    /// Name of the archive to download for `tag`.
    async fn find_asset(&self, spec: &ForkSpec, tag: &str) -> Result<String>;

    /// Up to [`RECENT_RELEASES`] tags, newest first.
    async fn list_recent_releases(&self, repo: &str) -> Result<Vec<String>>;

    /// Size in bytes of a release asset.
    async fn remote_asset_size(&self, repo: &str, tag: &str, asset: &str) -> Result<u64>;

    fn download_url(&self, repo: &str, tag: &str, asset: &str) -> String;
}
