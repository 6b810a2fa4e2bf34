use log::debug;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::runtime::Runtime;

/// How long a cached size stays valid, measured from the file's mtime.
pub const CACHE_MAX_AGE: Duration = Duration::from_secs(3600);

#[derive(Debug, Serialize, Deserialize)]
struct CachedSize {
    size: u64,
    timestamp: f64,
    repo: String,
    tag: String,
    asset_name: String,
}

/// File name of the cache entry for one asset.
pub fn cache_key(repo: &str, tag: &str, asset: &str) -> String {
    let digest = Sha256::digest(format!("{}_{}_{}_size", repo, tag, asset).as_bytes());
    format!("{:x}", digest)
}

/// Remote asset sizes remembered under `<cache dir>/protonfetcher`.
pub struct SizeCache<R: Runtime> {
    runtime: Arc<R>,
    dir: PathBuf,
}

impl<R: Runtime> SizeCache<R> {
    pub fn new(runtime: Arc<R>, dir: PathBuf) -> Self {
        Self { runtime, dir }
    }

    pub fn dir(&self) -> &std::path::Path {
        &self.dir
    }

    /// The cached size, if present, fresh and well formed.
    pub fn get(&self, repo: &str, tag: &str, asset: &str) -> Option<u64> {
        let path = self.dir.join(cache_key(repo, tag, asset));
        if !self.runtime.exists(&path) {
            return None;
        }
        let modified = self.runtime.modified(&path).ok()?;
        let age = SystemTime::now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO);
        if age >= CACHE_MAX_AGE {
            debug!("Size cache entry {:?} expired", path);
            return None;
        }
        let bytes = self.runtime.read(&path).ok()?;
        match serde_json::from_slice::<CachedSize>(&bytes) {
            Ok(entry) => Some(entry.size),
            Err(e) => {
                debug!("Ignoring invalid size cache entry {:?}: {}", path, e);
                None
            }
        }
    }

    /// Remember `size`. Failures are logged and otherwise ignored.
    pub fn put(&self, repo: &str, tag: &str, asset: &str, size: u64) {
        let entry = CachedSize {
            size,
            timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs_f64())
                .unwrap_or_default(),
            repo: repo.to_string(),
            tag: tag.to_string(),
            asset_name: asset.to_string(),
        };
        let path = self.dir.join(cache_key(repo, tag, asset));
        let result = serde_json::to_vec(&entry)
            .map_err(anyhow::Error::from)
            .and_then(|bytes| {
                self.runtime.create_dir_all(&self.dir)?;
                self.runtime.write(&path, &bytes)
            });
        if let Err(e) = result {
            debug!("Failed to write size cache {:?}: {:#}", path, e);
        }
    }
}
