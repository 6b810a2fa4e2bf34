//! Advisory lock serializing link changes under one install root.

use anyhow::{Context, Result};
use fs4::fs_std::FileExt;
use log::debug;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

/// Name of the lock file. No fork's tag shape matches it, so scans skip it.
pub const LOCK_FILE: &str = ".protonfetcher.lock";

/// Exclusive lock on `<root>/.protonfetcher.lock`, released on drop.
#[derive(Debug)]
pub struct RootLock {
    path: PathBuf,
    file: File,
}

impl RootLock {
    /// Block until the lock for `root` is held. `root` must already exist.
    pub fn acquire(root: &Path) -> Result<Self> {
        let path = root.join(LOCK_FILE);
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .with_context(|| format!("Failed to open lock file {:?}", path))?;
        file.lock_exclusive()
            .with_context(|| format!("Failed to acquire lock {:?}", path))?;
        debug!("Acquired {:?}", path);
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RootLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
        debug!("Released {:?}", self.path);
    }
}
