use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::runtime::Runtime;

pub const DEFAULT_EXTRACT_DIR: &str = "~/.steam/steam/compatibilitytools.d/";
pub const DEFAULT_OUTPUT_DIR: &str = "~/Downloads/";

/// Replace a leading `~` with the home directory.
pub fn expand_tilde<R: Runtime + ?Sized>(runtime: &R, path: &Path) -> Result<PathBuf> {
    let Ok(rest) = path.strip_prefix("~") else {
        return Ok(path.to_path_buf());
    };
    let home = runtime
        .home_dir()
        .context("Could not find home directory")?;
    Ok(home.join(rest))
}

/// `<cache dir>/protonfetcher`, where remote asset sizes are remembered.
#[tracing::instrument(skip(runtime))]
pub fn size_cache_dir<R: Runtime + ?Sized>(runtime: &R) -> Result<PathBuf> {
    let cache = match runtime.cache_dir() {
        Some(dir) => dir,
        None => runtime
            .home_dir()
            .context("Could not find home directory")?
            .join(".cache"),
    };
    Ok(cache.join("protonfetcher"))
}
