use anyhow::Result;
use std::io::Write;

use super::config::Config;
use crate::fetcher::Fetcher;
use crate::fork::Fork;
use crate::link::RootLock;
use crate::runtime::Runtime;

/// Install a release of `fork` and refresh its links.
#[tracing::instrument(skip(config, out))]
pub async fn fetch<R: Runtime + 'static, W: Write>(
    config: &Config<R>,
    fork: Fork,
    release: Option<&str>,
    out: &mut W,
) -> Result<()> {
    config.runtime.create_dir_all(&config.extract_dir)?;
    let _lock = RootLock::acquire(&config.extract_dir)?;

    Fetcher::new(
        &*config.runtime,
        &config.registry,
        &config.releases,
        &config.http,
        &config.extractor,
    )
    .fetch_and_extract(fork, &config.output_dir, &config.extract_dir, release)
    .await?;

    writeln!(out, "Success")?;
    Ok(())
}
