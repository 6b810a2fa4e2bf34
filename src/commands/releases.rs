use anyhow::Result;
use log::info;
use std::io::Write;

use super::config::Config;
use crate::fork::Fork;
use crate::release::ReleaseSource;
use crate::runtime::Runtime;

/// Print the most recent release tags of `fork`.
#[tracing::instrument(skip(config, out))]
pub async fn list_releases<R: Runtime + 'static, W: Write>(
    config: &Config<R>,
    fork: Fork,
    out: &mut W,
) -> Result<()> {
    info!("Fetching recent releases...");
    let tags = config
        .releases
        .list_recent_releases(config.registry.spec(fork).repo)
        .await?;

    writeln!(out, "Recent releases:")?;
    for tag in tags {
        writeln!(out, "  {}", tag)?;
    }
    writeln!(out, "Success")?;
    Ok(())
}
