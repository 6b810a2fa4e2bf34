use anyhow::Result;
use log::info;
use std::io::Write;

use super::config::Config;
use crate::fork::Fork;
use crate::link::{LinkError, LinkManager, RootLock};
use crate::runtime::Runtime;

/// Delete an installed release and hand its links to the next-best versions.
#[tracing::instrument(skip(config, out))]
pub fn remove<R: Runtime + 'static, W: Write>(
    config: &Config<R>,
    fork: Fork,
    tag: &str,
    out: &mut W,
) -> Result<()> {
    if !config.runtime.is_dir(&config.extract_dir) {
        return Err(LinkError::NotFound(config.extract_dir.join(tag)).into());
    }
    let _lock = RootLock::acquire(&config.extract_dir)?;

    info!("Removing release: {}", tag);
    LinkManager::new(&*config.runtime, &config.registry).remove_release(
        &config.extract_dir,
        tag,
        fork,
    )?;

    writeln!(out, "Success")?;
    Ok(())
}
