use anyhow::Result;
use std::io::Write;

use super::config::Config;
use crate::fork::Fork;
use crate::link::{LinkManager, RootLock};
use crate::runtime::Runtime;

/// Recreate the links of `fork` from what is installed.
#[tracing::instrument(skip(config, out))]
pub fn relink<R: Runtime + 'static, W: Write>(
    config: &Config<R>,
    fork: Fork,
    out: &mut W,
) -> Result<()> {
    config.runtime.create_dir_all(&config.extract_dir)?;
    let _lock = RootLock::acquire(&config.extract_dir)?;

    LinkManager::new(&*config.runtime, &config.registry).relink_fork(&config.extract_dir, fork)?;

    writeln!(out, "Success")?;
    Ok(())
}
