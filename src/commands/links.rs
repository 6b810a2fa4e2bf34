use anyhow::Result;
use log::info;
use std::io::Write;

use super::config::Config;
use crate::fork::Fork;
use crate::link::LinkManager;
use crate::runtime::Runtime;

/// Print each fork's links and the directory they resolve to.
#[tracing::instrument(skip(config, out))]
pub fn list_links<R: Runtime + 'static, W: Write>(
    config: &Config<R>,
    forks: &[Fork],
    out: &mut W,
) -> Result<()> {
    info!("Listing recognized links and their associated Proton fork folders...");
    let manager = LinkManager::new(&*config.runtime, &config.registry);

    for &fork in forks {
        writeln!(out, "Links for {}:", fork)?;
        for (name, target) in manager.list_links(&config.extract_dir, fork) {
            match target {
                Some(target) => writeln!(out, "  {} -> {}", name, target.display())?,
                None => writeln!(out, "  {} -> (not found)", name)?,
            }
        }
    }
    writeln!(out, "Success")?;
    Ok(())
}
