//! Command line operations.
//!
//! Every operation prints its results to the writer it is given and ends
//! with a `Success` line, which scripts rely on.

use anyhow::{Result, bail};
use log::info;
use std::io::Write;

use crate::fork::Fork;
use crate::runtime::Runtime;

pub mod config;
mod fetch;
mod links;
pub mod paths;
mod relink;
mod releases;
mod remove;

pub use config::{Config, Settings};
pub use fetch::fetch;
pub use links::list_links;
pub use paths::{DEFAULT_EXTRACT_DIR, DEFAULT_OUTPUT_DIR};
pub use relink::relink;
pub use releases::list_releases;
pub use remove::remove;

pub const DEFAULT_FORK: Fork = Fork::GeProton;

/// The one operation a run performs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Download, extract and link a release (the latest when `release` is `None`).
    Fetch { release: Option<String> },
    /// `--list`
    ListReleases,
    /// `--ls`
    ListLinks,
    /// `--rm TAG`
    Remove { tag: String },
    /// `--relink`
    Relink,
}

/// Operation flags as given on the command line.
#[derive(Debug, Clone, Default)]
pub struct Request {
    pub release: Option<String>,
    pub list: bool,
    pub ls: bool,
    pub rm: Option<String>,
    pub relink: bool,
}

impl Request {
    /// The action these flags select, or an error for a conflicting combination.
    pub fn action(self) -> Result<Action> {
        let release = self.release.is_some();
        if self.list && release {
            bail!("--list and --release cannot be used together");
        }
        if self.ls && (release || self.list) {
            bail!("--ls cannot be used with --release or --list");
        }
        if self.rm.is_some() && (release || self.list || self.ls) {
            bail!("--rm cannot be used with --release, --list, or --ls");
        }
        if self.relink && (release || self.list || self.ls || self.rm.is_some()) {
            bail!("--relink cannot be used with --release, --list, --ls, or --rm");
        }

        Ok(if self.list {
            Action::ListReleases
        } else if self.ls {
            Action::ListLinks
        } else if let Some(tag) = self.rm {
            Action::Remove { tag }
        } else if self.relink {
            Action::Relink
        } else {
            Action::Fetch {
                release: self.release,
            }
        })
    }
}

/// Run `action`. `fork` is `None` when `--fork` was not given.
#[tracing::instrument(skip(config, out))]
pub async fn run<R: Runtime + 'static, W: Write>(
    config: &Config<R>,
    action: Action,
    fork: Option<Fork>,
    out: &mut W,
) -> Result<()> {
    match action {
        Action::ListLinks => {
            // Without --fork every fork is listed
            let forks = fork.map_or_else(|| Fork::ALL.to_vec(), |f| vec![f]);
            list_links(config, &forks, out)
        }
        Action::Fetch { release } => {
            fetch(config, selected(config, fork), release.as_deref(), out).await
        }
        Action::ListReleases => list_releases(config, selected(config, fork), out).await,
        Action::Remove { tag } => remove(config, selected(config, fork), &tag, out),
        Action::Relink => relink(config, selected(config, fork), out),
    }
}

fn selected<R: Runtime + 'static>(config: &Config<R>, fork: Option<Fork>) -> Fork {
    let fork = fork.unwrap_or(DEFAULT_FORK);
    info!("Using fork: {} ({})", fork, config.registry.spec(fork).repo);
    fork
}
