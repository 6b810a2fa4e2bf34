//! Orchestration of scan, dedup, rank and reconcile for one fork.

use anyhow::Result;
use log::{error, info, warn};
use std::path::{Path, PathBuf};

use super::dedup::deduplicate;
use super::discovery::{Candidate, DirectoryScanner};
use super::error::LinkError;
use super::link_set::LinkSet;
use super::rank::{LINK_SLOTS, inject_candidate, top_n};
use super::remove::ReleaseRemover;
use super::version::parse_version;
use crate::fork::{Fork, ForkRegistry};
use crate::runtime::{Runtime, ensure_directory_is_writable};

/// Outcome of planning a reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkPlan {
    /// Leave the links alone.
    Skip(String),
    /// Point the links at these candidates, newest first.
    Link(Vec<Candidate>),
}

/// Entry point for everything that reads or changes a fork's links.
///
/// Holds no state of its own; every call rescans `root`.
pub struct LinkManager<'a, R: Runtime> {
    runtime: &'a R,
    registry: &'a ForkRegistry,
}

impl<'a, R: Runtime> LinkManager<'a, R> {
    pub fn new(runtime: &'a R, registry: &'a ForkRegistry) -> Self {
        Self { runtime, registry }
    }

    pub fn get_link_names_for_fork(&self, root: &Path, fork: Fork) -> [PathBuf; LINK_SLOTS] {
        self.link_set(root, fork).paths().clone()
    }

    pub fn find_version_candidates(&self, root: &Path, fork: Fork) -> Result<Vec<Candidate>> {
        DirectoryScanner::new(self.runtime, self.registry).find_version_candidates(root, fork)
    }

    /// Work out which directories should be linked.
    ///
    /// For a manual release the tag's own directory must exist, and it is
    /// added to the pool when the scan did not already produce its version.
    pub fn plan(
        &self,
        root: &Path,
        tag: &str,
        fork: Fork,
        is_manual_release: bool,
    ) -> Result<LinkPlan> {
        let spec = self.registry.spec(fork);

        let manual_dir = if is_manual_release {
            match ReleaseRemover::new(self.runtime, self.registry).locate(root, tag, fork) {
                Some(dir) => Some(dir),
                None => {
                    let expected = root.join(spec.dir_forms(tag).pop().unwrap_or_default());
                    return Ok(LinkPlan::Skip(format!(
                        "Expected extracted directory does not exist: {}",
                        expected.display()
                    )));
                }
            }
        } else {
            None
        };

        let candidates = self.find_version_candidates(root, fork)?;
        if candidates.is_empty() {
            return Ok(LinkPlan::Skip(
                "No extracted Proton directories found, not touching links".to_string(),
            ));
        }

        let mut candidates = deduplicate(candidates, spec);
        if let Some(dir) = manual_dir {
            inject_candidate(&mut candidates, Candidate::new(parse_version(tag, spec), dir));
        }
        Ok(LinkPlan::Link(top_n(candidates, LINK_SLOTS)))
    }

    /// True when reconciling now would change nothing.
    pub fn are_links_up_to_date(
        &self,
        root: &Path,
        tag: &str,
        fork: Fork,
        is_manual_release: bool,
    ) -> Result<bool> {
        Ok(match self.plan(root, tag, fork, is_manual_release)? {
            LinkPlan::Skip(_) => true,
            LinkPlan::Link(desired) => self.link_set(root, fork).matches(&desired),
        })
    }

    /// Point the fork's links at its three newest installed versions.
    ///
    /// An empty scan, or a manual release whose directory is missing, leaves
    /// existing links untouched.
    #[tracing::instrument(skip(self))]
    pub fn manage_proton_links(
        &self,
        root: &Path,
        tag: &str,
        fork: Fork,
        is_manual_release: bool,
    ) -> Result<bool> {
        match self.plan(root, tag, fork, is_manual_release)? {
            LinkPlan::Skip(reason) => {
                warn!("{}", reason);
                Ok(true)
            }
            LinkPlan::Link(desired) => Ok(self.link_set(root, fork).reconcile(&desired)),
        }
    }

    /// Rebuild the links from scratch, even when they already look right.
    #[tracing::instrument(skip(self))]
    pub fn relink_fork(&self, root: &Path, fork: Fork) -> Result<bool> {
        ensure_directory_is_writable(self.runtime, root)?;

        let candidates = self.find_version_candidates(root, fork)?;
        if candidates.is_empty() {
            return Err(LinkError::NoVersions {
                fork,
                root: root.to_path_buf(),
            }
            .into());
        }
        let desired = top_n(deduplicate(candidates, self.registry.spec(fork)), LINK_SLOTS);

        info!("Relinking {} symlinks...", fork);
        let links = self.link_set(root, fork);
        // Clear every slot first so reconcile recreates each link
        for link in links.paths() {
            if self.runtime.is_symlink(link)
                && let Err(e) = self.runtime.remove_symlink(link)
            {
                error!("Failed to remove link {:?}: {:#}", link, e);
            }
        }
        let done = links.reconcile(&desired);
        info!("Successfully relinked {} symlinks", fork);
        Ok(done)
    }

    /// Link names with the directory each resolves to.
    pub fn list_links(&self, root: &Path, fork: Fork) -> Vec<(String, Option<PathBuf>)> {
        self.link_set(root, fork)
            .list()
            .into_iter()
            .map(|(link, target)| {
                let name = link
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                (name, target)
            })
            .collect()
    }

    /// Delete the release for `tag` and let the next-best versions take its links.
    #[tracing::instrument(skip(self))]
    pub fn remove_release(&self, root: &Path, tag: &str, fork: Fork) -> Result<bool> {
        let removal = ReleaseRemover::new(self.runtime, self.registry).remove(root, tag, fork)?;
        info!(
            "Removed {:?} and {} link(s)",
            removal.release,
            removal.unlinked.len()
        );
        self.manage_proton_links(root, tag, fork, false)
    }

    fn link_set(&self, root: &Path, fork: Fork) -> LinkSet<'a, R> {
        LinkSet::for_fork(self.runtime, root, self.registry.spec(fork))
    }
}
