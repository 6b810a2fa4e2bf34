//! The three managed symlinks of a fork and their reconciliation.

use anyhow::Result;
use log::{debug, error, info};
use std::path::{Path, PathBuf};

use super::discovery::Candidate;
use super::rank::LINK_SLOTS;
use crate::fork::ForkSpec;
use crate::runtime::{Runtime, relative_symlink_path};

/// Main, fallback and fallback2 link paths for one fork under one root.
pub struct LinkSet<'a, R: Runtime> {
    runtime: &'a R,
    links: [PathBuf; LINK_SLOTS],
}

impl<'a, R: Runtime> LinkSet<'a, R> {
    pub fn new(runtime: &'a R, links: [PathBuf; LINK_SLOTS]) -> Self {
        Self { runtime, links }
    }

    pub fn for_fork(runtime: &'a R, root: &Path, spec: &ForkSpec) -> Self {
        Self::new(runtime, spec.link_names().map(|name| root.join(name)))
    }

    pub fn paths(&self) -> &[PathBuf; LINK_SLOTS] {
        &self.links
    }

    /// Each link with the directory it resolves to, or `None` when it is
    /// missing, broken or not a symlink.
    pub fn list(&self) -> Vec<(PathBuf, Option<PathBuf>)> {
        self.links
            .iter()
            .map(|link| {
                let target = if self.runtime.is_symlink(link) {
                    self.runtime.canonicalize(link).ok()
                } else {
                    None
                };
                (link.clone(), target)
            })
            .collect()
    }

    /// Pairs of (link, target) for the ranked `desired` candidates.
    pub fn wanted(&self, desired: &[Candidate]) -> Vec<(PathBuf, PathBuf)> {
        self.links
            .iter()
            .zip(desired)
            .map(|(link, candidate)| (link.clone(), candidate.path.clone()))
            .collect()
    }

    /// True when every wanted link already resolves to its target and every
    /// other slot is empty.
    pub fn matches(&self, desired: &[Candidate]) -> bool {
        let wanted = self.wanted(desired);
        self.links.iter().all(|link| {
            match wanted.iter().find(|(wanted_link, _)| wanted_link == link) {
                Some((_, target)) => self.points_at(link, target),
                None => !self.runtime.is_symlink(link) && !self.runtime.exists(link),
            }
        })
    }

    /// Make the links point at `desired`, newest first.
    ///
    /// Real files or directories squatting on a link name are removed.
    /// Per-link failures are logged and the remaining links are still
    /// processed. Returns true once the pass has run.
    #[tracing::instrument(skip(self, desired))]
    pub fn reconcile(&self, desired: &[Candidate]) -> bool {
        let wanted = self.wanted(desired);
        let is_wanted = |link: &Path| wanted.iter().any(|(l, _)| l == link);

        // Cleanup pass
        for link in &self.links {
            if self.runtime.is_symlink(link) {
                if !is_wanted(link) {
                    info!("Removing unneeded link {:?}", link);
                    self.log_failure(link, self.runtime.remove_symlink(link));
                }
            } else if self.runtime.exists(link) {
                info!("Removing {:?}, a real directory or file in place of a link", link);
                self.log_failure(link, self.remove_obstruction(link));
            }
        }

        for (link, target) in &wanted {
            if self.runtime.is_symlink(link) {
                if self.points_at(link, target) {
                    debug!("{:?} already points to {:?}", link, target);
                    continue;
                }
                debug!("Repointing {:?}", link);
                self.log_failure(link, self.runtime.remove_symlink(link));
            } else if self.runtime.exists(link) {
                self.log_failure(link, self.remove_obstruction(link));
            }

            if self.runtime.is_symlink(link) || self.runtime.exists(link) {
                self.log_failure(link, self.remove_obstruction(link));
            }

            let content = relative_symlink_path(link, target);
            match self.runtime.symlink(&content, link) {
                Ok(()) => info!("Linked {:?} -> {:?}", link, content),
                Err(e) => error!("Failed to create link {:?} -> {:?}: {:#}", link, content, e),
            }
        }

        true
    }

    fn points_at(&self, link: &Path, target: &Path) -> bool {
        if !self.runtime.is_symlink(link) {
            return false;
        }
        match (
            self.runtime.canonicalize(link),
            self.runtime.canonicalize(target),
        ) {
            (Ok(current), Ok(expected)) => current == expected,
            _ => false,
        }
    }

    fn remove_obstruction(&self, path: &Path) -> Result<()> {
        if self.runtime.is_symlink(path) {
            self.runtime.remove_symlink(path)
        } else if self.runtime.is_dir(path) {
            self.runtime.remove_dir_all(path)
        } else {
            self.runtime.remove_file(path)
        }
    }

    fn log_failure(&self, link: &Path, result: Result<()>) {
        if let Err(e) = result {
            error!("Failed to clear {:?}: {:#}", link, e);
        }
    }
}
