//! Deleting an installed release together with the links that use it.

use anyhow::{Context, Result};
use log::{error, info};
use std::path::{Component, Path, PathBuf};

use super::error::LinkError;
use super::link_set::LinkSet;
use crate::fork::{Fork, ForkRegistry};
use crate::runtime::{Runtime, normalize_path};

/// What a removal touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Removal {
    pub release: PathBuf,
    pub unlinked: Vec<PathBuf>,
}

pub struct ReleaseRemover<'a, R: Runtime> {
    runtime: &'a R,
    registry: &'a ForkRegistry,
}

impl<'a, R: Runtime> ReleaseRemover<'a, R> {
    pub fn new(runtime: &'a R, registry: &'a ForkRegistry) -> Self {
        Self { runtime, registry }
    }

    /// The directory holding `tag`, trying each naming form of `fork` in turn.
    ///
    /// Only a plain name that `fork` claims can match, so the result is
    /// always a release directory directly under `root`.
    pub fn locate(&self, root: &Path, tag: &str, fork: Fork) -> Option<PathBuf> {
        if !is_plain_name(tag) {
            return None;
        }
        let spec = self.registry.spec(fork);
        spec.dir_forms(tag)
            .into_iter()
            .filter(|form| spec.claims(form))
            .map(|form| root.join(form))
            .find(|path| self.runtime.is_dir(path) && !self.runtime.is_symlink(path))
    }

    /// Delete the release directory of `tag` and every managed link that
    /// points (or pointed, if broken) at it.
    ///
    /// A missing release is [`LinkError::NotFound`]. Failing to delete the
    /// directory is fatal; failing to delete a link is only logged.
    /// Links are not rebuilt here.
    #[tracing::instrument(skip(self))]
    pub fn remove(&self, root: &Path, tag: &str, fork: Fork) -> Result<Removal> {
        let release = match self.locate(root, tag, fork) {
            Some(path) => path,
            None => {
                let expected = root.join(tag);
                return Err(LinkError::NotFound(expected).into());
            }
        };

        let links = LinkSet::for_fork(self.runtime, root, self.registry.spec(fork));
        let doomed: Vec<PathBuf> = links
            .paths()
            .iter()
            .filter(|link| self.links_to(link, &release))
            .cloned()
            .collect();

        info!("Removing {:?}", release);
        self.runtime
            .remove_dir_all(&release)
            .with_context(|| format!("Failed to remove release directory {:?}", release))?;

        let mut unlinked = Vec::new();
        for link in doomed {
            match self.runtime.remove_symlink(&link) {
                Ok(()) => {
                    info!("Removed link {:?}", link);
                    unlinked.push(link);
                }
                Err(e) => error!("Failed to remove link {:?}: {:#}", link, e),
            }
        }

        Ok(Removal { release, unlinked })
    }

    fn links_to(&self, link: &Path, release: &Path) -> bool {
        if !self.runtime.is_symlink(link) {
            return false;
        }
        match self.runtime.canonicalize(link) {
            Ok(resolved) => self
                .runtime
                .canonicalize(release)
                .map(|expected| expected == resolved)
                .unwrap_or(false),
            // Broken: compare where it was meant to point
            Err(_) => self
                .runtime
                .resolve_link(link)
                .map(|intended| normalize_path(&intended) == normalize_path(release))
                .unwrap_or(false),
        }
    }
}

/// A single normal path component: no separators, `..` or root.
fn is_plain_name(tag: &str) -> bool {
    let mut components = Path::new(tag).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
