//! Enumerating installed versions of a fork under the install root.

use anyhow::Result;
use log::debug;
use std::path::{Path, PathBuf};

use super::error::LinkError;
use super::version::{VersionIdentity, parse_version};
use crate::fork::{Fork, ForkRegistry};
use crate::runtime::Runtime;

/// An installed version directory and its parsed identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub version: VersionIdentity,
    pub path: PathBuf,
}

impl Candidate {
    pub fn new(version: VersionIdentity, path: impl Into<PathBuf>) -> Self {
        Self {
            version,
            path: path.into(),
        }
    }

    /// The directory's own name, as found on disk.
    pub fn dir_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }
}

pub struct DirectoryScanner<'a, R: Runtime> {
    runtime: &'a R,
    registry: &'a ForkRegistry,
}

impl<'a, R: Runtime> DirectoryScanner<'a, R> {
    pub fn new(runtime: &'a R, registry: &'a ForkRegistry) -> Self {
        Self { runtime, registry }
    }

    /// Real directories directly under `root` that hold a release of `fork`.
    ///
    /// Symlinks, other forks' directories and anything not shaped like a
    /// tag of `fork` are skipped. Failing to list `root` is an error.
    #[tracing::instrument(skip(self))]
    pub fn find_version_candidates(&self, root: &Path, fork: Fork) -> Result<Vec<Candidate>> {
        let spec = self.registry.spec(fork);
        let entries = self.runtime.read_dir(root).map_err(|e| LinkError::Scan {
            root: root.to_path_buf(),
            reason: format!("{:#}", e),
        })?;

        let mut candidates = Vec::new();
        for path in entries {
            if self.runtime.is_symlink(&path) || !self.runtime.is_dir(&path) {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if let Some(owner) = self.registry.claimed_by_other(fork, name) {
                debug!("Skipping {} (belongs to {})", name, owner);
                continue;
            }
            if !spec.claims(name) {
                debug!("Skipping {} (not a {} release)", name, fork);
                continue;
            }
            let version = parse_version(name, spec);
            debug!("Found {} candidate {} at {:?}", fork, version, path);
            candidates.push(Candidate::new(version, path));
        }
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{MockRuntime, RealRuntime};
    use mockall::predicate::eq;
    use tempfile::tempdir;

    #[test]
    fn test_find_candidates_filters_symlinks_files_and_foreign_dirs() {
        let root = PathBuf::from("/steam/compatibilitytools.d");
        let registry = ForkRegistry::builtin().unwrap();
        let mut runtime = MockRuntime::new();

        // --- Setup ---
        let ge = root.join("GE-Proton10-20");
        let link = root.join("GE-Proton");
        let em = root.join("proton-EM-10.0-30");
        let legacy = root.join("LegacyRuntime");
        let archive = root.join("GE-Proton9-1");

        let entries = vec![
            ge.clone(),
            link.clone(),
            em.clone(),
            legacy.clone(),
            archive.clone(),
        ];
        runtime
            .expect_read_dir()
            .with(eq(root.clone()))
            .returning(move |_| Ok(entries.clone()));

        runtime
            .expect_is_symlink()
            .returning(move |p| p.ends_with("GE-Proton"));
        // GE-Proton9-1 is a regular file here
        runtime
            .expect_is_dir()
            .returning(|p| !p.ends_with("GE-Proton9-1"));

        // --- Execute & Verify ---
        let scanner = DirectoryScanner::new(&runtime, &registry);
        let found = scanner
            .find_version_candidates(&root, Fork::GeProton)
            .unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].path, ge);
        assert_eq!(found[0].version.patch, 20);
    }

    #[test]
    fn test_find_candidates_read_error_is_scan_error() {
        let root = PathBuf::from("/missing");
        let registry = ForkRegistry::builtin().unwrap();
        let mut runtime = MockRuntime::new();
        runtime
            .expect_read_dir()
            .returning(|_| Err(anyhow::anyhow!("No such file or directory")));

        let scanner = DirectoryScanner::new(&runtime, &registry);
        let err = scanner
            .find_version_candidates(&root, Fork::ProtonEm)
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<LinkError>(),
            Some(LinkError::Scan { .. })
        ));
    }

    #[test]
    fn test_cross_fork_isolation_on_disk() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let registry = ForkRegistry::builtin().unwrap();
        let runtime = RealRuntime;

        for name in [
            "GE-Proton10-20",
            "GE-Proton9-15",
            "EM-10.0-30",
            "proton-EM-10.0-29",
            "proton-cachyos-10.0-20260207-slr-x86_64",
            "cachyos-10.0-20260101-slr",
            "LegacyRuntime",
        ] {
            runtime.create_dir_all(&root.join(name)).unwrap();
        }
        runtime.write(&root.join(".protonfetcher.lock"), b"").unwrap();

        let scanner = DirectoryScanner::new(&runtime, &registry);
        let mut seen = std::collections::HashSet::new();
        let mut total = 0;
        for fork in Fork::ALL {
            let found = scanner.find_version_candidates(root, fork).unwrap();
            assert_eq!(found.len(), 2, "{} found {:?}", fork, found);
            for candidate in found {
                total += 1;
                assert!(seen.insert(candidate.path), "claimed by two forks");
            }
        }
        assert_eq!(total, 6);
    }
}
