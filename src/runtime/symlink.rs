//! Symlink operations (create, read, resolve, remove).

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::RealRuntime;
use super::path::normalize_path;

impl RealRuntime {
    #[tracing::instrument(skip(self))]
    pub(crate) fn symlink_impl(&self, original: &Path, link: &Path) -> Result<()> {
        debug!("Creating symlink {:?} -> {:?}", link, original);
        #[cfg(unix)]
        {
            use std::os::unix::fs::symlink as unix_symlink;
            unix_symlink(original, link)
                .with_context(|| format!("Failed to create symlink {:?}", link))?;
        }
        #[cfg(windows)]
        {
            use std::os::windows::fs::symlink_dir;
            // Compatibility tools are always directories.
            symlink_dir(original, link)
                .with_context(|| format!("Failed to create directory symlink {:?}", link))?;
        }
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn read_link_impl(&self, path: &Path) -> Result<PathBuf> {
        fs::read_link(path).with_context(|| format!("Failed to read symlink {:?}", path))
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn resolve_link_impl(&self, path: &Path) -> Result<PathBuf> {
        let target = self.read_link_impl(path)?;
        if target.is_absolute() {
            return Ok(target);
        }
        let parent = path
            .parent()
            .context("Failed to get parent directory of symlink")?;
        Ok(normalize_path(&parent.join(&target)))
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn canonicalize_impl(&self, path: &Path) -> Result<PathBuf> {
        fs::canonicalize(path).with_context(|| format!("Failed to resolve {:?}", path))
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn is_symlink_impl(&self, path: &Path) -> bool {
        fs::symlink_metadata(path)
            .map(|m| m.file_type().is_symlink())
            .unwrap_or(false)
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn remove_symlink_impl(&self, path: &Path) -> Result<()> {
        #[cfg(unix)]
        {
            fs::remove_file(path).with_context(|| format!("Failed to remove symlink {:?}", path))?;
        }
        #[cfg(windows)]
        {
            fs::remove_dir(path)
                .or_else(|_| fs::remove_file(path))
                .with_context(|| format!("Failed to remove symlink {:?}", path))?;
        }
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use crate::runtime::{RealRuntime, Runtime};
    use std::path::{Path, PathBuf};
    use tempfile::tempdir;

    #[test]
    fn test_symlink_to_directory_relative() {
        let runtime = RealRuntime;
        let dir = tempdir().unwrap();
        let target = dir.path().join("GE-Proton10-20");
        let link = dir.path().join("GE-Proton");
        runtime.create_dir_all(&target).unwrap();

        runtime.symlink(Path::new("GE-Proton10-20"), &link).unwrap();

        assert!(runtime.is_symlink(&link));
        assert!(runtime.is_dir(&link));
        assert!(runtime.exists(&link));
        assert_eq!(
            runtime.read_link(&link).unwrap(),
            PathBuf::from("GE-Proton10-20")
        );
        assert_eq!(runtime.resolve_link(&link).unwrap(), target);
        assert_eq!(
            runtime.canonicalize(&link).unwrap(),
            runtime.canonicalize(&target).unwrap()
        );
    }

    #[test]
    fn test_broken_symlink() {
        let runtime = RealRuntime;
        let dir = tempdir().unwrap();
        let link = dir.path().join("GE-Proton");

        runtime
            .symlink(Path::new("GE-Proton9-1"), &link)
            .unwrap();

        assert!(runtime.is_symlink(&link));
        assert!(!runtime.exists(&link));
        assert!(!runtime.is_dir(&link));
        assert!(runtime.canonicalize(&link).is_err());
        assert_eq!(
            runtime.resolve_link(&link).unwrap(),
            dir.path().join("GE-Proton9-1")
        );

        runtime.remove_symlink(&link).unwrap();
        assert!(!runtime.is_symlink(&link));
    }

    #[test]
    fn test_is_symlink_on_plain_entries() {
        let runtime = RealRuntime;
        let dir = tempdir().unwrap();
        let plain = dir.path().join("plain");
        runtime.create_dir_all(&plain).unwrap();

        assert!(!runtime.is_symlink(&plain));
        assert!(!runtime.is_symlink(&dir.path().join("missing")));
        assert!(runtime.read_link(&plain).is_err());
    }
}
