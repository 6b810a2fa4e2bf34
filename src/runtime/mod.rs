//! Runtime abstraction for system operations.
//!
//! Every filesystem syscall the link core performs goes through the
//! [`Runtime`] trait so it can be replaced by `MockRuntime` in tests.
//!
//! # Structure
//!
//! - `path` - Path utility functions (normalize, is_path_under, relative_symlink_path)
//! - `env` - Environment variables and well-known directories
//! - `fs` - File system operations (read, write, directory, metadata)
//! - `symlink` - Symlink operations (create, read, resolve, remove)

mod env;
mod fs;
pub mod path;
mod symlink;

use anyhow::{Context, Result, bail};
use std::env as std_env;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub use path::{is_path_under, normalize_path, relative_symlink_path};

#[cfg_attr(test, mockall::automock)]
pub trait Runtime: Send + Sync {
    // Environment
    fn env_var(&self, key: &str) -> Result<String, std_env::VarError>;

    // File System
    fn write(&self, path: &Path, contents: &[u8]) -> Result<()>;
    fn read(&self, path: &Path) -> Result<Vec<u8>>;
    fn create_dir_all(&self, path: &Path) -> Result<()>;
    fn remove_file(&self, path: &Path) -> Result<()>;
    fn remove_dir_all(&self, path: &Path) -> Result<()>;

    /// True if `path` exists, following symlinks. A broken symlink reports false.
    fn exists(&self, path: &Path) -> bool;

    /// True if `path` is a directory, following symlinks.
    fn is_dir(&self, path: &Path) -> bool;

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>>;
    fn create_file(&self, path: &Path) -> Result<Box<dyn std::io::Write + Send>>;
    fn open(&self, path: &Path) -> Result<Box<dyn std::io::Read + Send>>;
    fn file_size(&self, path: &Path) -> Result<u64>;
    fn modified(&self, path: &Path) -> Result<SystemTime>;

    // Symlinks

    /// Create a directory symlink at `link` whose content is `original`.
    fn symlink(&self, original: &Path, link: &Path) -> Result<()>;
    fn read_link(&self, path: &Path) -> Result<PathBuf>;

    /// Resolve a symlink to an absolute path (without recursively resolving symlinks).
    /// If the link target is relative, it is resolved relative to the link's parent directory.
    /// Works on broken symlinks.
    fn resolve_link(&self, path: &Path) -> Result<PathBuf>;

    /// Canonicalize a path by resolving all symlinks. Fails on broken or missing paths.
    fn canonicalize(&self, path: &Path) -> Result<PathBuf>;

    /// True if `path` itself is a symlink (does not follow it).
    fn is_symlink(&self, path: &Path) -> bool;
    fn remove_symlink(&self, path: &Path) -> Result<()>;

    // Directories
    fn home_dir(&self) -> Option<PathBuf>;
    fn cache_dir(&self) -> Option<PathBuf>;
}

pub struct RealRuntime;

impl Runtime for RealRuntime {
    fn env_var(&self, key: &str) -> Result<String, std_env::VarError> {
        self.env_var_impl(key)
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        self.write_impl(path, contents)
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        self.read_impl(path)
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        self.create_dir_all_impl(path)
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        self.remove_file_impl(path)
    }

    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        self.remove_dir_all_impl(path)
    }

    fn exists(&self, path: &Path) -> bool {
        self.exists_impl(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.is_dir_impl(path)
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        self.read_dir_impl(path)
    }

    fn create_file(&self, path: &Path) -> Result<Box<dyn std::io::Write + Send>> {
        self.create_file_impl(path)
    }

    fn open(&self, path: &Path) -> Result<Box<dyn std::io::Read + Send>> {
        self.open_impl(path)
    }

    fn file_size(&self, path: &Path) -> Result<u64> {
        self.file_size_impl(path)
    }

    fn modified(&self, path: &Path) -> Result<SystemTime> {
        self.modified_impl(path)
    }

    fn symlink(&self, original: &Path, link: &Path) -> Result<()> {
        self.symlink_impl(original, link)
    }

    fn read_link(&self, path: &Path) -> Result<PathBuf> {
        self.read_link_impl(path)
    }

    fn resolve_link(&self, path: &Path) -> Result<PathBuf> {
        self.resolve_link_impl(path)
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        self.canonicalize_impl(path)
    }

    fn is_symlink(&self, path: &Path) -> bool {
        self.is_symlink_impl(path)
    }

    fn remove_symlink(&self, path: &Path) -> Result<()> {
        self.remove_symlink_impl(path)
    }

    fn home_dir(&self) -> Option<PathBuf> {
        self.home_dir_impl()
    }

    fn cache_dir(&self) -> Option<PathBuf> {
        self.cache_dir_impl()
    }
}

/// Create `dir` if needed and prove it is writable with a throwaway `.write_test` file.
pub fn ensure_directory_is_writable<R: Runtime + ?Sized>(runtime: &R, dir: &Path) -> Result<()> {
    if !runtime.exists(dir) {
        runtime
            .create_dir_all(dir)
            .with_context(|| format!("Failed to create directory {:?}", dir))?;
    }
    if !runtime.is_dir(dir) {
        bail!("{:?} exists but is not a directory", dir);
    }
    let marker = dir.join(".write_test");
    runtime
        .write(&marker, b"")
        .and_then(|_| runtime.remove_file(&marker))
        .with_context(|| format!("Directory {:?} is not writable", dir))?;
    Ok(())
}
