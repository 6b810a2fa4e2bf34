//! Path utility functions for normalization and comparison.

use std::path::{Component, Path, PathBuf};

/// Normalize a path by processing `.` and `..` components lexically.
/// This does not access the filesystem and does not follow symlinks.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !result.pop() {
                    result.push(component);
                }
            }
            _ => result.push(component),
        }
    }
    result
}

/// Returns true if `path` is `dir` or lies below it, comparing normalized components.
/// `/a/b/../../etc` is not under `/a`.
pub fn is_path_under(path: &Path, dir: &Path) -> bool {
    normalize_path(path).starts_with(normalize_path(dir))
}

/// The content to store in a symlink at `link` pointing to `target`.
///
/// A target below the link's parent directory is written relative to it
/// (`GE-Proton` -> `GE-Proton10-20`); anything else stays absolute.
pub fn relative_symlink_path(link: &Path, target: &Path) -> PathBuf {
    let relative = link
        .parent()
        .filter(|parent| is_path_under(target, parent))
        .and_then(|parent| pathdiff::diff_paths(normalize_path(target), normalize_path(parent)));

    match relative {
        Some(rel) if !rel.as_os_str().is_empty() && !rel.is_absolute() => rel,
        _ => target.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_with_dot() {
        assert_eq!(
            normalize_path(Path::new("/steam/./compatibilitytools.d/./GE-Proton")),
            PathBuf::from("/steam/compatibilitytools.d/GE-Proton")
        );
    }

    #[test]
    fn test_normalize_path_with_parent_dir() {
        assert_eq!(
            normalize_path(Path::new("/steam/compatibilitytools.d/../other")),
            PathBuf::from("/steam/other")
        );
    }

    #[test]
    fn test_normalize_path_relative() {
        assert_eq!(
            normalize_path(Path::new("foo/bar/../baz")),
            PathBuf::from("foo/baz")
        );
    }

    #[test]
    fn test_normalize_path_only_dots() {
        assert_eq!(normalize_path(Path::new("./././.")), PathBuf::from(""));
    }

    #[test]
    fn test_is_path_under() {
        let root = Path::new("/steam/compatibilitytools.d");
        assert!(is_path_under(
            Path::new("/steam/compatibilitytools.d/GE-Proton10-20"),
            root
        ));
        assert!(is_path_under(root, root));
        assert!(!is_path_under(Path::new("/opt/proton"), root));
        // Prefix of a component is not containment
        assert!(!is_path_under(
            Path::new("/steam/compatibilitytools.d-old/GE-Proton10-20"),
            root
        ));
        assert!(!is_path_under(
            Path::new("/steam/compatibilitytools.d/../../etc"),
            root
        ));
    }

    #[test]
    fn test_relative_symlink_path_sibling() {
        let result = relative_symlink_path(
            Path::new("/steam/compatibilitytools.d/GE-Proton"),
            Path::new("/steam/compatibilitytools.d/GE-Proton10-20"),
        );
        assert_eq!(result, PathBuf::from("GE-Proton10-20"));
    }

    #[test]
    fn test_relative_symlink_path_nested_target() {
        let result = relative_symlink_path(
            Path::new("/root/CachyOS"),
            Path::new("/root/./nested/proton-cachyos-10.0-20260207-slr-x86_64"),
        );
        assert_eq!(
            result,
            PathBuf::from("nested/proton-cachyos-10.0-20260207-slr-x86_64")
        );
    }

    #[test]
    fn test_relative_symlink_path_outside_parent_stays_absolute() {
        let result = relative_symlink_path(
            Path::new("/steam/compatibilitytools.d/GE-Proton"),
            Path::new("/mnt/games/GE-Proton10-20"),
        );
        assert_eq!(result, PathBuf::from("/mnt/games/GE-Proton10-20"));
    }
}
