//! Lexical path resolution.
//!
//! Output directories usually don't exist yet when they are validated, so
//! paths are normalized by folding `.` and `..` components instead of asking
//! the filesystem. Containment checks that guard deletion additionally
//! resolve symlinks in whatever part of the path already exists.

use std::fs;
use std::path::{Component, Path, PathBuf};

/// Fold `.` and `..` components without touching the filesystem.
///
/// `..` never climbs above the root of an absolute path. Leading `..`
/// components of a relative path are kept.
#[must_use]
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            Component::Normal(part) => out.push(part),
        }
    }
    out
}

/// Resolve `path` against `base`. Absolute paths replace the base.
#[must_use]
pub fn resolve(base: &Path, path: &Path) -> PathBuf {
    normalize(&base.join(path))
}

/// Whether `path` is `root` itself or lies below it.
pub(crate) fn is_within(path: &Path, root: &Path) -> bool {
    path.starts_with(root)
}

/// Resolve symlinks in the longest existing prefix of an absolute path.
///
/// Components below the first missing directory are appended unchanged.
pub(crate) fn canonicalize_existing(path: &Path) -> PathBuf {
    let mut missing = Vec::new();
    let mut current = path;
    loop {
        if let Ok(resolved) = fs::canonicalize(current) {
            return missing
                .iter()
                .rev()
                .fold(resolved, |resolved, part| resolved.join(part));
        }
        match (current.parent(), current.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name);
                current = parent;
            }
            _ => return path.to_path_buf(),
        }
    }
}

/// Render a relative path with `/` separators, regardless of platform.
pub(crate) fn to_slash(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
