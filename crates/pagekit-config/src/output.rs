//! Output directory planning.
//!
//! The output directory may be emptied before a build, so it is validated
//! before anything touches the filesystem: it must lie strictly inside the
//! project root, even through symlinked parents, and must not contain the
//! source root.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{ConfigError, UnsafeReason, ValidationError};
use crate::path;

/// Validates output declarations into [`BuildOutputSpec`]s.
#[derive(Debug, Clone)]
pub struct OutputPlanner {
    project_root: PathBuf,
    source_root: PathBuf,
}

impl OutputPlanner {
    /// Create a planner for the given project and source roots (both absolute).
    ///
    /// Relative output directories are resolved against `source_root`.
    #[must_use]
    pub fn new(project_root: impl Into<PathBuf>, source_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            source_root: source_root.into(),
        }
    }

    /// Validate an output declaration.
    ///
    /// Nothing is created or deleted here.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnsafeOutputPath`] if the resolved directory
    /// is not strictly inside the project root, contains the source root, or
    /// is a symbolic link.
    pub fn configure(
        &self,
        output_dir: impl AsRef<Path>,
        empty_before_build: bool,
        base_path: impl Into<String>,
    ) -> Result<BuildOutputSpec, ValidationError> {
        let output_dir = path::resolve(&self.source_root, output_dir.as_ref());
        check_output_dir(&output_dir, &self.project_root, &self.source_root)?;

        Ok(BuildOutputSpec {
            output_dir,
            empty_before_build,
            base_path: base_path.into(),
            project_root: self.project_root.clone(),
            source_root: self.source_root.clone(),
        })
    }
}

/// Containment rules for a resolved output directory.
///
/// Containment is decided on symlink-resolved paths, so a linked parent
/// directory cannot carry the output outside the project.
fn check_output_dir(
    output_dir: &Path,
    project_root: &Path,
    source_root: &Path,
) -> Result<(), ValidationError> {
    let resolved = path::canonicalize_existing(output_dir);
    let project_root = path::canonicalize_existing(project_root);
    let source_root = path::canonicalize_existing(source_root);

    let reason = if fs::symlink_metadata(output_dir).is_ok_and(|meta| meta.file_type().is_symlink())
    {
        Some(UnsafeReason::Symlink)
    } else if resolved == project_root || !path::is_within(&resolved, &project_root) {
        Some(UnsafeReason::OutsideProjectRoot)
    } else if path::is_within(&source_root, &resolved) {
        Some(UnsafeReason::ContainsSourceRoot)
    } else {
        None
    };

    match reason {
        Some(reason) => Err(ValidationError::UnsafeOutputPath {
            path: output_dir.to_path_buf(),
            reason,
        }),
        None => Ok(()),
    }
}

/// Validated output settings handed to the bundler and template engine.
///
/// Only [`OutputPlanner::configure`] creates these, so the output directory
/// is always known to be safe to empty.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildOutputSpec {
    output_dir: PathBuf,
    empty_before_build: bool,
    base_path: String,
    #[serde(skip)]
    project_root: PathBuf,
    #[serde(skip)]
    source_root: PathBuf,
}

impl BuildOutputSpec {
    /// Absolute artifact destination.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Whether prior contents are removed before the build.
    #[must_use]
    pub fn empty_before_build(&self) -> bool {
        self.empty_before_build
    }

    /// Prefix for emitted asset URLs, stored verbatim.
    #[must_use]
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Prefix an asset path with the base path.
    ///
    /// Exactly one `/` separates a base path ending in `/` from the asset
    /// path. Absolute URLs (`https://...`, `//cdn...`) are returned unchanged.
    #[must_use]
    pub fn asset_url(&self, asset: &str) -> String {
        if asset.contains("://") || asset.starts_with("//") {
            return asset.to_owned();
        }
        let asset = asset.trim_start_matches('/');
        if self.base_path.is_empty() || self.base_path.ends_with('/') {
            format!("{}{asset}", self.base_path)
        } else {
            format!("{}/{asset}", self.base_path)
        }
    }

    /// Whether `path` lies inside the output directory, following symlinks.
    pub(crate) fn contains(&self, path: &Path) -> bool {
        path::is_within(
            &path::canonicalize_existing(path),
            &path::canonicalize_existing(&self.output_dir),
        )
    }

    /// Prepare the output directory for artifact emission.
    ///
    /// Creates the directory and, if `empty_before_build` is set, removes
    /// all of its prior contents. Containment is checked again before the
    /// first deletion. Returns the number of removed top-level entries.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] if the directory became unsafe
    /// (e.g., replaced by a symlink) since planning, or [`ConfigError::Io`]
    /// if creation or deletion fails.
    pub fn prepare(&self) -> Result<usize, ConfigError> {
        check_output_dir(&self.output_dir, &self.project_root, &self.source_root)?;

        let mut removed = 0;
        if self.empty_before_build && self.output_dir.is_dir() {
            for entry in fs::read_dir(&self.output_dir)? {
                let entry = entry?;
                if entry.file_type()?.is_dir() {
                    fs::remove_dir_all(entry.path())?;
                } else {
                    fs::remove_file(entry.path())?;
                }
                removed += 1;
            }
            tracing::info!(
                dir = %self.output_dir.display(),
                removed,
                "Emptied output directory"
            );
        }

        fs::create_dir_all(&self.output_dir)?;
        Ok(removed)
    }
}
