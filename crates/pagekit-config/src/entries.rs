//! Named build entry points.

use std::path::{Path, PathBuf};

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::ValidationError;
use crate::path;

/// A named build input, treated by the bundler as a dependency graph root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPoint {
    /// Unique symbolic name (e.g., "main").
    pub name: String,
    /// Absolute path of the source file.
    pub source_path: PathBuf,
}

/// Registry of entry points keyed by name.
///
/// Source paths are resolved against the project root and must exist when
/// registered. Entries keep their registration order, which only affects
/// the order of diagnostics and of the bundler manifest.
#[derive(Debug)]
pub struct EntryPointRegistry {
    project_root: PathBuf,
    entries: Vec<EntryPoint>,
}

impl EntryPointRegistry {
    /// Create an empty registry resolving paths against `project_root`.
    #[must_use]
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            entries: Vec::new(),
        }
    }

    /// Register an entry point.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::DuplicateEntryName`] if `name` is taken, or
    /// [`ValidationError::MissingEntryFile`] if the resolved path is not an
    /// existing file.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        source_path: impl AsRef<Path>,
    ) -> Result<&EntryPoint, ValidationError> {
        let name = name.into();
        if self.get(&name).is_some() {
            return Err(ValidationError::DuplicateEntryName { name });
        }

        let resolved = path::resolve(&self.project_root, source_path.as_ref());
        if !resolved.is_file() {
            return Err(ValidationError::MissingEntryFile {
                name,
                path: resolved,
            });
        }

        tracing::debug!(entry = %name, path = %resolved.display(), "Registered entry point");
        self.entries.push(EntryPoint {
            name,
            source_path: resolved,
        });
        Ok(&self.entries[self.entries.len() - 1])
    }

    /// All entry points in registration order.
    #[must_use]
    pub fn all(&self) -> &[EntryPoint] {
        &self.entries
    }

    /// Find an entry point by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&EntryPoint> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    /// Number of entry points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entry point is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for EntryPointRegistry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.name, &entry.source_path)?;
        }
        map.end()
    }
}
