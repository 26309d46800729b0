//! Configuration and validation error types.

use std::fmt;
use std::path::PathBuf;

/// Why an output directory was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsafeReason {
    /// The directory is the project root or lies outside it.
    OutsideProjectRoot,
    /// The directory is the source root or one of its ancestors.
    ContainsSourceRoot,
    /// The directory holds an entry source or an alias target.
    ContainsSources,
    /// The directory is a symbolic link.
    Symlink,
}

impl fmt::Display for UnsafeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutsideProjectRoot => f.write_str("it does not lie inside the project root"),
            Self::ContainsSourceRoot => f.write_str("emptying it would delete the source root"),
            Self::ContainsSources => {
                f.write_str("emptying it would delete entry sources or alias targets")
            }
            Self::Symlink => f.write_str("it is a symbolic link"),
        }
    }
}

/// A single failed validation.
///
/// The assembler collects these instead of stopping at the first one, see
/// [`ConfigError::ConfigurationInvalid`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Page identifier registered twice.
    #[error("Duplicate variable binding for page '{page}'")]
    DuplicateBinding {
        /// Page identifier.
        page: String,
    },
    /// Entry name registered twice.
    #[error("Duplicate entry name '{name}'")]
    DuplicateEntryName {
        /// Entry name.
        name: String,
    },
    /// Entry source file does not exist.
    #[error("Entry '{name}' points to a missing file: {}", .path.display())]
    MissingEntryFile {
        /// Entry name.
        name: String,
        /// Resolved absolute path.
        path: PathBuf,
    },
    /// Output directory would put files outside the project tree at risk.
    #[error("Unsafe output directory {}: {reason}", .path.display())]
    UnsafeOutputPath {
        /// Resolved absolute path.
        path: PathBuf,
        /// Which containment rule failed.
        reason: UnsafeReason,
    },
    /// Source root resolves outside the project root.
    #[error("Source root {} lies outside the project root", .path.display())]
    SourceRootOutsideProject {
        /// Resolved absolute path.
        path: PathBuf,
    },
    /// Alias with an empty prefix (would match every specifier).
    #[error("Alias prefix cannot be empty (target: {})", .target.display())]
    EmptyAliasPrefix {
        /// Declared alias target.
        target: PathBuf,
    },
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`build.out_dir`").
        field: String,
        /// Error message (e.g., "${`OUT_DIR`} not set").
        message: String,
    },
    /// Single validation failure outside of assembly.
    #[error("Configuration error: {0}")]
    Validation(#[from] ValidationError),
    /// Every validation failure found while assembling.
    #[error("Configuration invalid ({} error(s)): {}", .0.len(), join_errors(.0))]
    ConfigurationInvalid(Vec<ValidationError>),
}

impl ConfigError {
    /// Individual validation failures carried by this error, if any.
    #[must_use]
    pub fn validation_errors(&self) -> &[ValidationError] {
        match self {
            Self::ConfigurationInvalid(errors) => errors,
            Self::Validation(error) => std::slice::from_ref(error),
            _ => &[],
        }
    }
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
