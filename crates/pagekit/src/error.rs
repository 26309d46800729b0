//! CLI error types.

use pagekit_config::{ConfigError, ValidationError};
use pagekit_site::BuildError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Build(#[from] BuildError),
}

impl CliError {
    /// Validation failures to list one per line, if any.
    pub(crate) fn validation_errors(&self) -> &[ValidationError] {
        match self {
            Self::Config(err) | Self::Build(BuildError::Config(err)) => err.validation_errors(),
            _ => &[],
        }
    }
}
