//! Environment variable expansion for configuration strings.

use crate::error::ConfigError;

/// Expand `${VAR}` and `${VAR:-default}` references in `value`.
///
/// `field` names the configuration key for error messages.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    shellexpand::env(value)
        .map(std::borrow::Cow::into_owned)
        .map_err(|err| ConfigError::EnvVar {
            field: field.to_owned(),
            message: format!("${{{}}} not set", err.var_name),
        })
}
