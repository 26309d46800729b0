//! Per-page template variable bindings.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Empty mapping handed out for pages without a binding.
static NO_VARIABLES: PageVariables = PageVariables::new();

/// A template variable value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VariableValue {
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Integer(i64),
    /// Floating point value.
    Float(f64),
    /// String value.
    String(String),
}

impl fmt::Display for VariableValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::String(value) => f.write_str(value),
        }
    }
}

impl From<&str> for VariableValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for VariableValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for VariableValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for VariableValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for VariableValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

/// Variable name to value mapping for one page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageVariables(BTreeMap<String, VariableValue>);

impl PageVariables {
    /// Create an empty mapping.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Set a variable, returning the previous value.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<VariableValue>,
    ) -> Option<VariableValue> {
        self.0.insert(name.into(), value.into())
    }

    /// Get a variable by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&VariableValue> {
        self.0.get(name)
    }

    /// Number of variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the mapping is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate variables sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &VariableValue)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl<K, V> FromIterator<(K, V)> for PageVariables
where
    K: Into<String>,
    V: Into<VariableValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }
}

/// Registry mapping page identifiers to their template variables.
///
/// Page identifiers are matched exactly and case-sensitively. Looking up a
/// page that was never registered is not an error: the template engine gets
/// an empty mapping and may fall back to its own defaults.
#[derive(Debug, Default, Serialize)]
#[serde(transparent)]
pub struct PageVariableRegistry {
    bindings: BTreeMap<String, PageVariables>,
}

impl PageVariableRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind variables to a page.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::DuplicateBinding`] if the page already has a binding.
    pub fn register(
        &mut self,
        page_key: impl Into<String>,
        variables: PageVariables,
    ) -> Result<(), ValidationError> {
        let page_key = page_key.into();
        if self.bindings.contains_key(&page_key) {
            return Err(ValidationError::DuplicateBinding { page: page_key });
        }
        self.bindings.insert(page_key, variables);
        Ok(())
    }

    /// Variables bound to a page, or an empty mapping if there is no binding.
    #[must_use]
    pub fn lookup(&self, page_key: &str) -> &PageVariables {
        self.bindings.get(page_key).unwrap_or_else(|| {
            tracing::debug!(page = page_key, "No variables bound, using empty mapping");
            &NO_VARIABLES
        })
    }

    /// Number of registered pages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether no page has a binding.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Iterate bindings sorted by page identifier.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PageVariables)> {
        self.bindings.iter().map(|(key, vars)| (key.as_str(), vars))
    }
}
