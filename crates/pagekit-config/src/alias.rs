//! Import specifier aliases.
//!
//! A rule rewrites every specifier starting with its prefix by substituting
//! the prefix with the rule's target directory. When several prefixes match,
//! the longest one wins:
//!
//! | Rules | Specifier | Result |
//! |---|---|---|
//! | `@` → `/src` | `@/foo` | `/src/foo` |
//! | `@` → `/src`, `@/x` → `/special` | `@/x/y` | `/special/y` |
//! | `@` → `/src` | `lodash` | `lodash` |

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::ValidationError;
use crate::path;

/// A single alias rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasRule {
    /// Specifier prefix matched literally.
    pub prefix: String,
    /// Absolute directory substituted for the prefix.
    pub target: PathBuf,
}

/// Longest-prefix alias resolver.
#[derive(Debug, Clone)]
pub struct AliasResolver {
    project_root: PathBuf,
    /// Registration order; a re-registered prefix moves to the end.
    rules: Vec<AliasRule>,
}

impl AliasResolver {
    /// Create an empty resolver resolving targets against `project_root`.
    #[must_use]
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            rules: Vec::new(),
        }
    }

    /// Register an alias rule.
    ///
    /// Registering a prefix again replaces its target (last registration
    /// wins). The replaced target is returned and a warning is logged.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyAliasPrefix`] for an empty prefix.
    pub fn register(
        &mut self,
        prefix: impl Into<String>,
        target: impl AsRef<Path>,
    ) -> Result<Option<PathBuf>, ValidationError> {
        let prefix = prefix.into();
        let target = path::resolve(&self.project_root, target.as_ref());
        if prefix.is_empty() {
            return Err(ValidationError::EmptyAliasPrefix { target });
        }

        let previous = self
            .rules
            .iter()
            .position(|rule| rule.prefix == prefix)
            .map(|index| self.rules.remove(index).target);

        if let Some(previous) = &previous {
            tracing::warn!(
                prefix = %prefix,
                previous = %previous.display(),
                target = %target.display(),
                "Alias registered twice, last registration wins"
            );
        }

        self.rules.push(AliasRule { prefix, target });
        Ok(previous)
    }

    /// Rewrite a specifier with the longest matching rule.
    ///
    /// Specifiers matching no rule are returned unchanged for the bundler's
    /// default resolution.
    #[must_use]
    pub fn resolve<'a>(&self, specifier: &'a str) -> Cow<'a, str> {
        match self.best_match(specifier) {
            Some(rule) => {
                let rest = &specifier[rule.prefix.len()..];
                let resolved = format!("{}{rest}", rule.target.to_string_lossy());
                tracing::debug!(specifier, resolved = %resolved, prefix = %rule.prefix, "Alias applied");
                Cow::Owned(resolved)
            }
            None => Cow::Borrowed(specifier),
        }
    }

    /// Resolve a specifier to a filesystem path below the matching target.
    ///
    /// Returns `None` if no rule matches or if the remainder escapes the
    /// target directory (e.g., `@/../secret`).
    #[must_use]
    pub fn resolve_path(&self, specifier: &str) -> Option<PathBuf> {
        let rule = self.best_match(specifier)?;
        let rest = specifier[rule.prefix.len()..].trim_start_matches('/');
        let resolved = path::resolve(&rule.target, Path::new(rest));
        path::is_within(&resolved, &rule.target).then_some(resolved)
    }

    /// All rules in registration order.
    #[must_use]
    pub fn rules(&self) -> &[AliasRule] {
        &self.rules
    }

    /// Longest matching rule; ties go to the most recent registration.
    fn best_match(&self, specifier: &str) -> Option<&AliasRule> {
        self.rules
            .iter()
            .filter(|rule| specifier.starts_with(rule.prefix.as_str()))
            .max_by_key(|rule| rule.prefix.chars().count())
    }
}

impl Serialize for AliasResolver {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.rules.len()))?;
        for rule in &self.rules {
            map.serialize_entry(&rule.prefix, &rule.target)?;
        }
        map.end()
    }
}
