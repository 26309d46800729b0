//! Jinja-compatible template engine backed by minijinja.
//!
//! Templates see:
//! - every page variable at top level (e.g. `{{ page }}`)
//! - `page_key` - the page identifier, unless a variable shadows it
//! - `base_path` - the configured asset base path
//! - `asset(path)` - `path` prefixed with the base path
//!
//! `{% include %}` and `{% extends %}` names go through the alias resolver
//! first (`@/layouts/base.html`), then resolve relative to the source root.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Component, Path};

use minijinja::{Environment, ErrorKind, Value};
use pagekit_config::{AliasResolver, BuildConfig, VariableValue};

use crate::builder::BuildError;
use crate::engine::{PageContext, TemplateEngine};

/// minijinja-backed [`TemplateEngine`].
pub struct JinjaEngine {
    env: Environment<'static>,
}

impl JinjaEngine {
    /// Create an engine for a validated build configuration.
    #[must_use]
    pub fn new(config: &BuildConfig) -> Self {
        let mut env = Environment::new();

        let aliases = config.aliases().clone();
        let source_root = config.source_root().to_path_buf();
        env.set_loader(move |name| load_template(&aliases, &source_root, name));

        let output = config.output().clone();
        env.add_global(
            "base_path",
            Value::from_safe_string(output.base_path().to_owned()),
        );
        env.add_function("asset", move |path: &str| {
            Value::from_safe_string(output.asset_url(path))
        });

        Self { env }
    }
}

impl TemplateEngine for JinjaEngine {
    fn render(&self, page: &PageContext<'_>) -> Result<String, BuildError> {
        let mut ctx: BTreeMap<&str, Value> = page
            .variables
            .iter()
            .map(|(name, value)| (name, to_value(value)))
            .collect();
        ctx.entry("page_key").or_insert_with(|| Value::from(page.page_key));

        Ok(self.env.render_named_str(page.page_key, page.source, ctx)?)
    }
}

fn to_value(value: &VariableValue) -> Value {
    match value {
        VariableValue::Bool(value) => Value::from(*value),
        VariableValue::Integer(value) => Value::from(*value),
        VariableValue::Float(value) => Value::from(*value),
        VariableValue::String(value) => Value::from(value.as_str()),
    }
}

/// Loader for included and extended templates.
///
/// Unknown names yield `Ok(None)` so minijinja reports a regular
/// "template not found" error.
fn load_template(
    aliases: &AliasResolver,
    source_root: &Path,
    name: &str,
) -> Result<Option<String>, minijinja::Error> {
    let path = match aliases.resolve_path(name) {
        Some(path) => path,
        None if is_plain_relative(name) => source_root.join(name),
        None => return Ok(None),
    };

    match fs::read_to_string(&path) {
        Ok(source) => {
            tracing::debug!(template = name, path = %path.display(), "Loaded template");
            Ok(Some(source))
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(minijinja::Error::new(
            ErrorKind::InvalidOperation,
            format!("could not read template {}", path.display()),
        )
        .with_source(err)),
    }
}

/// Relative path without `.`/`..` components, so it cannot leave the root.
fn is_plain_relative(name: &str) -> bool {
    !name.is_empty()
        && Path::new(name)
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
}
