//! Template engine abstraction.

use pagekit_config::PageVariables;

use crate::builder::BuildError;

/// Everything a template engine needs to render one page.
#[derive(Debug, Clone, Copy)]
pub struct PageContext<'a> {
    /// Page identifier (path relative to the source root, e.g. `about.html`).
    pub page_key: &'a str,
    /// Raw template source of the entry file.
    pub source: &'a str,
    /// Variables bound to the page; empty if none were registered.
    pub variables: &'a PageVariables,
}

/// Renders page markup from a template source and its variables.
///
/// Implementations must not fail because `variables` is empty: pages
/// without a binding are rendered with an empty mapping.
pub trait TemplateEngine {
    /// Render a page.
    fn render(&self, page: &PageContext<'_>) -> Result<String, BuildError>;
}
