//! Static page emission for pagekit.
//!
//! Executes a validated [`BuildConfig`](pagekit_config::BuildConfig): empties
//! the output directory when asked to, renders every entry page through a
//! [`TemplateEngine`] with its bound variables, and writes the bundler
//! manifest.

mod builder;
mod engine;
mod jinja;
mod manifest;

pub use builder::{BuildError, BuildReport, PagePlan, StaticSiteBuilder};
pub use engine::{PageContext, TemplateEngine};
pub use jinja::JinjaEngine;
pub use manifest::write_manifest;
