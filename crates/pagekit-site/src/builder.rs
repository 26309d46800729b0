//! Static page emission.
//!
//! A build runs in two phases. Planning reads every entry source and renders
//! it in memory; only once every page rendered does execution prepare the
//! output directory (emptying it if configured) and write the pages. A
//! template error therefore never leaves a half-cleared output directory.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use pagekit_config::{BuildConfig, ConfigError};

use crate::engine::{PageContext, TemplateEngine};
use crate::jinja::JinjaEngine;

/// Error returned by the static site builder.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("Manifest error: {0}")]
    Manifest(#[from] serde_json::Error),

    #[error("Failed to read entry '{name}' from {}: {source}", .path.display())]
    ReadEntry {
        name: String,
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Entries '{first}' and '{second}' both render to {}", .path.display())]
    OutputCollision {
        first: String,
        second: String,
        path: PathBuf,
    },
}

/// Where one entry page is read from and written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagePlan {
    /// Entry name.
    pub entry: String,
    /// Page identifier used for the variable lookup.
    pub page_key: String,
    /// Absolute source path.
    pub source_path: PathBuf,
    /// Absolute output path.
    pub output_path: PathBuf,
}

/// Result of a successful build.
#[derive(Debug, Default)]
pub struct BuildReport {
    /// Written pages, in entry order.
    pub pages: Vec<PathBuf>,
    /// Top-level entries removed from the output directory beforehand.
    pub removed: usize,
}

/// Renders every entry page of a [`BuildConfig`] into its output directory.
pub struct StaticSiteBuilder<'a, E> {
    config: &'a BuildConfig,
    engine: E,
}

impl<'a> StaticSiteBuilder<'a, JinjaEngine> {
    /// Create a builder using the minijinja engine.
    #[must_use]
    pub fn with_jinja(config: &'a BuildConfig) -> Self {
        Self::new(config, JinjaEngine::new(config))
    }
}

impl<'a, E: TemplateEngine> StaticSiteBuilder<'a, E> {
    /// Create a builder with a custom template engine.
    #[must_use]
    pub fn new(config: &'a BuildConfig, engine: E) -> Self {
        Self { config, engine }
    }

    /// Map every entry to its output file.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::OutputCollision`] if two entries share a page
    /// identifier and would overwrite each other.
    pub fn plan(&self) -> Result<Vec<PagePlan>, BuildError> {
        let output_dir = self.config.output().output_dir();
        let mut claimed: HashMap<String, &str> = HashMap::new();
        let mut plan = Vec::with_capacity(self.config.entries().len());

        for entry in self.config.entries().all() {
            let page_key = self.config.page_key(entry);
            if let Some(first) = claimed.insert(page_key.clone(), &entry.name) {
                return Err(BuildError::OutputCollision {
                    first: first.to_owned(),
                    second: entry.name.clone(),
                    path: output_dir.join(&page_key),
                });
            }
            plan.push(PagePlan {
                entry: entry.name.clone(),
                output_path: output_dir.join(&page_key),
                page_key,
                source_path: entry.source_path.clone(),
            });
        }

        Ok(plan)
    }

    /// Render all pages, then prepare the output directory and write them.
    ///
    /// # Errors
    ///
    /// Returns an error if planning, reading, rendering or writing fails.
    /// Nothing in the output directory is touched unless every page rendered.
    pub fn build(&self) -> Result<BuildReport, BuildError> {
        let plan = self.plan()?;

        let mut rendered = Vec::with_capacity(plan.len());
        for page in plan {
            let source =
                fs::read_to_string(&page.source_path).map_err(|source| BuildError::ReadEntry {
                    name: page.entry.clone(),
                    path: page.source_path.clone(),
                    source,
                })?;
            let html = self.engine.render(&PageContext {
                page_key: &page.page_key,
                source: &source,
                variables: self.config.variables().lookup(&page.page_key),
            })?;
            tracing::debug!(entry = %page.entry, page = %page.page_key, "Rendered page");
            rendered.push((page.output_path, html));
        }

        let removed = self.config.output().prepare()?;

        let mut report = BuildReport {
            pages: Vec::with_capacity(rendered.len()),
            removed,
        };
        for (output_path, html) in rendered {
            if let Some(parent) = output_path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&output_path, html)?;
            report.pages.push(output_path);
        }

        tracing::info!(
            pages = report.pages.len(),
            output = %self.config.output().output_dir().display(),
            "Build complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::path::Path;

    use pagekit_config::{BuildConfigAssembler, OutputDeclaration, PageVariables};
    use pretty_assertions::assert_eq;

    use super::*;

    const LAYOUT: &str = r#"<!DOCTYPE html>
<html>
<head><link rel="stylesheet" href="{{ asset('assets/style.css') }}"></head>
<body data-page="{{ page }}">
{% block content %}{% endblock %}
<script type="module" src="{{ asset('/assets/main.js') }}"></script>
</body>
</html>"#;

    fn page_source(title: &str) -> String {
        format!(
            "{{% extends \"@/templates/layout.html\" %}}\
             {{% block content %}}<h1>{title}</h1><img src=\"{{{{ asset('img/logo.png') }}}}\">{{% endblock %}}"
        )
    }

    /// Project with the three-page site in `src/`.
    fn site() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(src.join("templates")).unwrap();
        fs::write(src.join("templates/layout.html"), LAYOUT).unwrap();
        for (file, title) in [
            ("index.html", "Home"),
            ("about.html", "About"),
            ("contact.html", "Contact"),
        ] {
            fs::write(src.join(file), page_source(title)).unwrap();
        }
        dir
    }

    fn page(value: &str) -> PageVariables {
        [("page", value)].into_iter().collect()
    }

    fn site_config(dir: &Path) -> BuildConfig {
        BuildConfigAssembler::new(dir)
            .source_root("src")
            .page("index.html", page("home"))
            .page("about.html", page("about"))
            .page("contact.html", page("contact"))
            .entry("main", "src/index.html")
            .entry("about", "src/about.html")
            .entry("contact", "src/contact.html")
            .alias("@", "src")
            .output(OutputDeclaration {
                output_dir: PathBuf::from("../dist"),
                empty_before_build: true,
                base_path: "./".to_owned(),
            })
            .assemble()
            .unwrap()
    }

    /// Engine that records the variables each page was rendered with.
    #[derive(Default)]
    struct RecordingEngine {
        calls: RefCell<Vec<(String, PageVariables)>>,
    }

    impl TemplateEngine for RecordingEngine {
        fn render(&self, page: &PageContext<'_>) -> Result<String, BuildError> {
            self.calls
                .borrow_mut()
                .push((page.page_key.to_owned(), page.variables.clone()));
            Ok(format!("rendered {}", page.page_key))
        }
    }

    #[test]
    fn test_build_three_page_site() {
        let dir = site();
        let config = site_config(dir.path());

        let report = StaticSiteBuilder::with_jinja(&config).build().unwrap();

        let dist = dir.path().join("dist");
        assert_eq!(
            report.pages,
            vec![
                dist.join("index.html"),
                dist.join("about.html"),
                dist.join("contact.html")
            ]
        );
        for (file, page, title) in [
            ("index.html", "home", "Home"),
            ("about.html", "about", "About"),
            ("contact.html", "contact", "Contact"),
        ] {
            let html = fs::read_to_string(dist.join(file)).unwrap();
            assert!(html.contains(&format!("data-page=\"{page}\"")), "{file}: {html}");
            assert!(html.contains(&format!("<h1>{title}</h1>")), "{file}: {html}");
            assert!(html.contains("href=\"./assets/style.css\""), "{file}: {html}");
            assert!(html.contains("src=\"./assets/main.js\""), "{file}: {html}");
            assert!(html.contains("src=\"./img/logo.png\""), "{file}: {html}");
        }
    }

    #[test]
    fn test_build_empties_residue_from_previous_build() {
        let dir = site();
        let dist = dir.path().join("dist");
        fs::create_dir_all(dist.join("old")).unwrap();
        fs::write(dist.join("unrelated.txt"), "stale").unwrap();
        fs::write(dist.join("old/page.html"), "stale").unwrap();
        let config = site_config(dir.path());

        let report = StaticSiteBuilder::with_jinja(&config).build().unwrap();

        assert_eq!(report.removed, 2);
        let mut files: Vec<_> = fs::read_dir(&dist)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        files.sort();
        assert_eq!(files, vec!["about.html", "contact.html", "index.html"]);
    }

    #[test]
    fn test_build_keeps_residue_without_empty_flag() {
        let dir = site();
        let dist = dir.path().join("dist");
        fs::create_dir_all(&dist).unwrap();
        fs::write(dist.join("unrelated.txt"), "kept").unwrap();
        let config = BuildConfigAssembler::new(dir.path())
            .source_root("src")
            .entry("main", "src/index.html")
            .alias("@", "src")
            .output(OutputDeclaration {
                output_dir: PathBuf::from("../dist"),
                empty_before_build: false,
                base_path: "/".to_owned(),
            })
            .assemble()
            .unwrap();

        let report = StaticSiteBuilder::with_jinja(&config).build().unwrap();

        assert_eq!(report.removed, 0);
        assert!(dist.join("unrelated.txt").exists());
        assert!(dist.join("index.html").exists());
    }

    #[test]
    fn test_build_passes_page_variables_and_empty_fallback() {
        let dir = site();
        fs::write(dir.path().join("src/extra.html"), "extra").unwrap();
        let config = BuildConfigAssembler::new(dir.path())
            .source_root("src")
            .page("index.html", page("home"))
            .entry("main", "src/index.html")
            .entry("extra", "src/extra.html")
            .output(OutputDeclaration {
                output_dir: PathBuf::from("../dist"),
                ..OutputDeclaration::default()
            })
            .assemble()
            .unwrap();
        let engine = RecordingEngine::default();

        let builder = StaticSiteBuilder::new(&config, engine);
        builder.build().unwrap();

        assert_eq!(
            *builder.engine.calls.borrow(),
            vec![
                ("index.html".to_owned(), page("home")),
                ("extra.html".to_owned(), PageVariables::new()),
            ]
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("dist/extra.html")).unwrap(),
            "rendered extra.html"
        );
    }

    #[test]
    fn test_plan_nested_pages() {
        let dir = site();
        fs::create_dir_all(dir.path().join("src/blog")).unwrap();
        fs::write(dir.path().join("src/blog/post.html"), "post").unwrap();
        let config = BuildConfigAssembler::new(dir.path())
            .source_root("src")
            .entry("post", "src/blog/post.html")
            .output(OutputDeclaration {
                output_dir: PathBuf::from("../dist"),
                ..OutputDeclaration::default()
            })
            .assemble()
            .unwrap();

        let plan = StaticSiteBuilder::new(&config, RecordingEngine::default())
            .plan()
            .unwrap();

        assert_eq!(
            plan,
            vec![PagePlan {
                entry: "post".to_owned(),
                page_key: "blog/post.html".to_owned(),
                source_path: dir.path().join("src/blog/post.html"),
                output_path: dir.path().join("dist/blog/post.html"),
            }]
        );
    }

    #[test]
    fn test_plan_detects_output_collision() {
        let dir = site();
        fs::create_dir_all(dir.path().join("other")).unwrap();
        fs::write(dir.path().join("other/index.html"), "other").unwrap();
        let config = BuildConfigAssembler::new(dir.path())
            .source_root("src")
            .entry("main", "src/index.html")
            .entry("other", "other/index.html")
            .output(OutputDeclaration {
                output_dir: PathBuf::from("../dist"),
                ..OutputDeclaration::default()
            })
            .assemble()
            .unwrap();

        let err = StaticSiteBuilder::new(&config, RecordingEngine::default())
            .build()
            .unwrap_err();

        assert!(
            matches!(&err, BuildError::OutputCollision { first, second, .. } if first == "main" && second == "other"),
            "got {err:?}"
        );
        assert!(!dir.path().join("dist").exists());
    }

    #[test]
    fn test_template_error_leaves_output_untouched() {
        let dir = site();
        fs::write(dir.path().join("src/index.html"), "{% include 'missing.html' %}").unwrap();
        let dist = dir.path().join("dist");
        fs::create_dir_all(&dist).unwrap();
        fs::write(dist.join("previous.html"), "previous").unwrap();
        let config = site_config(dir.path());

        let err = StaticSiteBuilder::with_jinja(&config).build().unwrap_err();

        assert!(matches!(err, BuildError::Template(_)), "got {err:?}");
        assert!(dist.join("previous.html").exists());
    }
}
