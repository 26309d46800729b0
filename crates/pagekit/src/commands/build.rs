//! `pagekit build` command implementation.

use std::path::PathBuf;

use clap::Args;
use pagekit_config::{CliSettings, Config};
use pagekit_site::{StaticSiteBuilder, write_manifest};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the build command.
#[derive(Args)]
pub(crate) struct BuildArgs {
    /// Path to configuration file (default: auto-discover pagekit.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output directory (overrides config).
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// Asset base path, e.g. "./" or "/docs/" (overrides config).
    #[arg(long, env = "PAGEKIT_BASE")]
    base: Option<String>,

    /// Empty the output directory before building (default: enabled).
    #[arg(long)]
    empty_out_dir: Option<bool>,

    /// Keep prior contents of the output directory.
    #[arg(long, conflicts_with = "empty_out_dir")]
    no_empty_out_dir: bool,

    /// Write the bundler manifest (JSON) to this path.
    #[arg(long, conflicts_with = "check")]
    manifest: Option<PathBuf>,

    /// Validate the configuration without touching the filesystem.
    #[arg(long)]
    check: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl BuildArgs {
    /// Execute the build command.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the build fails.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            out_dir: self.out_dir.clone(),
            base_path: self.base.clone(),
            empty_out_dir: self.resolve_empty_out_dir(),
        };
        tracing::debug!(?cli_settings, config = ?self.config, "Loading configuration");
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        if let Some(path) = &config.config_path {
            output.info(&format!("Config: {}", path.display()));
        }

        let build = config.assemble()?;

        output.info(&format!("Root: {}", build.source_root().display()));
        output.info(&format!("Output: {}", build.output().output_dir().display()));
        output.info(&format!("Entries: {}", build.entries().len()));

        if self.check {
            output.success("Configuration is valid");
            return Ok(());
        }

        let report = StaticSiteBuilder::with_jinja(&build).build()?;
        if report.removed > 0 {
            output.detail(&format!(
                "Removed {} item(s) from previous build",
                report.removed
            ));
        }
        for page in &report.pages {
            output.detail(&page.display().to_string());
        }

        if let Some(manifest) = &self.manifest {
            write_manifest(&build, manifest)?;
            output.info(&format!("Manifest: {}", manifest.display()));
        }

        output.success(&format!(
            "Built {} page(s) to {}",
            report.pages.len(),
            build.output().output_dir().display()
        ));
        Ok(())
    }

    /// Resolve `empty_out_dir` from --empty-out-dir/--no-empty-out-dir flags.
    fn resolve_empty_out_dir(&self) -> Option<bool> {
        self.no_empty_out_dir.then_some(false).or(self.empty_out_dir)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use super::*;

    fn args(config: &Path) -> BuildArgs {
        BuildArgs {
            config: Some(config.to_path_buf()),
            out_dir: None,
            base: None,
            empty_out_dir: None,
            no_empty_out_dir: false,
            manifest: None,
            check: false,
            verbose: false,
        }
    }

    fn project(toml: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/index.html"), "<p>{{ page }}</p>").unwrap();
        fs::write(dir.path().join("pagekit.toml"), toml).unwrap();
        dir
    }

    const TOML: &str = r#"
root = "src"
base = "./"

[variables."index.html"]
page = "home"

[entries]
main = "src/index.html"

[build]
out_dir = "../dist"
"#;

    #[test]
    fn test_resolve_empty_out_dir() {
        let dir = project(TOML);
        let mut args = args(&dir.path().join("pagekit.toml"));
        assert_eq!(args.resolve_empty_out_dir(), None);

        args.empty_out_dir = Some(true);
        assert_eq!(args.resolve_empty_out_dir(), Some(true));

        args.empty_out_dir = None;
        args.no_empty_out_dir = true;
        assert_eq!(args.resolve_empty_out_dir(), Some(false));
    }

    #[test]
    fn test_execute_builds_pages_and_manifest() {
        let dir = project(TOML);
        let manifest = dir.path().join(".pagekit/manifest.json");
        let mut args = args(&dir.path().join("pagekit.toml"));
        args.manifest = Some(manifest.clone());

        args.execute().unwrap();

        assert_eq!(
            fs::read_to_string(dir.path().join("dist/index.html")).unwrap(),
            "<p>home</p>"
        );
        assert!(manifest.is_file());
    }

    #[test]
    fn test_execute_check_writes_nothing() {
        let dir = project(TOML);
        let mut args = args(&dir.path().join("pagekit.toml"));
        args.check = true;

        args.execute().unwrap();

        assert!(!dir.path().join("dist").exists());
    }

    #[test]
    fn test_execute_reports_all_validation_errors() {
        let dir = project(
            r#"
[entries]
main = "src/missing.html"
blog = "src/blog.html"

[build]
out_dir = "../outside"
"#,
        );

        let err = args(&dir.path().join("pagekit.toml")).execute().unwrap_err();

        assert_eq!(err.validation_errors().len(), 3, "got {err:?}");
    }

    #[test]
    fn test_execute_missing_config_is_config_error() {
        let dir = tempfile::tempdir().unwrap();

        let err = args(&dir.path().join("pagekit.toml")).execute().unwrap_err();

        assert!(
            matches!(err, CliError::Config(pagekit_config::ConfigError::NotFound(_))),
            "got {err:?}"
        );
        assert!(err.validation_errors().is_empty());
    }
}
