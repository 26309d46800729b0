//! Build configuration for pagekit static sites.
//!
//! Declares named entry points, per-page template variables, import aliases
//! and the output directory, validates all of them eagerly and hands out an
//! immutable [`BuildConfig`] for the bundler and the template engine.
//!
//! Configuration is read from `pagekit.toml`, auto-discovered in the current
//! directory and its parents. CLI settings can be applied during load via
//! [`CliSettings`].
//!
//! ```toml
//! root = "src"
//! base = "./"
//!
//! [variables."index.html"]
//! page = "home"
//!
//! [entries]
//! main = "src/index.html"
//!
//! [aliases]
//! "@" = "src"
//!
//! [build]
//! out_dir = "../dist"
//! empty_out_dir = true
//! ```
//!
//! ## Path Resolution
//!
//! - `root`, entry paths and alias targets are relative to the directory
//!   containing `pagekit.toml` (the project root)
//! - `build.out_dir` is relative to `root` and must stay inside the project root
//! - `[variables]` keys are page keys: entry paths relative to `root`. With
//!   the default `root = "."`, the entry `src/index.html` is the page
//!   `src/index.html`, not `index.html`
//! - `build.out_dir` must not hold any entry source or alias target
//!
//! ## Environment Variable Expansion
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `base`
//! - `build.out_dir`

mod alias;
mod assembler;
mod entries;
mod error;
mod expand;
mod output;
mod path;
mod variables;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

pub use alias::{AliasResolver, AliasRule};
pub use assembler::{
    BuildConfig, BuildConfigAssembler, DEFAULT_BASE_PATH, DEFAULT_OUT_DIR, OutputDeclaration,
};
pub use entries::{EntryPoint, EntryPointRegistry};
pub use error::{ConfigError, UnsafeReason, ValidationError};
pub use output::{BuildOutputSpec, OutputPlanner};
pub use variables::{PageVariableRegistry, PageVariables, VariableValue};

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override output directory (relative to the working directory).
    pub out_dir: Option<PathBuf>,
    /// Override asset base path.
    pub base_path: Option<String>,
    /// Override the empty-before-build flag.
    pub empty_out_dir: Option<bool>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "pagekit.toml";

/// Raw configuration as parsed from TOML.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    root: Option<String>,
    base: Option<String>,
    variables: BTreeMap<String, PageVariables>,
    entries: BTreeMap<String, String>,
    aliases: BTreeMap<String, String>,
    build: BuildSection,
}

/// Raw `[build]` section.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BuildSection {
    out_dir: Option<String>,
    empty_out_dir: Option<bool>,
}

/// Loaded, not yet validated, configuration.
#[derive(Debug)]
pub struct Config {
    file: ConfigFile,
    /// Directory containing the config file (or the working directory).
    pub project_root: PathBuf,
    /// Output settings after env expansion and CLI overrides.
    pub output: OutputDeclaration,
    /// Path to the config file (set after loading).
    pub config_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `pagekit.toml` in current directory and parents,
    /// falling back to defaults rooted at the current directory.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails or
    /// an environment variable is missing.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            tracing::debug!("No {CONFIG_FILENAME} found, using defaults");
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings)?;
        }

        Ok(config)
    }

    /// Collect the declarations into a fresh assembler.
    #[must_use]
    pub fn assembler(&self) -> BuildConfigAssembler {
        let mut assembler = BuildConfigAssembler::new(&self.project_root);
        if let Some(root) = &self.file.root {
            assembler = assembler.source_root(root);
        }
        for (page_key, variables) in &self.file.variables {
            assembler = assembler.page(page_key, variables.clone());
        }
        for (name, source_path) in &self.file.entries {
            assembler = assembler.entry(name, source_path);
        }
        for (prefix, target) in &self.file.aliases {
            assembler = assembler.alias(prefix, target);
        }
        assembler.output(self.output.clone())
    }

    /// Validate the configuration into a [`BuildConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ConfigurationInvalid`] with every validation failure.
    pub fn assemble(&self) -> Result<BuildConfig, ConfigError> {
        self.assembler().assemble()
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) -> Result<(), ConfigError> {
        if let Some(out_dir) = &settings.out_dir {
            self.output.output_dir = std::path::absolute(out_dir)?;
        }
        if let Some(base_path) = &settings.base_path {
            self.output.base_path.clone_from(base_path);
        }
        if let Some(empty_out_dir) = settings.empty_out_dir {
            self.output.empty_before_build = empty_out_dir;
        }
        Ok(())
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config rooted at the current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config rooted at the given directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            file: ConfigFile::default(),
            project_root: base.to_path_buf(),
            output: OutputDeclaration::default(),
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut file: ConfigFile = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        Self::expand_env_vars(&mut file)?;

        let path = std::path::absolute(path)?;
        let project_root = path.parent().unwrap_or(Path::new("/")).to_path_buf();
        let output = OutputDeclaration {
            output_dir: file
                .build
                .out_dir
                .as_deref()
                .map_or_else(|| PathBuf::from(DEFAULT_OUT_DIR), PathBuf::from),
            empty_before_build: file.build.empty_out_dir.unwrap_or(true),
            base_path: file
                .base
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_PATH.to_owned()),
        };

        tracing::debug!(config = %path.display(), "Loaded configuration");
        Ok(Self {
            file,
            project_root,
            output,
            config_path: Some(path),
        })
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(file: &mut ConfigFile) -> Result<(), ConfigError> {
        if let Some(base) = &file.base {
            file.base = Some(expand::expand_env(base, "base")?);
        }
        if let Some(out_dir) = &file.build.out_dir {
            file.build.out_dir = Some(expand::expand_env(out_dir, "build.out_dir")?);
        }
        Ok(())
    }
}
