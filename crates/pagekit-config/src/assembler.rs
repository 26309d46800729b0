//! Assembly of all declarations into one validated build configuration.
//!
//! A [`BuildConfigAssembler`] holds unvalidated declarations.
//! [`BuildConfigAssembler::assemble`] consumes it, runs every validation and
//! either returns a [`BuildConfig`] snapshot or every failure it found. The
//! assembler cannot be reused, so a configuration never goes back to the
//! unvalidated state; each build invocation starts a fresh one.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::alias::AliasResolver;
use crate::entries::{EntryPoint, EntryPointRegistry};
use crate::error::{ConfigError, UnsafeReason, ValidationError};
use crate::output::{BuildOutputSpec, OutputPlanner};
use crate::path;
use crate::variables::{PageVariableRegistry, PageVariables};

/// Default output directory, relative to the source root.
pub const DEFAULT_OUT_DIR: &str = "dist";

/// Default asset base path.
pub const DEFAULT_BASE_PATH: &str = "/";

/// Output declaration before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDeclaration {
    /// Output directory, relative to the source root or absolute.
    pub output_dir: PathBuf,
    /// Remove prior contents before building.
    pub empty_before_build: bool,
    /// Asset URL prefix.
    pub base_path: String,
}

impl Default for OutputDeclaration {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUT_DIR),
            empty_before_build: true,
            base_path: DEFAULT_BASE_PATH.to_owned(),
        }
    }
}

/// Collects declarations for one build invocation.
#[derive(Debug)]
pub struct BuildConfigAssembler {
    project_root: PathBuf,
    source_root: PathBuf,
    pages: Vec<(String, PageVariables)>,
    entries: Vec<(String, PathBuf)>,
    aliases: Vec<(String, PathBuf)>,
    output: OutputDeclaration,
}

impl BuildConfigAssembler {
    /// Start an assembly for the given absolute project root.
    ///
    /// The source root defaults to the project root.
    #[must_use]
    pub fn new(project_root: impl AsRef<Path>) -> Self {
        Self {
            project_root: path::normalize(project_root.as_ref()),
            source_root: PathBuf::from("."),
            pages: Vec::new(),
            entries: Vec::new(),
            aliases: Vec::new(),
            output: OutputDeclaration::default(),
        }
    }

    /// Set the source root, relative to the project root.
    #[must_use]
    pub fn source_root(mut self, source_root: impl Into<PathBuf>) -> Self {
        self.source_root = source_root.into();
        self
    }

    /// Declare variables for a page.
    #[must_use]
    pub fn page(mut self, page_key: impl Into<String>, variables: PageVariables) -> Self {
        self.pages.push((page_key.into(), variables));
        self
    }

    /// Declare an entry point.
    #[must_use]
    pub fn entry(mut self, name: impl Into<String>, source_path: impl Into<PathBuf>) -> Self {
        self.entries.push((name.into(), source_path.into()));
        self
    }

    /// Declare an alias rule.
    #[must_use]
    pub fn alias(mut self, prefix: impl Into<String>, target: impl Into<PathBuf>) -> Self {
        self.aliases.push((prefix.into(), target.into()));
        self
    }

    /// Declare the output settings.
    #[must_use]
    pub fn output(mut self, output: OutputDeclaration) -> Self {
        self.output = output;
        self
    }

    /// Validate every declaration and build the configuration snapshot.
    ///
    /// Validation never touches the filesystem beyond existence checks.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ConfigurationInvalid`] with every validation
    /// failure if any declaration is invalid.
    pub fn assemble(self) -> Result<BuildConfig, ConfigError> {
        tracing::debug!(
            project_root = %self.project_root.display(),
            pages = self.pages.len(),
            entries = self.entries.len(),
            aliases = self.aliases.len(),
            "Validating build configuration"
        );

        let mut errors = Vec::new();

        let source_root = path::resolve(&self.project_root, &self.source_root);
        if !path::is_within(&source_root, &self.project_root) {
            errors.push(ValidationError::SourceRootOutsideProject {
                path: source_root.clone(),
            });
        }

        let mut variables = PageVariableRegistry::new();
        for (page_key, vars) in self.pages {
            collect(&mut errors, variables.register(page_key, vars));
        }

        let mut entries = EntryPointRegistry::new(&self.project_root);
        for (name, source_path) in self.entries {
            collect(&mut errors, entries.register(name, source_path));
        }

        let mut aliases = AliasResolver::new(&self.project_root);
        for (prefix, target) in self.aliases {
            collect(&mut errors, aliases.register(prefix, target));
        }

        let output = OutputPlanner::new(&self.project_root, &source_root).configure(
            &self.output.output_dir,
            self.output.empty_before_build,
            self.output.base_path,
        );
        let output = collect(&mut errors, output);
        if let Some(output) = &output {
            let mut sources = entries
                .all()
                .iter()
                .map(|entry| entry.source_path.as_path())
                .chain(aliases.rules().iter().map(|rule| rule.target.as_path()));
            if let Some(source) = sources.find(|source| output.contains(source)) {
                tracing::debug!(source = %source.display(), "Output directory holds sources");
                errors.push(ValidationError::UnsafeOutputPath {
                    path: output.output_dir().to_path_buf(),
                    reason: UnsafeReason::ContainsSources,
                });
            }
        }

        match output {
            Some(output) if errors.is_empty() => {
                tracing::info!(
                    entries = entries.len(),
                    pages = variables.len(),
                    output = %output.output_dir().display(),
                    "Build configuration valid"
                );
                let config = BuildConfig {
                    project_root: self.project_root,
                    source_root,
                    variables,
                    entries,
                    aliases,
                    output,
                };
                for page in config.unmatched_pages() {
                    tracing::debug!(page, "Variables declared for a page no entry renders");
                }
                Ok(config)
            }
            _ => {
                tracing::debug!(errors = errors.len(), "Build configuration invalid");
                Err(ConfigError::ConfigurationInvalid(errors))
            }
        }
    }
}

fn collect<T>(errors: &mut Vec<ValidationError>, result: Result<T, ValidationError>) -> Option<T> {
    result.map_err(|err| errors.push(err)).ok()
}

/// Immutable, validated build configuration.
///
/// Serializes to the manifest consumed by the bundler.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildConfig {
    #[serde(skip)]
    project_root: PathBuf,
    #[serde(rename = "root")]
    source_root: PathBuf,
    variables: PageVariableRegistry,
    entries: EntryPointRegistry,
    aliases: AliasResolver,
    #[serde(flatten)]
    output: BuildOutputSpec,
}

impl BuildConfig {
    /// Absolute project root.
    #[must_use]
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Absolute source root.
    #[must_use]
    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    /// Page variable bindings.
    #[must_use]
    pub fn variables(&self) -> &PageVariableRegistry {
        &self.variables
    }

    /// Entry points.
    #[must_use]
    pub fn entries(&self) -> &EntryPointRegistry {
        &self.entries
    }

    /// Alias rules.
    #[must_use]
    pub fn aliases(&self) -> &AliasResolver {
        &self.aliases
    }

    /// Output settings.
    #[must_use]
    pub fn output(&self) -> &BuildOutputSpec {
        &self.output
    }

    /// Page identifier of an entry point.
    ///
    /// This is the entry's path relative to the source root with `/`
    /// separators (e.g., `src/blog/post.html` with root `src` gives
    /// `blog/post.html`). Entries outside the source root use their file name.
    #[must_use]
    pub fn page_key(&self, entry: &EntryPoint) -> String {
        match entry.source_path.strip_prefix(&self.source_root) {
            Ok(relative) => path::to_slash(relative),
            Err(_) => entry
                .source_path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
        }
    }

    /// Page identifiers with declared variables that no entry renders.
    ///
    /// With the default source root `.`, an entry at `src/index.html` has the
    /// page key `src/index.html`, so variables declared for `index.html`
    /// end up here.
    #[must_use]
    pub fn unmatched_pages(&self) -> Vec<&str> {
        let rendered: Vec<String> = self
            .entries
            .all()
            .iter()
            .map(|entry| self.page_key(entry))
            .collect();
        self.variables
            .iter()
            .map(|(page, _)| page)
            .filter(|page| !rendered.iter().any(|key| key == page))
            .collect()
    }
}
