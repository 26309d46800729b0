//! Bundler manifest emission.

use std::fs;
use std::path::Path;

use pagekit_config::BuildConfig;

use crate::builder::BuildError;

/// Write the build configuration as pretty-printed JSON for the bundler.
///
/// The manifest carries `root`, `variables`, `entries`, `aliases`,
/// `outputDir`, `emptyBeforeBuild` and `basePath`.
pub fn write_manifest(config: &BuildConfig, path: &Path) -> Result<(), BuildError> {
    let mut json = serde_json::to_string_pretty(config)?;
    json.push('\n');
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, json)?;
    tracing::info!(path = %path.display(), "Wrote bundler manifest");
    Ok(())
}
