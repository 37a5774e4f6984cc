//! Reads `.diplomat.json` from a source directory.

use std::path::Path;

use super::{
    BuildSettings,
    ConfigError,
};

/// Settings file looked up in the source directory. Never treated as a fragment.
pub const SETTINGS_FILE_NAME: &str = ".diplomat.json";

/// # Returns
/// - `Ok(Some(settings))`: the file exists and parsed
/// - `Ok(None)`: no settings file
///
/// # Errors
/// - I/O error while reading the file
/// - JSON parse error
pub(super) fn load_from_source_dir(source_dir: &Path) -> Result<Option<BuildSettings>, ConfigError> {
    let config_path = source_dir.join(SETTINGS_FILE_NAME);

    if !config_path.exists() {
        tracing::debug!("Settings file not found: {:?}", config_path);
        return Ok(None);
    }

    tracing::debug!("Loading settings from: {:?}", config_path);

    let content = std::fs::read_to_string(&config_path)?;
    let settings: BuildSettings = serde_json::from_str(&content)?;

    Ok(Some(settings))
}
