//! Holds the validated settings of one source directory.

use std::path::{
    Path,
    PathBuf,
};

use super::{
    BuildSettings,
    ConfigError,
    loader,
};

/// Owns the current settings and the directory they were loaded from.
#[derive(Default, Debug, Clone)]
pub struct ConfigManager {
    /// Last settings that passed validation.
    current_settings: BuildSettings,
    /// Set once settings were loaded from a directory.
    source_dir: Option<PathBuf>,
}

impl ConfigManager {
    /// Creates a manager holding the default settings.
    #[must_use]
    pub fn new() -> Self {
        Self { current_settings: BuildSettings::default(), source_dir: None }
    }

    /// Loads `.diplomat.json` from `source_dir`, falling back to defaults.
    ///
    /// # Errors
    /// - I/O error while reading the file
    /// - JSON parse error
    /// - Validation error
    pub fn load_settings(&mut self, source_dir: &Path) -> Result<(), ConfigError> {
        tracing::debug!("Loading settings for source directory: {:?}", source_dir);

        let settings = loader::load_from_source_dir(source_dir)?.unwrap_or_else(|| {
            tracing::debug!("Using default settings");
            BuildSettings::default()
        });

        settings.validate().map_err(ConfigError::ValidationErrors)?;

        self.current_settings = settings;
        self.source_dir = Some(source_dir.to_path_buf());
        tracing::debug!("Settings loaded successfully: {:?}", self.current_settings);

        Ok(())
    }

    /// Replaces the settings after validating them. Used for command-line overrides.
    ///
    /// # Errors
    /// - Validation error; the previous settings stay in place
    pub fn update_settings(&mut self, new_settings: BuildSettings) -> Result<(), ConfigError> {
        new_settings.validate().map_err(ConfigError::ValidationErrors)?;
        self.current_settings = new_settings;
        tracing::debug!("Settings updated successfully");
        Ok(())
    }

    /// Current settings.
    #[must_use]
    pub const fn get_settings(&self) -> &BuildSettings {
        &self.current_settings
    }

    /// Directory the settings were loaded from.
    #[must_use]
    pub fn source_dir(&self) -> Option<&Path> {
        self.source_dir.as_deref()
    }

    /// Output directory with relative paths resolved against the source directory.
    #[must_use]
    pub fn resolved_output_dir(&self) -> PathBuf {
        match &self.source_dir {
            Some(dir) if self.current_settings.output_dir.is_relative() => {
                dir.join(&self.current_settings.output_dir)
            }
            _ => self.current_settings.output_dir.clone(),
        }
    }
}
