//! Classifies files of a source directory as the outline or a fragment.

use std::path::{
    Path,
    PathBuf,
};

use globset::{
    Glob,
    GlobMatcher,
};

use super::{
    BuildSettings,
    SETTINGS_FILE_NAME,
};

/// Failure while building a [`FileMatcher`].
#[derive(Debug, thiserror::Error)]
pub enum MatcherError {
    /// `filePattern` is not a valid glob.
    #[error("Invalid file pattern '{pattern}': {source}")]
    InvalidFilePattern {
        /// The rejected pattern.
        pattern: String,
        /// Glob parser error.
        #[source]
        source: globset::Error,
    },
}

/// Role of a file inside the source directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Base name equals the configured outline name.
    Outline,
    /// Any other matching file.
    Fragment,
}

/// Matches files against the configured pattern and reserved outline name.
#[derive(Debug, Clone)]
pub struct FileMatcher {
    /// Directory whose direct children are sources.
    source_dir: PathBuf,
    /// Compiled `filePattern`.
    file_set: GlobMatcher,
    /// Reserved outline base name.
    outline_name: String,
}

impl FileMatcher {
    /// Compiles the settings' file pattern for `source_dir`.
    ///
    /// # Errors
    /// - Invalid glob pattern
    pub fn new(source_dir: PathBuf, settings: &BuildSettings) -> Result<Self, MatcherError> {
        let file_set = Glob::new(&settings.file_pattern)
            .map_err(|source| MatcherError::InvalidFilePattern {
                pattern: settings.file_pattern.clone(),
                source,
            })?
            .compile_matcher();

        Ok(Self { source_dir, file_set, outline_name: settings.outline_name.clone() })
    }

    /// Directory the matcher classifies children of.
    #[must_use]
    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    /// Reserved outline base name.
    #[must_use]
    pub fn outline_name(&self) -> &str {
        &self.outline_name
    }

    /// Classifies an absolute path under the source directory.
    #[must_use]
    pub fn classify(&self, absolute_path: &Path) -> Option<SourceKind> {
        let relative_path = absolute_path.strip_prefix(&self.source_dir).ok()?;
        self.classify_relative(relative_path)
    }

    /// Classifies a path relative to the source directory. Only direct children qualify.
    #[must_use]
    pub fn classify_relative(&self, relative_path: &Path) -> Option<SourceKind> {
        if relative_path.components().count() != 1 {
            return None;
        }
        let file_name = relative_path.file_name()?;
        if file_name == SETTINGS_FILE_NAME || !self.file_set.is_match(relative_path) {
            return None;
        }

        let is_outline = relative_path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .is_some_and(|stem| stem == self.outline_name);

        Some(if is_outline { SourceKind::Outline } else { SourceKind::Fragment })
    }
}
