//! Reader type definitions.

use std::path::{
    Path,
    PathBuf,
};

use thiserror::Error;

use crate::config::MatcherError;
use crate::input::SourceError;
use crate::ir::PartialTranslation;

/// Failure while discovering, loading or watching sources.
#[derive(Error, Debug)]
pub enum ReaderError {
    /// An outline or fragment could not be read or parsed.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// No file in the directory matches the outline name.
    #[error("No outline named '{name}' found in '{}'", dir.display())]
    OutlineMissing {
        /// Source directory.
        dir: PathBuf,
        /// Configured outline base name.
        name: String,
    },

    /// The source directory itself cannot be resolved or read.
    #[error("Failed to list source directory '{}': {source}", dir.display())]
    Discovery {
        /// Source directory.
        dir: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// An entry of the source directory cannot be read.
    #[error("Failed to read an entry of '{}': {source}", dir.display())]
    Walk {
        /// Source directory.
        dir: PathBuf,
        /// Walker error, carrying the entry path when known.
        #[source]
        source: ignore::Error,
    },

    /// The configured file pattern is invalid.
    #[error(transparent)]
    Matcher(#[from] MatcherError),

    /// The filesystem watcher failed to start or reported an error.
    #[error("File watcher failed: {0}")]
    Watch(#[from] notify::Error),

    /// A loader task panicked or was cancelled.
    #[error("Loader task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Change of one fragment source published in continuous mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FragmentUpdate {
    /// The file was (re)parsed successfully.
    Loaded(PartialTranslation),
    /// The source file no longer exists.
    Removed(PathBuf),
}

impl FragmentUpdate {
    /// Source path the update refers to.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Loaded(translation) => translation.path(),
            Self::Removed(path) => path,
        }
    }
}
