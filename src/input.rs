//! Source file inputs: the outline and translation fragments.

pub mod document;
pub mod fragment;
pub mod outline;

use std::path::{
    Path,
    PathBuf,
};

use thiserror::Error;

use crate::ir::NkvError;
pub use outline::{
    OptionBag,
    OptionError,
    Outline,
    OutlineError,
};

/// Failure to turn one source file into its in-memory form.
///
/// Every variant carries the offending path.
#[derive(Error, Debug)]
pub enum SourceError {
    /// The file cannot be read.
    #[error("Failed to read '{}': {source}", path.display())]
    Io {
        /// Source file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The content is not valid YAML or JSON for the expected shape.
    #[error("Failed to parse '{}': {message}", path.display())]
    Syntax {
        /// Source file.
        path: PathBuf,
        /// Decoder message.
        message: String,
    },

    /// The outline decoded but is invalid.
    #[error("Invalid outline '{}': {source}", path.display())]
    Outline {
        /// Source file.
        path: PathBuf,
        /// What is invalid.
        #[source]
        source: OutlineError,
    },

    /// The fragment tree is malformed.
    #[error("Invalid fragment '{}': {source}", path.display())]
    Fragment {
        /// Source file.
        path: PathBuf,
        /// What is malformed.
        #[source]
        source: NkvError,
    },

    /// The extension is neither YAML nor JSON.
    #[error("Unsupported source format '{}' (expected .yaml, .yml or .json)", path.display())]
    UnsupportedFormat {
        /// Source file.
        path: PathBuf,
    },
}

impl SourceError {
    /// Path of the source file that failed.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Io { path, .. }
            | Self::Syntax { path, .. }
            | Self::Outline { path, .. }
            | Self::Fragment { path, .. }
            | Self::UnsupportedFormat { path } => path,
        }
    }
}
