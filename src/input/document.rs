//! Structured document decoding shared by outlines and fragments.

use std::path::Path;

use serde::de::DeserializeOwned;

use super::SourceError;

/// Serialization format of a source file, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// `.yaml` or `.yml`
    Yaml,
    /// `.json`
    Json,
}

impl DocumentFormat {
    /// Format implied by the extension of `path`.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml" | "yml") => Some(Self::Yaml),
            Some("json") => Some(Self::Json),
            _ => None,
        }
    }
}

/// Decodes `content` read from `path` into `T`.
///
/// # Errors
/// - Unsupported extension or invalid content
pub fn parse<T: DeserializeOwned>(path: &Path, content: &str) -> Result<T, SourceError> {
    let format = DocumentFormat::from_path(path)
        .ok_or_else(|| SourceError::UnsupportedFormat { path: path.to_path_buf() })?;
    let syntax = |message: String| SourceError::Syntax { path: path.to_path_buf(), message };
    match format {
        DocumentFormat::Yaml => serde_yaml::from_str(content).map_err(|e| syntax(e.to_string())),
        DocumentFormat::Json => serde_json::from_str(content).map_err(|e| syntax(e.to_string())),
    }
}

/// Reads and decodes the file at `path`.
///
/// # Errors
/// - The file cannot be read or decoded
pub async fn read<T: DeserializeOwned>(path: &Path) -> Result<T, SourceError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SourceError::Io { path: path.to_path_buf(), source })?;
    parse(path, &content)
}
