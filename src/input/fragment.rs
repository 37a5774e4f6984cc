//! Fragment files: nested translation data of one fragment name.

use std::path::Path;

use serde_json::Value;

use super::{
    SourceError,
    document,
};
use crate::ir::{
    NestedKeyValue,
    PartialTranslation,
};

/// Reads one fragment file into a [`PartialTranslation`].
///
/// An empty document yields an empty fragment.
///
/// # Errors
/// - The file cannot be read or decoded
/// - The document is not a tree of strings and numbers
pub async fn load_fragment(path: &Path) -> Result<PartialTranslation, SourceError> {
    tracing::debug!(path = %path.display(), "Loading fragment");
    let value: Value = document::read(path).await?;
    let data = match value {
        Value::Null => NestedKeyValue::new(),
        value => NestedKeyValue::from_value(&value)
            .map_err(|source| SourceError::Fragment { path: path.to_path_buf(), source })?,
    };
    Ok(PartialTranslation::new(path.to_path_buf(), data))
}
