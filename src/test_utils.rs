//! Helpers shared by unit tests.
#![cfg(test)]
#![allow(clippy::unwrap_used)]

use std::path::PathBuf;

use tempfile::TempDir;

use crate::ir::{
    NestedKeyValue,
    PartialTranslation,
};

/// Creates a temporary source directory containing `files` as `(name, content)`.
pub(crate) fn source_dir(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (name, content) in files {
        std::fs::write(dir.path().join(name), content).unwrap();
    }
    dir
}

/// Builds a partial translation as if `path` had been loaded with `data`.
pub(crate) fn fragment(path: &str, data: &serde_json::Value) -> PartialTranslation {
    PartialTranslation::new(PathBuf::from(path), NestedKeyValue::from_value(data).unwrap())
}
