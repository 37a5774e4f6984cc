//! Lists the outline and fragment files of a source directory.

use std::path::{
    Path,
    PathBuf,
};

use ignore::WalkBuilder;

use super::ReaderError;
use crate::config::{
    FileMatcher,
    SourceKind,
};

/// Source files found in one directory, each list sorted by path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sources {
    /// The file used as the outline, when one exists.
    pub outline: Option<PathBuf>,
    /// Every other matching file.
    pub fragments: Vec<PathBuf>,
}

/// Lists the direct children of the matcher's source directory.
///
/// Every matching file counts, including ignore-listed and hidden ones, and
/// symlinks are classified by their own name but must resolve to a file.
/// When several files match the outline name, the first by path is used.
///
/// # Errors
/// - The directory cannot be read
/// - An entry cannot be read
pub fn discover(matcher: &FileMatcher) -> Result<Sources, ReaderError> {
    let dir = matcher.source_dir();
    std::fs::metadata(dir)
        .map_err(|source| ReaderError::Discovery { dir: dir.to_path_buf(), source })?;

    let mut outlines = Vec::new();
    let mut fragments = Vec::new();
    for result in WalkBuilder::new(dir).max_depth(Some(1)).standard_filters(false).build() {
        let entry = result.map_err(|source| ReaderError::Walk { dir: dir.to_path_buf(), source })?;
        let Some(kind) = matcher.classify(entry.path()) else {
            continue;
        };
        // Follows symlinks; a dangling link is not a source.
        if !entry.path().is_file() {
            tracing::debug!(path = %entry.path().display(), "Skipping entry that is not a file");
            continue;
        }
        match kind {
            SourceKind::Outline => outlines.push(entry.into_path()),
            SourceKind::Fragment => fragments.push(entry.into_path()),
        }
    }

    outlines.sort();
    fragments.sort();
    let mut outlines = outlines.into_iter();
    let outline = outlines.next();
    for ignored in outlines {
        tracing::warn!(
            path = %ignored.display(),
            used = ?outline.as_deref().map(Path::display),
            "Ignoring additional outline file"
        );
    }

    tracing::debug!(
        dir = %dir.display(),
        fragments = fragments.len(),
        has_outline = outline.is_some(),
        "Discovered sources"
    );
    Ok(Sources { outline, fragments })
}
