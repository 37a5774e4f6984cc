//! Bridges `notify` filesystem events into a tokio channel of source changes.

use std::path::PathBuf;
use std::sync::Arc;

use notify::{
    EventKind,
    RecommendedWatcher,
    RecursiveMode,
    Watcher,
};
use tokio::sync::mpsc;

use crate::config::{
    FileMatcher,
    SourceKind,
};

/// A changed outline or fragment path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceChange {
    /// Path as reported by the watcher.
    pub path: PathBuf,
    /// Role of the file.
    pub kind: SourceKind,
}

/// Stream of classified changes and watcher errors.
pub type ChangeReceiver = mpsc::UnboundedReceiver<notify::Result<SourceChange>>;

/// Starts watching the matcher's source directory.
///
/// Only paths the matcher classifies are forwarded; access events are
/// ignored. Watch errors travel on the same channel. Events stop once the
/// returned watcher is dropped.
///
/// # Errors
/// - The platform watcher cannot be created or cannot watch the directory
pub fn watch_directory(
    matcher: Arc<FileMatcher>,
) -> notify::Result<(RecommendedWatcher, ChangeReceiver)> {
    let (tx, rx) = mpsc::unbounded_channel();
    let filter = Arc::clone(&matcher);

    let mut watcher = notify::recommended_watcher(move |result: notify::Result<notify::Event>| {
        let event = match result {
            Ok(event) => event,
            Err(error) => {
                if tx.send(Err(error)).is_err() {
                    tracing::debug!("Change receiver closed");
                }
                return;
            }
        };
        if matches!(event.kind, EventKind::Access(_)) {
            return;
        }
        for path in event.paths {
            let Some(kind) = filter.classify(&path) else {
                continue;
            };
            tracing::trace!(path = %path.display(), ?kind, event = ?event.kind, "Source changed");
            if tx.send(Ok(SourceChange { path, kind })).is_err() {
                return;
            }
        }
    })?;
    watcher.watch(matcher.source_dir(), RecursiveMode::NonRecursive)?;

    tracing::debug!(dir = %matcher.source_dir().display(), "Filesystem watcher started");
    Ok((watcher, rx))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use tempfile::TempDir;

    use super::*;
    use crate::config::BuildSettings;

    /// `watch_directory`: only matching paths are forwarded
    #[tokio::test]
    async fn test_forwards_matching_changes_only() {
        let dir = TempDir::new().unwrap();
        let source_dir = std::fs::canonicalize(dir.path()).unwrap();
        let matcher =
            Arc::new(FileMatcher::new(source_dir.clone(), &BuildSettings::default()).unwrap());
        let (_watcher, mut rx) = watch_directory(matcher).unwrap();

        tokio::fs::write(source_dir.join("notes.txt"), "ignored").await.unwrap();
        tokio::fs::write(source_dir.join("admin.yaml"), "a: b").await.unwrap();

        let change = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(change.path, source_dir.join("admin.yaml"));
        assert_eq!(change.kind, SourceKind::Fragment);
    }
}
