//! Writes rendered artifacts below the output directory.

use std::io::ErrorKind;
use std::path::{
    Path,
    PathBuf,
};

use super::{
    Artifact,
    BuildError,
};

/// Writes `artifact` to `<output_dir>/<format>/<file name>`, creating
/// directories on demand.
pub(super) async fn write_artifact(
    output_dir: &Path,
    artifact: &Artifact,
) -> Result<PathBuf, BuildError> {
    ensure_dir(&output_dir.join(&artifact.format)).await?;

    let target = output_dir.join(&artifact.path);
    if let Some(parent) = target.parent() {
        ensure_dir(parent).await?;
    }

    tokio::fs::write(&target, &artifact.content)
        .await
        .map_err(|source| BuildError::Io { path: target.clone(), source })?;
    tracing::debug!(path = %target.display(), bytes = artifact.content.len(), "Wrote artifact");
    Ok(target)
}

/// Creates `dir` unless it exists; a non-directory in its place is an error.
async fn ensure_dir(dir: &Path) -> Result<(), BuildError> {
    match tokio::fs::metadata(dir).await {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => Err(BuildError::NotADirectory { path: dir.to_path_buf() }),
        Err(error) if error.kind() == ErrorKind::NotFound => tokio::fs::create_dir_all(dir)
            .await
            .map_err(|source| BuildError::Io { path: dir.to_path_buf(), source }),
        Err(source) => Err(BuildError::Io { path: dir.to_path_buf(), source }),
    }
}
