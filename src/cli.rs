//! Command-line entry: batch builds and watch mode.

use std::future::Future;
use std::path::PathBuf;

use clap::Parser;
use thiserror::Error;

use crate::config::{
    BuildSettings,
    ConfigError,
    ConfigManager,
};
use crate::emit::EmitterRegistry;
use crate::pipeline::{
    BuildError,
    Pipeline,
    Session,
};
use crate::reader::{
    Reader,
    ReaderError,
};

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Arguments {
    /// Directory holding the outline and fragment files
    pub source_dir: PathBuf,

    /// Output directory (overrides `outputDir`)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Keep running and rebuild whenever a source file changes
    #[arg(short, long)]
    pub watch: bool,
}

/// Failure of one invocation; any of these exits non-zero.
#[derive(Error, Debug)]
pub enum CliError {
    /// Settings could not be loaded or are invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Sources could not be read, or the watcher failed.
    #[error(transparent)]
    Reader(#[from] ReaderError),

    /// The batch build failed.
    #[error(transparent)]
    Build(#[from] BuildError),

    /// The live build session panicked.
    #[error("Build session failed: {0}")]
    Session(#[from] tokio::task::JoinError),
}

/// Runs one invocation. In watch mode `shutdown` ends the run.
pub async fn run<F>(args: Arguments, shutdown: F) -> Result<(), CliError>
where
    F: Future<Output = ()>,
{
    let mut config = ConfigManager::new();
    config.load_settings(&args.source_dir)?;
    if let Some(output) = &args.output {
        // Relative to the working directory, not the source directory.
        let output_dir = std::path::absolute(output).map_err(ConfigError::from)?;
        config.update_settings(BuildSettings { output_dir, ..config.get_settings().clone() })?;
    }
    let output_dir = config.resolved_output_dir();
    let settings = config.get_settings();

    let pipeline =
        Pipeline::new(EmitterRegistry::with_defaults(), output_dir, &settings.key_separator);
    let (reader, streams) = Reader::new(&args.source_dir, settings)?;

    if !args.watch {
        drop(streams);
        let (outline, fragments) = reader.read().await?;
        pipeline.build(&outline, &fragments).await?;
        return Ok(());
    }

    let errors = reader.error_sink().clone();
    let session = tokio::spawn(Session::new(pipeline).run(streams));
    reader.watch(shutdown).await?;
    let report = session.await?;
    tracing::info!(
        builds = report.builds,
        failed_builds = report.failed_builds,
        source_errors = report.source_errors,
        dropped_errors = errors.dropped(),
        "Watch stopped"
    );
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::fs;

    use googletest::prelude::*;
    use rstest::rstest;
    use tempfile::TempDir;

    use super::*;

    const OUTLINE: &str = r#"
version: "1"
output:
  - selectors: [en]
    templates:
      - type: js-object
        options: { filename: "{fragment}.{locale}.js" }
"#;

    /// `Arguments`: positional source directory and flags
    #[rstest]
    #[case(&["diplomat", "i18n"], false, None)]
    #[case(&["diplomat", "i18n", "--watch"], true, None)]
    #[case(&["diplomat", "i18n", "-w", "-o", "dist"], true, Some("dist"))]
    fn test_parses_arguments(
        #[case] argv: &[&str],
        #[case] watch: bool,
        #[case] output: Option<&str>,
    ) {
        let args = Arguments::try_parse_from(argv).unwrap();

        assert_eq!(args.source_dir, PathBuf::from("i18n"));
        assert_eq!(args.watch, watch);
        assert_eq!(args.output, output.map(PathBuf::from));
    }

    /// `Arguments`: source directory is required
    #[rstest]
    fn test_source_dir_is_required() {
        assert_that!(Arguments::try_parse_from(["diplomat"]), err(anything()));
    }

    /// `run`: batch build writes into outputDir from the settings file
    #[tokio::test]
    async fn test_batch_run_writes_outputs_into_configured_dir() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("diplomat.yaml"), OUTLINE).unwrap();
        fs::write(dir.path().join("common.en.yaml"), "greeting: Hello\n").unwrap();
        fs::write(dir.path().join(".diplomat.json"), r#"{"outputDir": "out"}"#).unwrap();
        let args = Arguments { source_dir: dir.path().to_path_buf(), output: None, watch: false };

        run(args, std::future::pending()).await.unwrap();

        let content = fs::read_to_string(dir.path().join("out/js-object/common.en.js")).unwrap();
        assert!(content.contains(r#""greeting": "Hello","#));
    }

    /// `run`: a malformed fragment fails the batch build before writing
    #[tokio::test]
    async fn test_batch_run_fails_on_malformed_fragment() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("diplomat.yaml"), OUTLINE).unwrap();
        fs::write(dir.path().join("broken.yaml"), "a: [").unwrap();
        let args = Arguments { source_dir: dir.path().to_path_buf(), output: None, watch: false };

        let result = run(args, std::future::pending()).await;

        assert!(matches!(result, Err(CliError::Reader(_))));
        assert!(!dir.path().join("build").exists());
    }

    /// `run`: --output replaces outputDir
    #[tokio::test]
    async fn test_output_flag_overrides_settings_file() {
        let dir = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        fs::write(dir.path().join("diplomat.yaml"), OUTLINE).unwrap();
        fs::write(dir.path().join("common.en.yaml"), "greeting: Hello\n").unwrap();
        fs::write(dir.path().join(".diplomat.json"), r#"{"outputDir": "out"}"#).unwrap();
        let args = Arguments {
            source_dir: dir.path().to_path_buf(),
            output: Some(out.path().join("dist")),
            watch: false,
        };

        run(args, std::future::pending()).await.unwrap();

        assert!(out.path().join("dist/js-object/common.en.js").exists());
        assert!(!dir.path().join("out").exists());
    }
}
