//! Turns an outline and partial translations into written output artifacts.
//!
//! Fragments sharing a fragment name are merged in source-path order, run
//! through the outline's preprocessors, split per selected locale and handed
//! to the emitter registered for each output descriptor.

/// Artifact writing
mod output;
/// Continuous build loop
mod session;

use std::collections::BTreeMap;
use std::path::{
    Path,
    PathBuf,
};

use thiserror::Error;

pub use session::{
    Session,
    SessionReport,
};

use crate::emit::{
    EmitError,
    EmitRequest,
    EmitterRegistry,
};
use crate::input::Outline;
use crate::ir::{
    LocaleTranslations,
    NestedKeyValue,
    NkvError,
    PartialTranslation,
};
use crate::preprocess::{
    PreprocessError,
    PreprocessorChain,
};

/// Failure of a build; nothing after the failing step is written.
#[derive(Error, Debug)]
pub enum BuildError {
    /// An output descriptor names a format without an emitter.
    #[error("No emitter registered for format '{format}' (available: {available})")]
    UnknownFormat {
        /// Requested format key.
        format: String,
        /// Registered format keys, comma-separated.
        available: String,
    },

    /// A fragment conflicts with an earlier one of the same name.
    #[error("Cannot merge '{}' into fragment '{fragment}': {source}", path.display())]
    Merge {
        /// Fragment name of the group.
        fragment: String,
        /// File that could not be merged.
        path: PathBuf,
        /// The conflicting path.
        #[source]
        source: NkvError,
    },

    /// A preprocessor failed on a merged group.
    #[error("Preprocessing fragment '{fragment}' failed: {source}")]
    Preprocess {
        /// Fragment name of the group.
        fragment: String,
        /// Failing step.
        #[source]
        source: PreprocessError,
    },

    /// An emitter rejected its input.
    #[error("Rendering '{format}' for fragment '{fragment}' ({locale}) failed: {source}")]
    Emit {
        /// Format key.
        format: String,
        /// Fragment name.
        fragment: String,
        /// Locale being rendered.
        locale: String,
        /// Emitter error.
        #[source]
        source: EmitError,
    },

    /// Creating a directory or writing a file failed.
    #[error("Failed to write '{}': {source}", path.display())]
    Io {
        /// Path being created or written.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A file sits where an output directory is needed.
    #[error("Output path '{}' exists but is not a directory", path.display())]
    NotADirectory {
        /// The offending path.
        path: PathBuf,
    },
}

/// One rendered output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Format key of the emitter that produced it.
    pub format: String,
    /// Fragment group it was rendered from.
    pub fragment_name: String,
    /// Locale it holds.
    pub locale: String,
    /// Relative to the output directory: `<format>/<file name>`.
    pub path: PathBuf,
    /// Rendered bytes.
    pub content: Vec<u8>,
}

/// Renders and writes the outputs of one source directory.
#[derive(Debug, Clone)]
pub struct Pipeline {
    /// Emitters by format key.
    registry: EmitterRegistry,
    /// Root of every written artifact.
    output_dir: PathBuf,
    /// Joins key segments of extracted translations.
    key_separator: String,
}

impl Pipeline {
    /// Creates a pipeline writing below `output_dir`.
    #[must_use]
    pub fn new(
        registry: EmitterRegistry,
        output_dir: impl Into<PathBuf>,
        key_separator: impl Into<String>,
    ) -> Self {
        Self { registry, output_dir: output_dir.into(), key_separator: key_separator.into() }
    }

    /// Root of every written artifact.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Checks that every output descriptor names a registered format.
    pub fn check_formats(&self, outline: &Outline) -> Result<(), BuildError> {
        let unknown = outline
            .outputs
            .iter()
            .flat_map(|output| &output.targets)
            .find(|descriptor| !self.registry.contains(&descriptor.format));
        match unknown {
            Some(descriptor) => Err(BuildError::UnknownFormat {
                format: descriptor.format.clone(),
                available: self.registry.formats().join(", "),
            }),
            None => Ok(()),
        }
    }

    /// Groups fragments by name and merges each group in source-path order.
    pub fn assemble<'a, I>(fragments: I) -> Result<BTreeMap<String, NestedKeyValue>, BuildError>
    where
        I: IntoIterator<Item = &'a PartialTranslation>,
    {
        let mut ordered: Vec<_> = fragments.into_iter().collect();
        ordered.sort_by(|a, b| a.path().cmp(b.path()));

        let mut groups: BTreeMap<String, NestedKeyValue> = BTreeMap::new();
        for fragment in ordered {
            let merged = groups.entry(fragment.fragment_name().to_string()).or_default();
            let overridden =
                merged.merge(&fragment.canonical_data()).map_err(|source| BuildError::Merge {
                    fragment: fragment.fragment_name().to_string(),
                    path: fragment.path().to_path_buf(),
                    source,
                })?;
            for key in overridden {
                tracing::debug!(
                    path = %fragment.path().display(),
                    key = %key.join("."),
                    "Overriding earlier translation"
                );
            }
        }
        Ok(groups)
    }

    /// Renders every artifact the outline declares, without touching the disk.
    pub fn render<'a, I>(&self, outline: &Outline, fragments: I) -> Result<Vec<Artifact>, BuildError>
    where
        I: IntoIterator<Item = &'a PartialTranslation>,
    {
        self.check_formats(outline)?;
        let chain = PreprocessorChain::compile(&outline.preprocessors);
        let groups = Self::assemble(fragments)?;
        tracing::debug!(fragments = groups.len(), preprocessors = chain.len(), "Rendering");

        let mut artifacts = Vec::new();
        for (fragment_name, mut nkv) in groups {
            chain.apply(&mut nkv).map_err(|source| BuildError::Preprocess {
                fragment: fragment_name.clone(),
                source,
            })?;
            for output in &outline.outputs {
                for locale in &output.selectors {
                    let translations = LocaleTranslations::extract(&nkv, locale, &self.key_separator);
                    if translations.is_empty() {
                        tracing::debug!(fragment = %fragment_name, %locale, "No translations, skipping");
                        continue;
                    }
                    tracing::trace!(
                        fragment = %fragment_name,
                        %locale,
                        keys = translations.len(),
                        "Rendering locale"
                    );
                    for descriptor in &output.targets {
                        artifacts.push(self.render_one(&EmitRequest {
                            fragment_name: &fragment_name,
                            locale,
                            descriptor,
                            translations: &translations,
                        })?);
                    }
                }
            }
        }
        Ok(artifacts)
    }

    /// Renders one (fragment, locale, descriptor) combination.
    fn render_one(&self, request: &EmitRequest<'_>) -> Result<Artifact, BuildError> {
        let format = &request.descriptor.format;
        let emitter = self.registry.get(format).ok_or_else(|| BuildError::UnknownFormat {
            format: format.clone(),
            available: self.registry.formats().join(", "),
        })?;
        let content = emitter.emit(request).map_err(|source| BuildError::Emit {
            format: format.clone(),
            fragment: request.fragment_name.to_string(),
            locale: request.locale.to_string(),
            source,
        })?;
        Ok(Artifact {
            format: format.clone(),
            fragment_name: request.fragment_name.to_string(),
            locale: request.locale.to_string(),
            path: Path::new(format).join(emitter.file_name(request)),
            content,
        })
    }

    /// Renders and writes every artifact, returning the written paths.
    pub async fn build<'a, I>(
        &self,
        outline: &Outline,
        fragments: I,
    ) -> Result<Vec<PathBuf>, BuildError>
    where
        I: IntoIterator<Item = &'a PartialTranslation>,
    {
        let artifacts = self.render(outline, fragments)?;
        let mut written = Vec::with_capacity(artifacts.len());
        for artifact in &artifacts {
            written.push(output::write_artifact(&self.output_dir, artifact).await?);
        }
        tracing::info!(
            files = written.len(),
            output_dir = %self.output_dir.display(),
            "Build finished"
        );
        Ok(written)
    }
}
