//! Outline document: preprocessor and output declarations.
//!
//! The `Raw*` types mirror the file as written. [`Outline::from_raw`] validates
//! every option bag once and produces the typed [`Outline`]; nothing past this
//! module sees an [`OptionBag`].

use std::collections::{
    BTreeMap,
    BTreeSet,
};
use std::path::Path;

use serde::{
    Deserialize,
    Deserializer,
    Serialize,
};
use serde_json::Value;
use thiserror::Error;

use super::{
    SourceError,
    document,
};
use crate::emit::FileNameTemplate;
use crate::preprocess::PreprocessorConfig;
use crate::preprocess::script::ScriptConvertConfig;

/// Preprocessor type key of the script converter.
pub const SCRIPT_CONVERT: &str = "script-convert";
/// Legacy alias of [`SCRIPT_CONVERT`].
pub const CHINESE: &str = "chinese";

/// Errors reading a single option out of an [`OptionBag`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OptionError {
    /// A required option is absent.
    #[error("missing required option '{key}'")]
    Missing {
        /// Option name.
        key: String,
    },

    /// The option has the wrong JSON type.
    #[error("option '{key}' must be {expected}")]
    WrongType {
        /// Option name.
        key: String,
        /// Expected type, e.g. "a string".
        expected: &'static str,
    },

    /// The option is not recognized.
    #[error("unknown option '{key}'")]
    Unknown {
        /// Option name.
        key: String,
    },

    /// The option has the right type but an unusable value.
    #[error("invalid option '{key}': {message}")]
    Invalid {
        /// Option name.
        key: String,
        /// What is wrong with the value.
        message: String,
    },
}

impl OptionError {
    /// Name of the offending option.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Missing { key }
            | Self::WrongType { key, .. }
            | Self::Unknown { key }
            | Self::Invalid { key, .. } => key,
        }
    }
}

/// Untyped `name -> value` configuration as written in the outline.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct OptionBag(BTreeMap<String, Value>);

impl OptionBag {
    /// Returns the string option `key`.
    ///
    /// # Errors
    /// - The option is missing or not a string
    pub fn get_str(&self, key: &str) -> Result<&str, OptionError> {
        match self.0.get(key) {
            None => Err(OptionError::Missing { key: key.to_string() }),
            Some(Value::String(value)) => Ok(value),
            Some(_) => Err(OptionError::WrongType { key: key.to_string(), expected: "a string" }),
        }
    }

    /// Fails on the first option not listed in `allowed`.
    ///
    /// # Errors
    /// - An option outside `allowed` is present
    pub fn ensure_known(&self, allowed: &[&str]) -> Result<(), OptionError> {
        match self.0.keys().find(|key| !allowed.contains(&key.as_str())) {
            Some(key) => Err(OptionError::Unknown { key: key.clone() }),
            None => Ok(()),
        }
    }

    /// Sets option `key`.
    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_string(), value.into());
    }
}

/// Structural problems in an otherwise well-formed outline document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OutlineError {
    /// Blank `version`.
    #[error("'version' cannot be empty")]
    EmptyVersion,

    /// A preprocessor type nobody implements.
    #[error("preprocessors[{index}]: unknown preprocessor type '{kind}'")]
    UnknownPreprocessor {
        /// Position in `preprocessors`.
        index: usize,
        /// Declared type.
        kind: String,
    },

    /// A preprocessor's options are invalid.
    #[error("preprocessors[{index}] ({kind}): {source}")]
    PreprocessorOptions {
        /// Position in `preprocessors`.
        index: usize,
        /// Declared type.
        kind: String,
        /// The offending option.
        #[source]
        source: OptionError,
    },

    /// An output with no locale selector.
    #[error("output[{output}]: at least one selector is required")]
    EmptySelectors {
        /// Position in `output`.
        output: usize,
    },

    /// A target without a format key.
    #[error("output[{output}].templates[{index}]: 'type' cannot be empty")]
    EmptyFormat {
        /// Position in `output`.
        output: usize,
        /// Position in `templates`.
        index: usize,
    },

    /// A target's options are invalid.
    #[error("output[{output}].templates[{index}] ({kind}): {source}")]
    TargetOptions {
        /// Position in `output`.
        output: usize,
        /// Position in `templates`.
        index: usize,
        /// Declared format.
        kind: String,
        /// The offending option.
        #[source]
        source: OptionError,
    },
}

/// Outline document as written.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RawOutline {
    /// Free-form version tag.
    #[serde(deserialize_with = "version_text")]
    pub version: String,
    /// Preprocessors in declaration order.
    #[serde(default)]
    pub preprocessors: Vec<RawPreprocessor>,
    /// Output declarations.
    #[serde(default, alias = "outputs")]
    pub output: Vec<RawOutput>,
}

/// Accepts a string or a number; `version: 1` is as common as `version: "1"`.
fn version_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(text) => Ok(text),
        Value::Number(number) => Ok(number.to_string()),
        other => Err(serde::de::Error::custom(format!("expected a version string, found {other}"))),
    }
}

/// Preprocessor entry as written.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RawPreprocessor {
    /// Preprocessor type key.
    #[serde(rename = "type")]
    pub kind: String,
    /// Type-specific options.
    #[serde(default)]
    pub options: OptionBag,
}

/// Output entry as written.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RawOutput {
    /// Locales to render.
    pub selectors: Vec<String>,
    /// Artifacts to render for each locale.
    #[serde(alias = "targets")]
    pub templates: Vec<RawTarget>,
}

/// Target entry as written.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RawTarget {
    /// Emitter format key.
    #[serde(rename = "type")]
    pub kind: String,
    /// Target options; only `filename` is known.
    #[serde(default)]
    pub options: OptionBag,
}

/// Validated build configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outline {
    /// Free-form version tag.
    pub version: String,
    /// Preprocessors in the order they run.
    pub preprocessors: Vec<PreprocessorConfig>,
    /// Output declarations.
    pub outputs: Vec<OutputConfig>,
}

/// Locales to render and the artifacts to render each of them into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputConfig {
    /// Locales to render.
    pub selectors: BTreeSet<String>,
    /// Artifacts per locale.
    pub targets: Vec<OutputDescriptor>,
}

/// A single artifact kind: emitter format key plus file naming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDescriptor {
    /// Emitter format key.
    pub format: String,
    /// Artifact path below the format's output directory.
    pub file_name: FileNameTemplate,
}

impl OutputDescriptor {
    /// Options a target accepts.
    const OPTIONS: [&'static str; 1] = ["filename"];

    /// Builds a descriptor from a target's options.
    fn from_options(format: &str, options: &OptionBag) -> Result<Self, OptionError> {
        options.ensure_known(&Self::OPTIONS)?;
        let raw = options.get_str("filename")?;
        let file_name = FileNameTemplate::parse(raw).map_err(|e| OptionError::Invalid {
            key: "filename".to_string(),
            message: e.to_string(),
        })?;
        Ok(Self { format: format.to_string(), file_name })
    }

    /// Inverse of [`Self::from_options`].
    fn to_options(&self) -> OptionBag {
        let mut options = OptionBag::default();
        options.insert("filename", self.file_name.as_str());
        options
    }
}

impl Outline {
    /// Validates a raw outline.
    ///
    /// # Errors
    /// - Any declaration is invalid; the first one found is reported
    pub fn from_raw(raw: RawOutline) -> Result<Self, OutlineError> {
        if raw.version.trim().is_empty() {
            return Err(OutlineError::EmptyVersion);
        }

        let preprocessors = raw
            .preprocessors
            .iter()
            .enumerate()
            .map(|(index, preprocessor)| {
                let config = match preprocessor.kind.as_str() {
                    SCRIPT_CONVERT | CHINESE => {
                        ScriptConvertConfig::from_options(&preprocessor.options)
                            .map(PreprocessorConfig::ScriptConvert)
                    }
                    kind => {
                        return Err(OutlineError::UnknownPreprocessor {
                            index,
                            kind: kind.to_string(),
                        });
                    }
                };
                config.map_err(|source| OutlineError::PreprocessorOptions {
                    index,
                    kind: preprocessor.kind.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let outputs = raw
            .output
            .iter()
            .enumerate()
            .map(|(output, declaration)| Self::output_from_raw(output, declaration))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { version: raw.version, preprocessors, outputs })
    }

    /// Validates output declaration number `output`.
    fn output_from_raw(output: usize, raw: &RawOutput) -> Result<OutputConfig, OutlineError> {
        let selectors: BTreeSet<String> = raw
            .selectors
            .iter()
            .map(|selector| selector.trim())
            .filter(|selector| !selector.is_empty())
            .map(str::to_string)
            .collect();
        if selectors.is_empty() {
            return Err(OutlineError::EmptySelectors { output });
        }

        let targets = raw
            .templates
            .iter()
            .enumerate()
            .map(|(index, target)| {
                if target.kind.trim().is_empty() {
                    return Err(OutlineError::EmptyFormat { output, index });
                }
                OutputDescriptor::from_options(&target.kind, &target.options).map_err(|source| {
                    OutlineError::TargetOptions { output, index, kind: target.kind.clone(), source }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(OutputConfig { selectors, targets })
    }

    /// Converts back into the document shape.
    #[must_use]
    pub fn to_raw(&self) -> RawOutline {
        RawOutline {
            version: self.version.clone(),
            preprocessors: self
                .preprocessors
                .iter()
                .map(|config| RawPreprocessor {
                    kind: config.kind().to_string(),
                    options: config.to_options(),
                })
                .collect(),
            output: self
                .outputs
                .iter()
                .map(|output| RawOutput {
                    selectors: output.selectors.iter().cloned().collect(),
                    templates: output
                        .targets
                        .iter()
                        .map(|target| RawTarget {
                            kind: target.format.clone(),
                            options: target.to_options(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    /// Parses outline text read from `path`; the extension picks the format.
    ///
    /// # Errors
    /// - The text does not decode or the outline is invalid
    pub fn parse(path: &Path, content: &str) -> Result<Self, SourceError> {
        let raw: RawOutline = document::parse(path, content)?;
        Self::from_raw(raw)
            .map_err(|source| SourceError::Outline { path: path.to_path_buf(), source })
    }

    /// Serializes the outline as YAML.
    ///
    /// # Errors
    /// - YAML serialization fails
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(&self.to_raw())
    }
}

/// Reads and validates the outline file at `path`.
///
/// # Errors
/// - The file cannot be read, decoded or validated
pub async fn load_outline(path: &Path) -> Result<Outline, SourceError> {
    tracing::debug!(path = %path.display(), "Loading outline");
    let raw: RawOutline = document::read(path).await?;
    Outline::from_raw(raw).map_err(|source| SourceError::Outline { path: path.to_path_buf(), source })
}
