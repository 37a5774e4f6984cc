//! Emitters render the final translations of one fragment and locale into bytes.
//!
//! Emitters are looked up by format key in an [`EmitterRegistry`] that the
//! caller constructs and hands to the build pipeline.

pub mod javascript;
pub mod json;
pub mod template;

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::input::outline::OutputDescriptor;
use crate::ir::LocaleTranslations;
pub use template::{
    FileNameTemplate,
    TemplateError,
};

/// Failure while rendering an artifact.
#[derive(Error, Debug)]
pub enum EmitError {
    /// The emitter could not produce its output.
    #[error("Failed to render '{format}' output: {message}")]
    Render {
        /// Format key of the emitter.
        format: String,
        /// What went wrong.
        message: String,
    },

    /// A key or text could not be serialized.
    #[error("Failed to serialize translations: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Everything an emitter receives for one artifact.
#[derive(Debug, Clone, Copy)]
pub struct EmitRequest<'a> {
    /// Name of the fragment being rendered.
    pub fragment_name: &'a str,
    /// Locale being rendered.
    pub locale: &'a str,
    /// Output entry of the outline that selected this emitter.
    pub descriptor: &'a OutputDescriptor,
    /// Final key -> text map.
    pub translations: &'a LocaleTranslations,
}

/// Renders translations into an output format.
pub trait Emitter: Send + Sync {
    /// Renders the artifact content.
    fn emit(&self, request: &EmitRequest<'_>) -> Result<Vec<u8>, EmitError>;

    /// File name of the artifact, relative to the format's output directory.
    fn file_name(&self, request: &EmitRequest<'_>) -> PathBuf {
        PathBuf::from(request.descriptor.file_name.render(request.fragment_name, request.locale))
    }
}

/// Format key -> emitter lookup.
#[derive(Clone, Default)]
pub struct EmitterRegistry {
    /// Emitters by format key.
    emitters: HashMap<String, Arc<dyn Emitter>>,
}

impl EmitterRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in emitter.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(javascript::FORMAT, javascript::ObjectEmitter);
        registry.register(json::FORMAT, json::JsonEmitter);
        registry
    }

    /// Registers `emitter` under `format`, replacing any previous one.
    pub fn register(&mut self, format: impl Into<String>, emitter: impl Emitter + 'static) {
        self.emitters.insert(format.into(), Arc::new(emitter));
    }

    /// Emitter registered under `format`.
    #[must_use]
    pub fn get(&self, format: &str) -> Option<Arc<dyn Emitter>> {
        self.emitters.get(format).cloned()
    }

    /// Whether `format` has an emitter.
    #[must_use]
    pub fn contains(&self, format: &str) -> bool {
        self.emitters.contains_key(format)
    }

    /// Registered format keys, sorted.
    #[must_use]
    pub fn formats(&self) -> Vec<&str> {
        let mut formats: Vec<_> = self.emitters.keys().map(String::as_str).collect();
        formats.sort_unstable();
        formats
    }
}

impl fmt::Debug for EmitterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmitterRegistry").field("formats", &self.formats()).finish()
    }
}
