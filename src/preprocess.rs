//! Ordered transforms applied to merged translation trees before emitting.

pub mod script;

use std::fmt;

use thiserror::Error;

use crate::input::OptionBag;
use crate::input::outline::SCRIPT_CONVERT;
use crate::ir::{
    NestedKeyValue,
    NkvError,
};
use script::ScriptConvertConfig;

/// A preprocessor declaration with its validated configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreprocessorConfig {
    /// `script-convert` (alias `chinese`).
    ScriptConvert(ScriptConvertConfig),
}

impl PreprocessorConfig {
    /// Type key written in the outline.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ScriptConvert(_) => SCRIPT_CONVERT,
        }
    }

    /// Options as they would be written in the outline.
    #[must_use]
    pub fn to_options(&self) -> OptionBag {
        match self {
            Self::ScriptConvert(config) => config.to_options(),
        }
    }

    /// Turns the declaration into a runnable transform.
    fn compile(&self) -> Transform {
        match self {
            Self::ScriptConvert(config) => {
                let config = config.clone();
                Box::new(move |nkv| config.apply(nkv))
            }
        }
    }
}

/// A preprocessor step failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Preprocessor #{index} ({kind}) failed: {source}")]
pub struct PreprocessError {
    /// Position of the step in the chain.
    pub index: usize,
    /// Type key of the step.
    pub kind: &'static str,
    /// What went wrong.
    #[source]
    pub source: NkvError,
}

/// In-place rewrite of a merged tree.
type Transform = Box<dyn Fn(&mut NestedKeyValue) -> Result<(), NkvError> + Send + Sync>;

/// One compiled preprocessor.
struct Step {
    /// Type key, for error reports.
    kind: &'static str,
    /// The rewrite itself.
    transform: Transform,
}

/// Preprocessors compiled once from an outline and applied in declaration order.
#[derive(Default)]
pub struct PreprocessorChain {
    /// Steps in declaration order.
    steps: Vec<Step>,
}

impl PreprocessorChain {
    /// Compiles `configs` into a chain.
    #[must_use]
    pub fn compile(configs: &[PreprocessorConfig]) -> Self {
        let steps = configs
            .iter()
            .map(|config| Step { kind: config.kind(), transform: config.compile() })
            .collect();
        Self { steps }
    }

    /// Runs every step on `nkv` in place, stopping at the first failure.
    ///
    /// # Errors
    /// - A step fails; the error names it
    pub fn apply(&self, nkv: &mut NestedKeyValue) -> Result<(), PreprocessError> {
        for (index, step) in self.steps.iter().enumerate() {
            (step.transform)(nkv).map_err(|source| PreprocessError {
                index,
                kind: step.kind,
                source,
            })?;
        }
        Ok(())
    }

    /// Number of steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the chain has no steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl fmt::Debug for PreprocessorChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreprocessorChain")
            .field("steps", &self.steps.iter().map(|step| step.kind).collect::<Vec<_>>())
            .finish()
    }
}
