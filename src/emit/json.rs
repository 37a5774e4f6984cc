//! Plain JSON object of translations.

use super::{
    EmitError,
    EmitRequest,
    Emitter,
};

/// Format key of [`JsonEmitter`].
pub const FORMAT: &str = "json";

/// Renders the translations as a pretty-printed JSON object.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonEmitter;

impl Emitter for JsonEmitter {
    fn emit(&self, request: &EmitRequest<'_>) -> Result<Vec<u8>, EmitError> {
        let mut out = serde_json::to_vec_pretty(&request.translations.translations)?;
        out.push(b'\n');
        Ok(out)
    }
}
