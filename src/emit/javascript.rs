//! ES module exporting a flat object of translations.

use std::fmt::Write as _;

use super::{
    EmitError,
    EmitRequest,
    Emitter,
};

/// Format key of [`ObjectEmitter`].
pub const FORMAT: &str = "js-object";

/// First line of every generated module.
const HEADER: &str = "// DO NOT EDIT. generated by diplomat (https://github.com/tony84727/diplomat).";

/// Renders `export default { "key": "text", ... }` with keys in sorted order.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectEmitter;

impl Emitter for ObjectEmitter {
    fn emit(&self, request: &EmitRequest<'_>) -> Result<Vec<u8>, EmitError> {
        let mut out = String::new();
        let render = |e: std::fmt::Error| EmitError::Render {
            format: FORMAT.to_string(),
            message: e.to_string(),
        };

        writeln!(out, "{HEADER}").map_err(render)?;
        writeln!(out, "export default {{").map_err(render)?;
        for (key, text) in &request.translations.translations {
            let key = serde_json::to_string(key)?;
            let text = serde_json::to_string(text)?;
            writeln!(out, "    {key}: {text},").map_err(render)?;
        }
        writeln!(out, "}}").map_err(render)?;

        Ok(out.into_bytes())
    }
}
