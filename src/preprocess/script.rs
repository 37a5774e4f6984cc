//! Chinese script-variant conversion between sibling locale keys.

use crate::input::{
    OptionBag,
    OptionError,
};
use crate::ir::{
    NestedKeyValue,
    NkvError,
};

/// Direction of the conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionMode {
    /// `s2t`
    SimplifiedToTraditional,
    /// `t2s`
    TraditionalToSimplified,
}

impl ConversionMode {
    /// Case-insensitive mode name.
    fn parse(mode: &str) -> Option<Self> {
        match mode.to_ascii_lowercase().as_str() {
            "s2t" => Some(Self::SimplifiedToTraditional),
            "t2s" => Some(Self::TraditionalToSimplified),
            _ => None,
        }
    }

    /// Mode name as written in the outline.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SimplifiedToTraditional => "s2t",
            Self::TraditionalToSimplified => "t2s",
        }
    }

    /// Converts `text` to the target script.
    #[must_use]
    pub fn convert(self, text: &str) -> String {
        let target = match self {
            Self::SimplifiedToTraditional => zhconv::Variant::ZhHant,
            Self::TraditionalToSimplified => zhconv::Variant::ZhHans,
        };
        zhconv::zhconv(text, target)
    }
}

/// Derives `to` locale values from `from` locale values.
///
/// For every leaf path carrying a `from` segment, the sibling path with that
/// segment (its last occurrence) replaced by `to` receives the converted
/// text. Rerunning recomputes the same derived values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptConvertConfig {
    /// Conversion direction.
    pub mode: ConversionMode,
    /// Locale segment to read.
    pub from: String,
    /// Locale segment to write.
    pub to: String,
}

impl ScriptConvertConfig {
    /// Options the converter accepts.
    const OPTIONS: [&'static str; 3] = ["mode", "from", "to"];

    /// Validates the raw option bag.
    ///
    /// # Errors
    /// - An option is missing, unknown or invalid
    pub fn from_options(options: &OptionBag) -> Result<Self, OptionError> {
        options.ensure_known(&Self::OPTIONS)?;

        let raw_mode = options.get_str("mode")?;
        let mode = ConversionMode::parse(raw_mode).ok_or_else(|| OptionError::Invalid {
            key: "mode".to_string(),
            message: format!("expected \"s2t\" or \"t2s\", found \"{raw_mode}\""),
        })?;
        let from = non_empty(options, "from")?;
        let to = non_empty(options, "to")?;
        if from == to {
            return Err(OptionError::Invalid {
                key: "to".to_string(),
                message: format!("must differ from \"from\" (both are \"{from}\")"),
            });
        }

        Ok(Self { mode, from, to })
    }

    /// Options as they would be written in the outline.
    #[must_use]
    pub fn to_options(&self) -> OptionBag {
        let mut options = OptionBag::default();
        options.insert("mode", self.mode.as_str());
        options.insert("from", self.from.as_str());
        options.insert("to", self.to.as_str());
        options
    }

    /// Writes converted siblings into `nkv`.
    ///
    /// Missing sources are skipped. Fails only when a derived path collides
    /// structurally with existing data.
    ///
    /// # Errors
    /// - A derived path is occupied by a subtree or crosses a leaf
    pub fn apply(&self, nkv: &mut NestedKeyValue) -> Result<(), NkvError> {
        for path in nkv.keys() {
            let Some(position) = path.iter().rposition(|segment| *segment == self.from) else {
                continue;
            };
            let Some(source) = nkv.get(&path) else {
                continue;
            };
            let converted = self.mode.convert(source);

            let mut target = path;
            if let Some(segment) = target.get_mut(position) {
                segment.clone_from(&self.to);
            }
            nkv.set(&target, converted)?;
        }
        Ok(())
    }
}

/// Required, non-empty string option.
fn non_empty(options: &OptionBag, key: &str) -> Result<String, OptionError> {
    let value = options.get_str(key)?;
    if value.is_empty() {
        return Err(OptionError::Invalid {
            key: key.to_string(),
            message: "cannot be empty".to_string(),
        });
    }
    Ok(value.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    fn options(value: serde_json::Value) -> OptionBag {
        serde_json::from_value(value).unwrap()
    }

    fn s2t() -> ScriptConvertConfig {
        ScriptConvertConfig::from_options(&options(json!({
            "mode": "s2t", "from": "zh-CN", "to": "zh-TW"
        })))
        .unwrap()
    }

    /// `from_options`: valid options
    #[googletest::test]
    fn test_parses_valid_options() {
        let config = s2t();

        expect_that!(config.mode, eq(ConversionMode::SimplifiedToTraditional));
        expect_that!(config.from, eq("zh-CN"));
        expect_that!(config.to, eq("zh-TW"));
    }

    /// `from_options`: mode names ignore case
    #[googletest::test]
    fn test_mode_is_case_insensitive() {
        let config = ScriptConvertConfig::from_options(&options(json!({
            "mode": "T2S", "from": "zh-TW", "to": "zh-CN"
        })))
        .unwrap();

        expect_that!(config.mode, eq(ConversionMode::TraditionalToSimplified));
    }

    /// `from_options`: the error names the offending option
    #[rstest]
    #[case::missing_mode(json!({"from": "a", "to": "b"}), "mode")]
    #[case::missing_from(json!({"mode": "s2t", "to": "b"}), "from")]
    #[case::missing_to(json!({"mode": "s2t", "from": "a"}), "to")]
    #[case::wrong_type(json!({"mode": 1, "from": "a", "to": "b"}), "mode")]
    #[case::bad_mode(json!({"mode": "x2y", "from": "a", "to": "b"}), "mode")]
    #[case::empty_from(json!({"mode": "s2t", "from": "", "to": "b"}), "from")]
    #[case::same_locale(json!({"mode": "s2t", "from": "a", "to": "a"}), "to")]
    #[case::unknown_key(json!({"mode": "s2t", "from": "a", "to": "b", "extra": 1}), "extra")]
    fn test_rejects_malformed_options(#[case] raw: serde_json::Value, #[case] key: &str) {
        let error = ScriptConvertConfig::from_options(&options(raw)).unwrap_err();

        assert_eq!(error.key(), key);
    }

    /// `apply`: locale as the first segment
    #[googletest::test]
    fn test_converts_locale_first_layout() {
        let mut nkv = NestedKeyValue::from_value(&json!({
            "zh-CN": { "greeting": "你好", "title": "简体中文" }
        }))
        .unwrap();

        s2t().apply(&mut nkv).unwrap();

        expect_that!(nkv.get(&["zh-TW", "greeting"]), some(eq("你好")));
        expect_that!(nkv.get(&["zh-TW", "title"]), some(eq("簡體中文")));
        expect_that!(nkv.get(&["zh-CN", "title"]), some(eq("简体中文")));
    }

    /// `apply`: locale as the last segment
    #[googletest::test]
    fn test_converts_locale_last_layout() {
        let mut nkv = NestedKeyValue::from_value(&json!({
            "menu": { "title": { "zh-CN": "简体", "en": "Simplified" } }
        }))
        .unwrap();

        s2t().apply(&mut nkv).unwrap();

        expect_that!(nkv.get(&["menu", "title", "zh-TW"]), some(eq("簡體")));
        expect_that!(nkv.get(&["menu", "title", "en"]), some(eq("Simplified")));
        expect_that!(nkv.len(), eq(3));
    }

    /// `apply`: t2s direction
    #[googletest::test]
    fn test_traditional_to_simplified() {
        let config = ScriptConvertConfig::from_options(&options(json!({
            "mode": "t2s", "from": "zh-TW", "to": "zh-CN"
        })))
        .unwrap();
        let mut nkv = NestedKeyValue::from_value(&json!({ "a": { "zh-TW": "繁體中文" } })).unwrap();

        config.apply(&mut nkv).unwrap();

        expect_that!(nkv.get(&["a", "zh-CN"]), some(eq("繁体中文")));
    }

    /// `apply`: rerunning gives the same tree
    #[googletest::test]
    fn test_applying_twice_is_idempotent() {
        let mut nkv = NestedKeyValue::from_value(&json!({
            "zh-CN": { "title": "简体中文" },
            "nested": { "label": { "zh-CN": "简体" } },
            "other": { "en": "untouched" }
        }))
        .unwrap();
        let config = s2t();

        config.apply(&mut nkv).unwrap();
        let once = nkv.clone();
        config.apply(&mut nkv).unwrap();

        assert_eq!(nkv, once);
    }

    /// `apply`: nothing to convert
    #[googletest::test]
    fn test_no_source_keys_is_a_no_op() {
        let original = NestedKeyValue::from_value(&json!({ "a": { "en": "A" } })).unwrap();
        let mut nkv = original.clone();

        s2t().apply(&mut nkv).unwrap();

        assert_eq!(nkv, original);
    }

    /// `apply`: a derived path that collides is an error
    #[googletest::test]
    fn test_derived_path_conflict_is_reported() {
        let mut nkv = NestedKeyValue::from_value(&json!({
            "zh-CN": { "title": "简体" },
            "zh-TW": "flat"
        }))
        .unwrap();

        expect_that!(s2t().apply(&mut nkv), err(anything()));
    }

    /// `to_options`: parses back to the same config
    #[googletest::test]
    fn test_options_round_trip() {
        let config = s2t();

        let restored = ScriptConvertConfig::from_options(&config.to_options()).unwrap();

        assert_eq!(restored, config);
    }
}
