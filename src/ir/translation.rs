//! Translation units handed between the reader and the build pipeline.

use std::collections::BTreeMap;
use std::path::{
    Path,
    PathBuf,
};

use super::nkv::NestedKeyValue;

/// One parsed fragment file.
///
/// Identified by its source path, which correlates reloads in watch mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialTranslation {
    /// Source file.
    path: PathBuf,
    /// File stem without the implied locale.
    fragment_name: String,
    /// Locale suffix of the file stem, if any.
    locale: Option<String>,
    /// Parsed content, as written in the file.
    data: NestedKeyValue,
}

impl PartialTranslation {
    /// Creates a partial translation, inferring the fragment name and an
    /// optional locale from the file name.
    ///
    /// # Examples
    /// - `admin.yaml` -> fragment `admin`, no locale
    /// - `admin.zh-TW.yaml` -> fragment `admin`, locale `zh-TW`
    #[must_use]
    pub fn new(path: PathBuf, data: NestedKeyValue) -> Self {
        let (fragment_name, locale) = split_file_stem(&path);
        Self { path, fragment_name, locale, data }
    }

    /// Source file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name shared by every file merged into the same output.
    #[must_use]
    pub fn fragment_name(&self) -> &str {
        &self.fragment_name
    }

    /// Locale implied by the file name, if any.
    #[must_use]
    pub fn locale(&self) -> Option<&str> {
        self.locale.as_deref()
    }

    /// Content as written in the file.
    #[must_use]
    pub const fn data(&self) -> &NestedKeyValue {
        &self.data
    }

    /// Data with the implied locale, if any, inserted as the leading segment.
    #[must_use]
    pub fn canonical_data(&self) -> NestedKeyValue {
        self.locale().map_or_else(|| self.data.clone(), |locale| self.data.nested_under(locale))
    }
}

/// Splits `name.locale.ext` into the name and the optional locale.
fn split_file_stem(path: &Path) -> (String, Option<String>) {
    let stem = path.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_default();
    match stem.split_once('.') {
        Some((name, locale)) if !name.is_empty() && !locale.is_empty() => {
            (name.to_string(), Some(locale.to_string()))
        }
        _ => (stem, None),
    }
}

/// Flat `key -> text` translations of a single locale, the final emitter input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocaleTranslations {
    /// Locale the translations belong to.
    pub locale: String,
    /// Joined key to translated text.
    pub translations: BTreeMap<String, String>,
}

impl LocaleTranslations {
    /// Derives the translations for `locale` from a merged tree.
    ///
    /// Every leaf path containing `locale` as a segment contributes one key:
    /// the remaining segments (the last occurrence of `locale` removed) joined
    /// by `separator`. Paths without the locale segment are skipped.
    #[must_use]
    pub fn extract(nkv: &NestedKeyValue, locale: &str, separator: &str) -> Self {
        let mut paths = nkv.keys();
        paths.sort();

        let mut translations = BTreeMap::new();
        for path in paths {
            let Some(position) = path.iter().rposition(|segment| segment == locale) else {
                continue;
            };
            let Some(value) = nkv.get(&path) else {
                continue;
            };
            let key = path
                .iter()
                .enumerate()
                .filter(|(index, _)| *index != position)
                .map(|(_, segment)| segment.as_str())
                .collect::<Vec<_>>()
                .join(separator);
            if key.is_empty() {
                tracing::debug!(locale, "Skipping value stored directly under the locale");
                continue;
            }
            if let Some(previous) = translations.insert(key.clone(), value.to_string()) {
                tracing::warn!(locale, %key, %previous, "Two paths flatten to the same key");
            }
        }

        Self { locale: locale.to_string(), translations }
    }

    /// Number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.translations.len()
    }

    /// Whether there are no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.translations.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    /// `new`: fragment name and locale from the file name
    #[rstest]
    #[case("/src/admin.yaml", "admin", None)]
    #[case("/src/admin.zh-TW.yaml", "admin", Some("zh-TW"))]
    #[case("/src/messages.en.json", "messages", Some("en"))]
    #[case("/src/.hidden.yaml", ".hidden", None)]
    fn test_infers_fragment_name_and_locale(
        #[case] path: &str,
        #[case] fragment: &str,
        #[case] locale: Option<&str>,
    ) {
        let partial = PartialTranslation::new(PathBuf::from(path), NestedKeyValue::new());

        assert_eq!(partial.fragment_name(), fragment);
        assert_eq!(partial.locale(), locale);
    }

    /// `canonical_data`: nested under the implied locale
    #[googletest::test]
    fn test_canonical_data_nests_under_implied_locale() {
        let data = NestedKeyValue::from_value(&json!({ "greeting": "你好" })).unwrap();
        let partial = PartialTranslation::new(PathBuf::from("admin.zh-CN.yaml"), data);

        let canonical = partial.canonical_data();

        expect_that!(canonical.get(&["zh-CN", "greeting"]), some(eq("你好")));
    }

    /// `extract`: key → locale layout
    #[googletest::test]
    fn test_extract_handles_locale_as_last_segment() {
        let nkv = NestedKeyValue::from_value(&json!({
            "user": { "admin": { "en": "Administrator", "zh-TW": "管理員" } },
            "title": { "en": "Title" }
        }))
        .unwrap();

        let en = LocaleTranslations::extract(&nkv, "en", ".");

        expect_that!(en.locale, eq("en"));
        expect_that!(en.translations.get("user.admin"), some(eq(&"Administrator".to_string())));
        expect_that!(en.translations.get("title"), some(eq(&"Title".to_string())));
        expect_that!(en.len(), eq(2));
    }

    /// `extract`: locale → key layout with a custom separator
    #[googletest::test]
    fn test_extract_handles_locale_as_first_segment() {
        let nkv = NestedKeyValue::from_value(&json!({
            "zh-CN": { "greeting": "你好", "menu": { "open": "打开" } },
            "en": { "greeting": "Hello" }
        }))
        .unwrap();

        let zh = LocaleTranslations::extract(&nkv, "zh-CN", "_");

        expect_that!(zh.translations.get("greeting"), some(eq(&"你好".to_string())));
        expect_that!(zh.translations.get("menu_open"), some(eq(&"打开".to_string())));
        expect_that!(zh.len(), eq(2));
    }

    /// `extract`: locale absent from the tree
    #[googletest::test]
    fn test_extract_unknown_locale_is_empty() {
        let nkv = NestedKeyValue::from_value(&json!({ "a": { "en": "A" } })).unwrap();

        expect_that!(LocaleTranslations::extract(&nkv, "fr", ".").is_empty(), eq(true));
    }
}
