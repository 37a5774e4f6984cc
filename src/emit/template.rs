//! Output file name templates such as `{fragment}.{locale}.js`.

use std::path::{
    Component,
    Path,
};

use thiserror::Error;

/// Why a file name template was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// Blank template.
    #[error("template cannot be empty")]
    Empty,

    /// A placeholder other than `fragment` or `locale`.
    #[error("unknown placeholder '{{{0}}}' (expected {{fragment}} or {{locale}})")]
    UnknownPlaceholder(String),

    /// A brace without its partner.
    #[error("unbalanced braces in '{0}'")]
    Unbalanced(String),

    /// Absolute path or a `..` component.
    #[error("'{0}' must be a relative path without '..'")]
    EscapesOutputDir(String),
}

/// One piece of a parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    /// Text copied as is.
    Literal(String),
    /// `{fragment}`
    Fragment,
    /// `{locale}`
    Locale,
}

/// A validated file name template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNameTemplate {
    /// Template as written.
    raw: String,
    /// Parsed pieces in order.
    parts: Vec<Part>,
}

impl FileNameTemplate {
    /// Parses and validates `raw`.
    ///
    /// # Errors
    /// - Blank template, unknown placeholder or unbalanced braces
    /// - The rendered path could leave the output directory
    pub fn parse(raw: &str) -> Result<Self, TemplateError> {
        if raw.trim().is_empty() {
            return Err(TemplateError::Empty);
        }
        let escapes = Path::new(raw)
            .components()
            .any(|component| !matches!(component, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(TemplateError::EscapesOutputDir(raw.to_string()));
        }

        let mut parts = Vec::new();
        let mut rest = raw;
        while let Some(open) = rest.find(['{', '}']) {
            let (literal, tail) = rest.split_at(open);
            if !literal.is_empty() {
                parts.push(Part::Literal(literal.to_string()));
            }
            if tail.starts_with('}') {
                return Err(TemplateError::Unbalanced(raw.to_string()));
            }
            let Some(close) = tail.find('}') else {
                return Err(TemplateError::Unbalanced(raw.to_string()));
            };
            let name = tail.get(1..close).unwrap_or_default();
            parts.push(match name {
                "fragment" => Part::Fragment,
                "locale" => Part::Locale,
                _ if name.contains('{') => return Err(TemplateError::Unbalanced(raw.to_string())),
                _ => return Err(TemplateError::UnknownPlaceholder(name.to_string())),
            });
            rest = tail.get(close + 1..).unwrap_or_default();
        }
        if !rest.is_empty() {
            parts.push(Part::Literal(rest.to_string()));
        }

        Ok(Self { raw: raw.to_string(), parts })
    }

    /// Substitutes the fragment name and locale.
    #[must_use]
    pub fn render(&self, fragment_name: &str, locale: &str) -> String {
        self.parts
            .iter()
            .map(|part| match part {
                Part::Literal(text) => text.as_str(),
                Part::Fragment => fragment_name,
                Part::Locale => locale,
            })
            .collect()
    }

    /// Template as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rstest::rstest;

    use super::*;

    /// `render`: placeholders are substituted
    #[rstest]
    #[case("{fragment}.{locale}.js", "admin.zh-TW.js")]
    #[case("{locale}/{fragment}.json", "zh-TW/admin.json")]
    #[case("static.js", "static.js")]
    #[case("{locale}{locale}", "zh-TWzh-TW")]
    fn test_renders_placeholders(#[case] raw: &str, #[case] expected: &str) {
        let template = FileNameTemplate::parse(raw).unwrap();

        assert_eq!(template.render("admin", "zh-TW"), expected);
        assert_eq!(template.as_str(), raw);
    }

    /// `parse`: malformed templates are rejected
    #[rstest]
    #[case("", TemplateError::Empty)]
    #[case("{name}.js", TemplateError::UnknownPlaceholder("name".to_string()))]
    #[case("{fragment.js", TemplateError::Unbalanced("{fragment.js".to_string()))]
    #[case("fragment}.js", TemplateError::Unbalanced("fragment}.js".to_string()))]
    #[case("{{locale}}", TemplateError::Unbalanced("{{locale}}".to_string()))]
    #[case("../{locale}.js", TemplateError::EscapesOutputDir("../{locale}.js".to_string()))]
    #[case("/abs/{locale}.js", TemplateError::EscapesOutputDir("/abs/{locale}.js".to_string()))]
    fn test_rejects_invalid_templates(#[case] raw: &str, #[case] expected: TemplateError) {
        assert_eq!(FileNameTemplate::parse(raw), Err(expected));
    }
}
