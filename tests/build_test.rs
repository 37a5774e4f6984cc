//! End-to-end builds from a source directory to written artifacts.

#![allow(clippy::unwrap_used)]
#![allow(clippy::indexing_slicing)]

use std::fs;
use std::path::Path;

use diplomat::config::BuildSettings;
use diplomat::emit::{
    EmitError,
    EmitRequest,
    Emitter,
    EmitterRegistry,
};
use diplomat::pipeline::Pipeline;
use diplomat::preprocess::PreprocessorChain;
use diplomat::reader::Reader;
use googletest::prelude::*;
use tempfile::TempDir;

const OUTLINE: &str = r#"
version: "1"
preprocessors:
  - type: script-convert
    options:
      mode: s2t
      from: zh-CN
      to: zh-TW
output:
  - selectors: [zh-TW]
    templates:
      - type: js-object
        options: { filename: "{fragment}.{locale}.js" }
  - selectors: [zh-CN, zh-TW]
    templates:
      - type: json
        options: { filename: "{locale}/{fragment}.json" }
"#;

fn source_dir(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (name, content) in files {
        fs::write(dir.path().join(name), content).unwrap();
    }
    dir
}

fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[googletest::test]
#[tokio::test]
async fn test_simplified_fragment_gains_traditional_locale() {
    let dir = source_dir(&[
        ("diplomat.yaml", OUTLINE),
        ("common.json", r#"{"zh-CN": {"greeting": "你好", "language": "简体中文"}}"#),
    ]);
    let (reader, _streams) = Reader::new(dir.path(), &BuildSettings::default()).unwrap();
    let (outline, fragments) = reader.read().await.unwrap();

    let mut nkv = fragments[0].canonical_data();
    PreprocessorChain::compile(&outline.preprocessors).apply(&mut nkv).unwrap();

    expect_that!(nkv.get(&["zh-TW", "greeting"]), some(eq("你好")));
    expect_that!(nkv.get(&["zh-TW", "language"]), some(eq("簡體中文")));
    expect_that!(nkv.get(&["zh-CN", "language"]), some(eq("简体中文")));
}

#[googletest::test]
#[tokio::test]
async fn test_build_writes_every_declared_artifact() {
    let dir = source_dir(&[
        ("diplomat.yaml", OUTLINE),
        ("admin.zh-CN.yaml", "menu:\n  settings: 设置\n  users: 用户\n"),
        ("common.yaml", "title:\n  zh-CN: 标题\n"),
    ]);
    let output = TempDir::new().unwrap();
    let (reader, _streams) = Reader::new(dir.path(), &BuildSettings::default()).unwrap();
    let (outline, fragments) = reader.read().await.unwrap();

    let pipeline = Pipeline::new(EmitterRegistry::with_defaults(), output.path(), ".");
    let written = pipeline.build(&outline, &fragments).await.unwrap();

    expect_that!(written, len(eq(6)));
    let admin_js = fs::read_to_string(output.path().join("js-object/admin.zh-TW.js")).unwrap();
    expect_that!(admin_js, contains_substring("export default {"));
    expect_that!(admin_js, contains_substring(r#""menu.settings": "#));
    expect_that!(admin_js, contains_substring(r#""menu.users": "#));
    assert_eq!(
        read_json(&output.path().join("json/zh-CN/common.json")),
        serde_json::json!({ "title": "标题" })
    );
    assert_eq!(
        read_json(&output.path().join("json/zh-TW/common.json")),
        serde_json::json!({ "title": "標題" })
    );
}

#[derive(Debug)]
struct KeyList;

impl Emitter for KeyList {
    fn emit(&self, request: &EmitRequest<'_>) -> Result<Vec<u8>, EmitError> {
        let keys: Vec<_> = request.translations.translations.keys().cloned().collect();
        Ok(keys.join("\n").into_bytes())
    }
}

#[tokio::test]
async fn test_custom_emitter_and_separator() {
    let dir = source_dir(&[
        (
            "diplomat.yaml",
            r#"
version: "1"
output:
  - selectors: [en]
    templates:
      - type: keys
        options: { filename: "{fragment}.txt" }
"#,
        ),
        ("admin.en.yaml", "menu:\n  settings: Settings\n"),
    ]);
    let output = TempDir::new().unwrap();
    let (reader, _streams) = Reader::new(dir.path(), &BuildSettings::default()).unwrap();
    let (outline, fragments) = reader.read().await.unwrap();
    let mut registry = EmitterRegistry::new();
    registry.register("keys", KeyList);

    Pipeline::new(registry, output.path(), "_").build(&outline, &fragments).await.unwrap();

    let content = fs::read_to_string(output.path().join("keys/admin.txt")).unwrap();
    assert_eq!(content, "menu_settings");
}
