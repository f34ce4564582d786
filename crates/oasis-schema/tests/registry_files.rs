//! Loading definitions from schema directories.

use std::fs;

use oasis_schema::{schema_ref, CompiledSchema, SchemaError, SchemaRegistry};
use serde_json::json;
use tempfile::TempDir;

fn write(dir: &TempDir, name: &str, contents: &str) {
    fs::write(dir.path().join(name), contents).unwrap();
}

#[test]
fn test_load_dir_reads_json_files_only() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "search.json",
        r#"{"definitions": {"Result": {"type": "object", "required": ["title"]}}}"#,
    );
    write(
        &dir,
        "common.json",
        r#"{"definitions": {"Error": {"type": "object"}}}"#,
    );
    write(&dir, "README.md", "not a schema");

    let registry = SchemaRegistry::load_dir(dir.path()).unwrap();

    assert_eq!(registry.len(), 2);
    assert!(registry.contains("Result"));
    assert!(registry.contains("Error"));
    assert_eq!(registry.sources().len(), 2);
    // sorted by file name
    assert!(registry.sources()[0].ends_with("common.json"));
}

#[test]
fn test_load_dir_rejects_file_without_definitions() {
    let dir = TempDir::new().unwrap();
    write(&dir, "broken.json", r#"{"Result": {"type": "object"}}"#);

    let err = SchemaRegistry::load_dir(dir.path()).unwrap_err();
    assert!(matches!(err, SchemaError::MissingDefinitions { .. }));
    assert!(err.to_string().contains("broken.json"));
}

#[test]
fn test_load_dir_reports_parse_errors() {
    let dir = TempDir::new().unwrap();
    write(&dir, "bad.json", "{ not json");

    let err = SchemaRegistry::load_dir(dir.path()).unwrap_err();
    assert!(matches!(err, SchemaError::Parse { .. }));
}

#[test]
fn test_load_dir_missing_directory() {
    let dir = TempDir::new().unwrap();
    let err = SchemaRegistry::load_dir(dir.path().join("nope")).unwrap_err();
    assert!(matches!(err, SchemaError::Io { .. }));
}

#[test]
fn test_add_file_with_prefix_compiles() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "v2.json",
        r##"{"definitions": {
            "Item": {"type": "string"},
            "Items": {"type": "array", "items": {"$ref": "#/definitions/Item"}}
        }}"##,
    );

    let mut registry = SchemaRegistry::new();
    let added = registry.add_file(dir.path().join("v2.json"), "V2").unwrap();
    assert_eq!(added, 2);

    let compiled = CompiledSchema::compile(&schema_ref("V2Items"), &registry).unwrap();
    assert!(compiled.is_valid(&json!(["a", "b"])));
    assert!(!compiled.is_valid(&json!([1])));
}
