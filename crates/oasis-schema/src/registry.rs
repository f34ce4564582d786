//! Named schema definitions shared by every endpoint of a service.
//!
//! Definitions come from JSON files with a top-level `definitions` object.
//! Parameter, body and response schemas reference them with
//! `{"$ref": "#/definitions/<name>"}` (see [`schema_ref`](crate::schema_ref)).
//! When a schema is compiled, the definitions it reaches are embedded under
//! its own `definitions` key so every reference resolves locally.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::error::{SchemaError, SchemaResult};

/// Prefix of every reference the registry can resolve.
pub const DEFINITIONS_PREFIX: &str = "#/definitions/";

/// A set of named schema definitions.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    definitions: Map<String, Value>,
    sources: Vec<PathBuf>,
}

impl SchemaRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads every `*.json` file of a directory, in file name order.
    pub fn load_dir(dir: impl AsRef<Path>) -> SchemaResult<Self> {
        let mut registry = Self::new();
        registry.add_dir(dir)?;
        Ok(registry)
    }

    /// Adds every `*.json` file of a directory, in file name order, without a prefix.
    pub fn add_dir(&mut self, dir: impl AsRef<Path>) -> SchemaResult<usize> {
        let dir = dir.as_ref();
        let entries = fs::read_dir(dir).map_err(|source| SchemaError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| SchemaError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }
        files.sort();

        let mut added = 0;
        for file in &files {
            added += self.add_file(file, "")?;
        }

        info!(
            dir = %dir.display(),
            files = files.len(),
            definitions = added,
            "schema definitions loaded"
        );
        Ok(added)
    }

    /// Adds the definitions of one file, registering each as `<prefix><name>`.
    ///
    /// Returns the number of definitions added.
    pub fn add_file(&mut self, path: impl AsRef<Path>, prefix: &str) -> SchemaResult<usize> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| SchemaError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let document: Value =
            serde_json::from_str(&contents).map_err(|source| SchemaError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        let origin = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        let added = self.add_document(&origin, document, prefix)?;
        self.sources.push(path.to_path_buf());
        Ok(added)
    }

    /// Adds the definitions of an already parsed document.
    ///
    /// Local references inside the document are rewritten to the prefixed
    /// names so they keep pointing at the same definitions.
    pub fn add_document(&mut self, origin: &str, document: Value, prefix: &str) -> SchemaResult<usize> {
        let mut document = match document {
            Value::Object(map) => map,
            _ => {
                return Err(SchemaError::MissingDefinitions {
                    origin: origin.to_string(),
                })
            }
        };
        let definitions = match document.remove("definitions") {
            Some(Value::Object(defs)) => defs,
            Some(_) => {
                return Err(SchemaError::DefinitionsNotObject {
                    origin: origin.to_string(),
                })
            }
            None => {
                return Err(SchemaError::MissingDefinitions {
                    origin: origin.to_string(),
                })
            }
        };

        if let Some(name) = definitions
            .keys()
            .map(|name| format!("{prefix}{name}"))
            .find(|name| self.definitions.contains_key(name))
        {
            return Err(SchemaError::DuplicateDefinition { name });
        }

        let count = definitions.len();
        for (name, mut schema) in definitions {
            if !prefix.is_empty() {
                prefix_refs(&mut schema, prefix);
            }
            self.definitions.insert(format!("{prefix}{name}"), schema);
        }

        debug!(origin, prefix, definitions = count, "schema document added");
        Ok(count)
    }

    /// Adds a single named definition.
    pub fn define(&mut self, name: impl Into<String>, schema: Value) -> SchemaResult<()> {
        let name = name.into();
        if self.definitions.contains_key(&name) {
            return Err(SchemaError::DuplicateDefinition { name });
        }
        self.definitions.insert(name, schema);
        Ok(())
    }

    /// Returns a definition by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.definitions.get(name)
    }

    /// Returns `true` if a definition exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    /// Iterates over definition names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(String::as_str)
    }

    /// Returns the number of definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Returns `true` if the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Returns the files loaded so far.
    #[must_use]
    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    /// Collects the definitions `schema` reaches, directly or through other
    /// definitions.
    ///
    /// Fails on the first reference that is not a local definition
    /// reference or that names an unknown definition.
    pub fn reachable(&self, schema: &Value) -> SchemaResult<Map<String, Value>> {
        let mut reached = Map::new();
        let mut pending = Vec::new();
        collect_refs(schema, &mut pending);

        while let Some(reference) = pending.pop() {
            let name = definition_name(&reference)
                .ok_or_else(|| SchemaError::UnresolvableReference {
                    reference: reference.clone(),
                })?;
            if reached.contains_key(&name) {
                continue;
            }
            let definition = self
                .definitions
                .get(&name)
                .ok_or(SchemaError::UnresolvableReference { reference })?;
            collect_refs(definition, &mut pending);
            reached.insert(name, definition.clone());
        }

        Ok(reached)
    }
}

/// Extracts the definition name from `#/definitions/<name>[/...]`.
pub(crate) fn definition_name(reference: &str) -> Option<String> {
    let rest = reference.strip_prefix(DEFINITIONS_PREFIX)?;
    let name = rest.split('/').next().filter(|n| !n.is_empty())?;
    Some(name.replace("~1", "/").replace("~0", "~"))
}

fn collect_refs(schema: &Value, out: &mut Vec<String>) {
    match schema {
        Value::Object(map) => {
            for (key, value) in map {
                match (key.as_str(), value) {
                    ("$ref", Value::String(reference)) => out.push(reference.clone()),
                    _ => collect_refs(value, out),
                }
            }
        }
        Value::Array(items) => items.iter().for_each(|item| collect_refs(item, out)),
        _ => {}
    }
}

fn prefix_refs(schema: &mut Value, prefix: &str) {
    match schema {
        Value::Object(map) => {
            for (key, value) in map.iter_mut() {
                match (key.as_str(), value) {
                    ("$ref", Value::String(reference)) => {
                        if let Some(rest) = reference.strip_prefix(DEFINITIONS_PREFIX) {
                            *reference = format!("{DEFINITIONS_PREFIX}{prefix}{rest}");
                        }
                    }
                    (_, value) => prefix_refs(value, prefix),
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(|item| prefix_refs(item, prefix)),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registry() -> SchemaRegistry {
        let mut registry = SchemaRegistry::new();
        registry
            .add_document(
                "search.json",
                json!({
                    "definitions": {
                        "Result": {
                            "type": "object",
                            "required": ["title"],
                            "properties": {"title": {"type": "string"}}
                        },
                        "SearchResults": {
                            "type": "array",
                            "items": {"$ref": "#/definitions/Result"}
                        },
                        "Unused": {"type": "null"}
                    }
                }),
                "",
            )
            .unwrap();
        registry
    }

    #[test]
    fn test_add_document_registers_definitions() {
        let registry = registry();
        assert_eq!(registry.len(), 3);
        assert!(registry.contains("Result"));
        assert_eq!(
            registry.names().collect::<Vec<_>>(),
            vec!["Result", "SearchResults", "Unused"]
        );
    }

    #[test]
    fn test_missing_definitions_rejected() {
        let mut registry = SchemaRegistry::new();
        let err = registry
            .add_document("bad.json", json!({"Result": {}}), "")
            .unwrap_err();
        assert!(matches!(err, SchemaError::MissingDefinitions { .. }));
    }

    #[test]
    fn test_non_object_definitions_rejected() {
        let mut registry = SchemaRegistry::new();
        let err = registry
            .add_document("bad.json", json!({"definitions": []}), "")
            .unwrap_err();
        assert!(matches!(err, SchemaError::DefinitionsNotObject { .. }));
    }

    #[test]
    fn test_duplicate_definition_rejected() {
        let mut registry = registry();
        let err = registry
            .add_document("again.json", json!({"definitions": {"Result": {}}}), "")
            .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateDefinition { ref name } if name == "Result"));

        assert!(registry.define("Result", json!({})).is_err());
        assert!(registry.define("Other", json!({})).is_ok());
    }

    #[test]
    fn test_prefix_rewrites_local_refs() {
        let mut registry = SchemaRegistry::new();
        registry
            .add_document(
                "v2.json",
                json!({
                    "definitions": {
                        "Item": {"type": "string"},
                        "Items": {"type": "array", "items": {"$ref": "#/definitions/Item"}}
                    }
                }),
                "V2",
            )
            .unwrap();

        assert!(registry.contains("V2Item"));
        assert_eq!(
            registry.get("V2Items").unwrap()["items"]["$ref"],
            "#/definitions/V2Item"
        );
    }

    #[test]
    fn test_reachable_follows_nested_refs() {
        let registry = registry();
        let reached = registry
            .reachable(&json!({"$ref": "#/definitions/SearchResults"}))
            .unwrap();

        assert!(reached.contains_key("SearchResults"));
        assert!(reached.contains_key("Result"));
        assert!(!reached.contains_key("Unused"));
    }

    #[test]
    fn test_reachable_rejects_unknown_and_external_refs() {
        let registry = registry();

        let err = registry
            .reachable(&json!({"$ref": "#/definitions/Missing"}))
            .unwrap_err();
        assert!(matches!(err, SchemaError::UnresolvableReference { .. }));

        let err = registry
            .reachable(&json!({"items": {"$ref": "other.json#/definitions/Result"}}))
            .unwrap_err();
        assert!(err.to_string().contains("other.json"));
    }

    #[test]
    fn test_definition_name() {
        assert_eq!(definition_name("#/definitions/Result"), Some("Result".to_string()));
        assert_eq!(
            definition_name("#/definitions/Result/properties/title"),
            Some("Result".to_string())
        );
        assert_eq!(definition_name("#/definitions/a~1b"), Some("a/b".to_string()));
        assert_eq!(definition_name("#/components/schemas/Result"), None);
        assert_eq!(definition_name("#/definitions/"), None);
    }
}
