//! Composite request schemas and compiled validators.
//!
//! Every endpoint gets one composite schema describing the whole request as
//! a single document:
//!
//! ```text
//! { "Query": {...}, "Params": {...}, "Headers": {...}, "Body": ... }
//! ```
//!
//! and one standalone schema per response status that declares one. Both are
//! compiled once, when the endpoint is defined, and shared read-only by every
//! request afterwards.

use std::collections::BTreeMap;
use std::fmt;

use jsonschema::Validator;
use oasis_core::{TypedParameter, ValidationErrors, ValidationIssue};
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::error::{SchemaError, SchemaResult};
use crate::registry::SchemaRegistry;

/// Draft used for every compiled document.
pub const SCHEMA_DRAFT: &str = "http://json-schema.org/draft-07/schema#";

/// Location reported for violations at the document root.
pub const ROOT_LOCATION: &str = "(root)";

/// Declared request body, as seen by the schema compiler.
#[derive(Debug, Clone, Copy)]
pub struct BodySchema<'a> {
    /// Schema of the body.
    pub schema: &'a Value,
    /// Whether the request must carry a body.
    pub required: bool,
}

/// Builds the composite request schema from declared parameters and body.
///
/// Each of `Query`, `Params` and `Headers` is an object schema whose
/// properties are the parameters of that location and whose `required` list
/// names exactly the required ones. `Body` appears only when a body is
/// declared, and is itself required only when the body is.
#[must_use]
pub fn composite_request_schema(
    query: &[TypedParameter],
    path: &[TypedParameter],
    header: &[TypedParameter],
    body: Option<BodySchema<'_>>,
) -> Value {
    let mut properties = Map::new();
    properties.insert("Query".to_string(), location_schema(query));
    properties.insert("Params".to_string(), location_schema(path));
    properties.insert("Headers".to_string(), location_schema(header));

    let mut required = vec![
        Value::from("Query"),
        Value::from("Params"),
        Value::from("Headers"),
    ];
    if let Some(body) = body {
        properties.insert("Body".to_string(), body.schema.clone());
        if body.required {
            required.push(Value::from("Body"));
        }
    }

    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

fn location_schema(params: &[TypedParameter]) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();
    for param in params {
        properties.insert(param.name.clone(), parameter_schema(param));
        if param.required {
            required.push(Value::from(param.name.clone()));
        }
    }

    let mut schema = Map::new();
    schema.insert("type".to_string(), Value::from("object"));
    schema.insert("properties".to_string(), Value::Object(properties));
    if !required.is_empty() {
        schema.insert("required".to_string(), Value::Array(required));
    }
    Value::Object(schema)
}

fn parameter_schema(param: &TypedParameter) -> Value {
    match &param.schema {
        Value::Null => json!({ "type": param.kind.json_type() }),
        Value::Object(map) if map.is_empty() => json!({ "type": param.kind.json_type() }),
        schema => schema.clone(),
    }
}

/// Outcome of one validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validation {
    /// `true` when the document satisfies the schema.
    pub valid: bool,
    /// One entry per violated constraint.
    pub errors: Vec<ValidationIssue>,
}

/// A schema compiled into a validator, with its source document.
pub struct CompiledSchema {
    document: Value,
    validator: Validator,
}

impl CompiledSchema {
    /// Compiles `schema`, embedding the registry definitions it references.
    ///
    /// Fails with [`SchemaError::UnresolvableReference`] when a `$ref` does
    /// not name a registry definition.
    pub fn compile(schema: &Value, registry: &SchemaRegistry) -> SchemaResult<Self> {
        let definitions = registry.reachable(schema)?;
        let document = json!({
            "$schema": SCHEMA_DRAFT,
            "definitions": definitions,
            "allOf": [schema],
        });

        let validator = jsonschema::validator_for(&document).map_err(|err| SchemaError::Compile {
            message: err.to_string(),
        })?;

        debug!(
            definitions = document["definitions"].as_object().map_or(0, Map::len),
            "schema compiled"
        );
        Ok(Self {
            document,
            validator,
        })
    }

    /// Returns the compiled document, definitions included.
    #[must_use]
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Returns `true` if `instance` satisfies the schema.
    #[must_use]
    pub fn is_valid(&self, instance: &Value) -> bool {
        self.validator.is_valid(instance)
    }

    /// Validates `instance`, reporting every violated constraint.
    pub fn check(&self, instance: &Value) -> Validation {
        let errors: Vec<ValidationIssue> = self
            .validator
            .iter_errors(instance)
            .map(|err| {
                let pointer = err.instance_path.to_string();
                let location = if pointer.is_empty() {
                    ROOT_LOCATION.to_string()
                } else {
                    pointer
                };
                ValidationIssue::new(location, err.to_string())
            })
            .collect();

        Validation {
            valid: errors.is_empty(),
            errors,
        }
    }

    /// Validates `instance`, returning the violations as an error.
    pub fn validate(&self, instance: &Value) -> Result<(), ValidationErrors> {
        let outcome = self.check(instance);
        if outcome.valid {
            Ok(())
        } else {
            Err(ValidationErrors::from(outcome.errors))
        }
    }
}

impl fmt::Debug for CompiledSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledSchema")
            .field("document", &self.document)
            .finish_non_exhaustive()
    }
}

/// Compiled response schemas keyed by status code.
#[derive(Debug, Default)]
pub struct ResponseSchemas {
    by_status: BTreeMap<u16, CompiledSchema>,
}

impl ResponseSchemas {
    /// Compiles every declared response schema. Statuses without a schema are skipped.
    pub fn compile<'a, I>(declared: I, registry: &SchemaRegistry) -> SchemaResult<Self>
    where
        I: IntoIterator<Item = (u16, Option<&'a Value>)>,
    {
        let mut by_status = BTreeMap::new();
        for (status, schema) in declared {
            if let Some(schema) = schema {
                by_status.insert(status, CompiledSchema::compile(schema, registry)?);
            }
        }
        Ok(Self { by_status })
    }

    /// Returns the schema for `status`.
    #[must_use]
    pub fn get(&self, status: u16) -> Option<&CompiledSchema> {
        self.by_status.get(&status)
    }

    /// Returns the number of compiled schemas.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_status.len()
    }

    /// Returns `true` if no response declares a schema.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_status.is_empty()
    }
}
