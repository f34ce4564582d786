//! Shorthands for common schema fragments.

use serde_json::{json, Value};

use crate::registry::DEFINITIONS_PREFIX;

/// A reference to a registry definition.
///
/// A name that already starts with `#` is used as the reference verbatim.
///
/// ```
/// use oasis_schema::schema_ref;
///
/// assert_eq!(schema_ref("Result")["$ref"], "#/definitions/Result");
/// ```
#[must_use]
pub fn schema_ref(name: &str) -> Value {
    if name.starts_with('#') {
        json!({ "$ref": name })
    } else {
        json!({ "$ref": format!("{DEFINITIONS_PREFIX}{name}") })
    }
}

/// An array schema whose items all match `items`.
///
/// ```
/// use oasis_schema::{array_of, schema_ref};
///
/// let schema = array_of(schema_ref("Result"));
/// assert_eq!(schema["type"], "array");
/// ```
#[must_use]
pub fn array_of(items: Value) -> Value {
    json!({ "type": "array", "items": items })
}
