//! Query string decoding.

use std::collections::HashMap;

use tracing::debug;

/// Decodes a query string, keeping the first value of each key.
///
/// Values are form-decoded (`+` is a space, `%xx` escapes are resolved).
/// An undecodable query string is treated as empty.
///
/// ```rust
/// use oasis_extract::first_query_values;
///
/// let values = first_query_values("q=hello+world&limit=10&limit=20");
/// assert_eq!(values["q"], "hello world");
/// assert_eq!(values["limit"], "10");
/// ```
#[must_use]
pub fn first_query_values(query: &str) -> HashMap<String, String> {
    let pairs: Vec<(String, String)> = match serde_urlencoded::from_str(query) {
        Ok(pairs) => pairs,
        Err(err) => {
            debug!(error = %err, "undecodable query string ignored");
            return HashMap::new();
        }
    };

    let mut values = HashMap::with_capacity(pairs.len());
    for (key, value) in pairs {
        values.entry(key).or_insert(value);
    }
    values
}
