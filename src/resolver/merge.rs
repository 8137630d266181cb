//! Merging caller data with frontmatter.

use serde::{Deserialize, Serialize};

use crate::expression::{Map, Value};

/// How a document's frontmatter combines with the data it was called with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergePolicy {
    /// Frontmatter keys replace caller keys wholesale.
    #[default]
    Shallow,
    /// Nested objects are merged key by key; other values are replaced.
    Deep,
}

/// Overlay `overrides` on `base`.
///
/// ```rust
/// use serde_json::json;
/// use stitch_cli::expression::{Map, Value};
/// use stitch_cli::resolver::merge::{MergePolicy, merge};
///
/// let as_map = |json: serde_json::Value| match Value::from(json) {
///     Value::Object(map) => map,
///     _ => Map::new(),
/// };
/// let base = as_map(json!({ "site": { "name": "a", "lang": "de" } }));
/// let overrides = as_map(json!({ "site": { "lang": "en" } }));
///
/// let merged = merge(&base, overrides, MergePolicy::Deep);
/// assert_eq!(Value::Object(merged).to_json(), Some(json!({ "site": { "name": "a", "lang": "en" } })));
/// ```
pub fn merge(base: &Map, overrides: Map, policy: MergePolicy) -> Map {
    let mut merged = base.clone();
    for (key, value) in overrides {
        let value = match (policy, merged.remove(&key)) {
            (MergePolicy::Deep, Some(existing)) => deep_merge(existing, value),
            _ => value,
        };
        merged.insert(key, value);
    }
    merged
}

fn deep_merge(base: Value, overrides: Value) -> Value {
    match (base, overrides) {
        (Value::Object(mut base_obj), Value::Object(override_obj)) => {
            for (key, override_value) in override_obj {
                let value = match base_obj.remove(&key) {
                    Some(base_value) => deep_merge(base_value, override_value),
                    None => override_value,
                };
                base_obj.insert(key, value);
            }
            Value::Object(base_obj)
        }
        (_, overrides) => overrides,
    }
}
