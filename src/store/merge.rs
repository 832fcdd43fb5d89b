//! Deep merge and flattening of raw translation trees.
//!
//! Multiple source files may contribute to the same locale. Contributions
//! are combined with [`deep_merge`] in discovery order and the merged tree
//! is flattened into dot-joined keys with [`flatten`] before it ever
//! reaches a dictionary.

use std::collections::HashMap;

use serde_json::Value;

/// Deep-merge `source` into `target`.
///
/// Recursion happens only when both sides are objects. Any other pairing
/// overwrites the target wholesale, so conflicting leaves are
/// last-write-wins and arrays are copied as opaque values, never merged
/// element-wise.
pub fn deep_merge(target: &mut Value, source: Value) {
    match (target, source) {
        (Value::Object(target_map), Value::Object(source_map)) => {
            for (key, value) in source_map {
                match target_map.get_mut(&key) {
                    Some(slot) => deep_merge(slot, value),
                    None => {
                        target_map.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

/// Flatten a nested translation tree into a flat key map.
///
/// Nested object keys are joined with `separator`, array elements are
/// indexed as `key[0]`, and non-string leaves are stringified. Empty
/// objects contribute no keys.
///
/// # Examples
/// ```
/// use serde_json::json;
/// use bot_i18n::store::merge::flatten;
///
/// let tree = json!({
///     "greet": {
///         "hello": "Hello",
///         "bye": "Goodbye"
///     }
/// });
///
/// let flat = flatten(&tree, ".", None);
/// assert_eq!(flat.get("greet.hello"), Some(&"Hello".to_string()));
/// assert_eq!(flat.get("greet.bye"), Some(&"Goodbye".to_string()));
/// ```
#[must_use]
pub fn flatten(tree: &Value, separator: &str, prefix: Option<&str>) -> HashMap<String, String> {
    let mut result = HashMap::new();
    flatten_value(tree, separator, prefix, &mut result);
    result
}

/// Recursive worker for [`flatten`].
fn flatten_value(
    tree: &Value,
    separator: &str,
    prefix: Option<&str>,
    result: &mut HashMap<String, String>,
) {
    match tree {
        Value::Object(map) => {
            for (key, value) in map {
                let full_key =
                    prefix.map_or_else(|| key.clone(), |p| format!("{p}{separator}{key}"));
                flatten_value(value, separator, Some(&full_key), result);
            }
        }
        Value::Array(items) => {
            for (index, value) in items.iter().enumerate() {
                let full_key =
                    prefix.map_or_else(|| format!("[{index}]"), |p| format!("{p}[{index}]"));
                flatten_value(value, separator, Some(&full_key), result);
            }
        }
        Value::String(text) => {
            if let Some(key) = prefix {
                result.insert(key.to_string(), text.clone());
            }
        }
        other => {
            if let Some(key) = prefix {
                result.insert(key.to_string(), other.to_string());
            }
        }
    }
}
