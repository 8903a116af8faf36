//! Deep merge of JSON documents.

use serde_json::Value;

/// Merges `patch` into `base`.
///
/// Objects merge key by key, recursively. Any other value in `patch`,
/// arrays and `null` included, replaces the one in `base`.
pub fn deep_merge(base: &mut Value, patch: Value) {
    match (base, patch) {
        (Value::Object(base), Value::Object(patch)) => {
            for (key, value) in patch {
                match base.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, patch) => *base = patch,
    }
}
