use serde_json::{Map as JsonMap, Value};

/// Deep-merge `b` into `a`.
pub fn deep_merge(a: &mut Value, b: &Value) {
    match (a, b) {
        (Value::Object(a_map), Value::Object(b_map)) => {
            for (k, v) in b_map {
                if let Some(av) = a_map.get_mut(k) {
                    deep_merge(av, v);
                } else {
                    a_map.insert(k.clone(), v.clone());
                }
            }
        }
        (a_slot, b_val) => {
            *a_slot = b_val.clone();
        }
    }
}

/// Merge extra options into a target map, skipping disallowed keys.
///
/// Returns the keys that were skipped so callers can report them.
pub fn merge_options_with_disallow(
    target: &mut JsonMap<String, Value>,
    options: &JsonMap<String, Value>,
    disallow: &[&str],
) -> Vec<String> {
    let mut skipped = Vec::new();
    for (k, v) in options {
        if disallow.contains(&k.as_str()) {
            skipped.push(k.clone());
            continue;
        }
        match target.get_mut(k) {
            Some(existing) => deep_merge(existing, v),
            None => {
                target.insert(k.clone(), v.clone());
            }
        }
    }
    skipped
}
