//! Deep-merge logic for layered configuration documents
//!
//! Merge semantics:
//! - Mappings: deep-merge by key, as long as at least one side is associative
//! - Sequences: REPLACE (overlay wins entirely, never element-wise)
//! - Scalars: override (overlay wins)

use serde_json::{Map, Value};

/// Deep merge two document values; `overlay` has the higher priority.
///
/// Two mappings are merged recursively per key unless both are
/// sequence-shaped (keys exactly `"0".."n-1"`), in which case the overlay
/// replaces the base wholesale, same as two arrays. In every other pairing
/// (scalar, type mismatch, null) the overlay wins.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            // Two list-shaped mappings behave like sequences: replace.
            if !is_associative(&base_map) && !is_associative(&overlay_map) {
                return Value::Object(overlay_map);
            }
            for (key, overlay_value) in overlay_map {
                let merged = if let Some(base_value) = base_map.remove(&key) {
                    deep_merge(base_value, overlay_value)
                } else {
                    overlay_value
                };
                base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }

        // Sequences: REPLACE (no concatenation, no element merge)
        (Value::Array(_), overlay @ Value::Array(_)) => overlay,

        // Scalars and any other case: overlay wins
        (_, overlay) => overlay,
    }
}

/// Merge multiple config layers in order (first is base, last has highest
/// precedence).
pub fn merge_layers(layers: Vec<Value>) -> Value {
    layers.into_iter().fold(Value::Null, deep_merge)
}

/// Check whether a mapping is associative.
///
/// A mapping is NOT associative only if its keys are exactly the canonical
/// decimal strings `"0".."n-1"` (no sign, no leading zeros, none missing).
/// The empty mapping is not associative.
pub(crate) fn is_associative(map: &Map<String, Value>) -> bool {
    if map.is_empty() {
        return false;
    }
    let len = map.len();
    // Keys are unique, so "all parse canonically and all < len" means the
    // key set is exactly 0..len-1 regardless of iteration order.
    !map.keys()
        .all(|key| canonical_index(key).is_some_and(|i| i < len))
}

fn canonical_index(key: &str) -> Option<usize> {
    let index: usize = key.parse().ok()?;
    (index.to_string() == key).then_some(index)
}
