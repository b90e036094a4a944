use serde_json::{Map, Value};

use crate::error::{StoreError, StoreResult};

/// Rebuild a JSON value with every object's keys in sorted order.
pub fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut sorted = Map::new();
            for key in keys {
                sorted.insert(key.clone(), canonicalize(&map[key]));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

/// Deterministic byte encoding of a document: compact JSON, sorted keys.
pub fn canonical_bytes(document: &Value) -> StoreResult<Vec<u8>> {
    serde_json::to_vec(&canonicalize(document)).map_err(|e| StoreError::Serialization(e.to_string()))
}
