//! # Hash Index
//!
//! Stable content identifiers for canonical JSON values.
//!
//! The value is rendered as compact JSON with object keys sorted by byte
//! order at every nesting level, then hashed with SHA-256 and hex encoded.
//! The rendering does not depend on the map implementation `serde_json`
//! was compiled with, so the index is identical across builds and hosts.

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Length of a hash index in hex characters.
pub const HASH_INDEX_LENGTH: usize = 64;

/// Render `value` as compact JSON with sorted object keys.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));

            out.push('{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(item, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

/// Compute the hash index of an already-normalized value.
pub fn hash_index(value: &Value) -> String {
    let digest = Sha256::digest(canonical_json(value).as_bytes());
    hex::encode(digest)
}
