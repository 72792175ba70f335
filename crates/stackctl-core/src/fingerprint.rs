//! Spec change detection.
//!
//! The desired-state spec is hashed to a stable fingerprint stored in the
//! resource labels. A label that differs from the hash of the current
//! spec is the sole trigger for redeployment.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::CoreError;

/// Well-known label key holding the spec fingerprint.
pub const SPEC_FINGERPRINT_LABEL: &str = "cloudformation.stackctl.io/spec-fingerprint";

/// Content hash of a spec: SHA-256 over its canonical JSON form, hex
/// encoded. Any value change in the spec changes the hash; incidental
/// formatting and map ordering do not.
pub fn fingerprint<T: Serialize>(spec: &T) -> Result<String, CoreError> {
    let value = serde_json::to_value(spec)?;
    let digest = Sha256::digest(canonical_json(&value).as_bytes());
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(out, "{byte:02x}");
    }
    Ok(out)
}

/// Whether the stored label is stale for the given spec.
///
/// A missing label always reads as changed.
pub fn has_changed<T: Serialize>(stored: Option<&str>, spec: &T) -> Result<bool, CoreError> {
    Ok(stored != Some(fingerprint(spec)?.as_str()))
}

/// Recompute the fingerprint and overwrite the stored label.
///
/// Idempotent: refreshing twice in a row leaves the label unchanged.
pub fn refresh_label<T: Serialize>(
    labels: &mut BTreeMap<String, String>,
    spec: &T,
) -> Result<(), CoreError> {
    let hash = fingerprint(spec)?;
    labels.insert(SPEC_FINGERPRINT_LABEL.to_string(), hash);
    Ok(())
}

pub fn stored_label(labels: &BTreeMap<String, String>) -> Option<&str> {
    labels.get(SPEC_FINGERPRINT_LABEL).map(String::as_str)
}

/// Canonical JSON rendering: object keys sorted, no insignificant
/// whitespace. Shared with stack-parameter stringification so parameter
/// values never diverge from fingerprint canonicalization.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<&String, &Value> = map.iter().collect();
            out.push('{');
            for (i, (key, val)) in sorted.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(val, out);
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
        other => out.push_str(&other.to_string()),
    }
}
