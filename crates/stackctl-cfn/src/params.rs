//! Stack parameter encoding.
//!
//! Spec fields declared as parameters in the kind mapping are flattened
//! into the string map the stack API accepts. Values are stringified
//! with the same canonicalization used for fingerprinting, so parameter
//! values never silently diverge from the template's embedded values.

use std::collections::BTreeMap;

use serde_json::Value;

use stackctl_core::fingerprint::canonical_json;

use crate::mapping::KindMapping;

pub fn parameters(mapping: &KindMapping, spec: &Value) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    for field in mapping.parameters {
        let Some(value) = spec.get(field) else {
            continue;
        };
        if value.is_null() {
            continue;
        }
        let rendered = match value {
            Value::String(s) => s.clone(),
            other => canonical_json(other),
        };
        if rendered.is_empty() {
            continue;
        }
        out.insert((*field).to_string(), rendered);
    }
    out
}
