//! CloudFormation intrinsic functions used in generated documents.

use serde_json::{json, Value};

/// `{"Ref": logical}`
pub fn reference(logical: &str) -> Value {
    json!({ "Ref": logical })
}

/// `{"Fn::GetAtt": [logical, attribute]}`
pub fn get_att(logical: &str, attribute: &str) -> Value {
    json!({ "Fn::GetAtt": [logical, attribute] })
}

/// `{"Fn::ImportValue": name}`
pub fn import_value(name: &str) -> Value {
    json!({ "Fn::ImportValue": name })
}
