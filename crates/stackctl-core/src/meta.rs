use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Identity metadata every reconciled resource carries.
///
/// Labels use an ordered map so serialization is deterministic. The spec
/// fingerprint lives in `labels` under
/// [`crate::fingerprint::SPEC_FINGERPRINT_LABEL`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceMeta {
    pub name: String,
    pub namespace: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    /// Bumped by the owner on every spec edit.
    #[serde(default)]
    pub generation: i64,
}

/// Reference to another reconciled object, e.g. a managed policy attached
/// to a user. An unset namespace means "same namespace as the referencing
/// resource" and is defaulted at template-generation time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

/// Common stack settings embedded in every resource spec.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudFormationMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Explicit stack name override. When unset the stack name is derived
    /// from the resource identity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_name: Option<String>,
    /// Notification targets for stack events. A null entry means "no
    /// target for that slot" and is skipped, never an error.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notification_arns: Vec<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub termination_protection: Option<bool>,
}
