use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::lifecycle::StackPhase;

/// Structured condition block observed on a resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionStatus {
    #[serde(default)]
    pub phase: StackPhase,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<StackCondition>,
}

/// One observed condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackCondition {
    #[serde(rename = "type")]
    pub kind: ConditionKind,
    pub reason: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<Timestamp>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionKind {
    Progressing,
    Ready,
    Terminated,
    Failed,
}

impl ConditionKind {
    /// The condition a phase is reported under.
    pub fn for_phase(phase: StackPhase) -> Self {
        match phase {
            StackPhase::Unset
            | StackPhase::Creating
            | StackPhase::Updating
            | StackPhase::Deleting => Self::Progressing,
            StackPhase::Ready => Self::Ready,
            StackPhase::Deleted => Self::Terminated,
            StackPhase::Failed => Self::Failed,
        }
    }
}

/// Transition bookkeeping written together with [`ConditionStatus`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusMeta {
    #[serde(default)]
    pub observed_generation: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<Timestamp>,
    /// Why the last transition happened, derived from the reported
    /// outcome or error kind.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reason: String,
}

/// The observed-state block persisted on a resource.
///
/// `status` and `status_meta` are only ever written together through
/// [`StackStatus::set_status`]; there is no API for updating one half.
/// Mutated only by the reconciler, never by the spec owner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackStatus {
    /// Opaque remote stack identifier. Empty until the first successful
    /// create.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub stack_id: String,
    #[serde(default)]
    pub status: ConditionStatus,
    #[serde(default)]
    pub status_meta: StatusMeta,
}
