//! The remote stack client surface.
//!
//! The core never talks to the provider itself; it defines the payload
//! shapes and consumes this trait. Adapters (e.g. the CloudFormation one
//! in stackctl-aws) implement it; tests use a scripted mock.
//!
//! Methods return boxed futures for dyn compatibility.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use stackctl_core::lifecycle::StackPhase;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Errors surfaced by a stack client. Opaque to the core; the
/// reconciler classifies them.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("stack not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Remote(String),
}

/// Observed status of a remote stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteStackStatus {
    /// Provider-native status string, e.g. "CREATE_COMPLETE".
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl RemoteStackStatus {
    /// Map the provider status onto the lifecycle phase. Unknown strings
    /// return None; the caller keeps the current phase.
    pub fn phase(&self) -> Option<StackPhase> {
        let phase = match self.status.as_str() {
            "CREATE_IN_PROGRESS" | "REVIEW_IN_PROGRESS" => StackPhase::Creating,
            "CREATE_COMPLETE"
            | "UPDATE_COMPLETE"
            | "UPDATE_ROLLBACK_COMPLETE"
            | "IMPORT_COMPLETE" => StackPhase::Ready,
            "UPDATE_IN_PROGRESS"
            | "UPDATE_COMPLETE_CLEANUP_IN_PROGRESS"
            | "UPDATE_ROLLBACK_IN_PROGRESS"
            | "UPDATE_ROLLBACK_COMPLETE_CLEANUP_IN_PROGRESS" => StackPhase::Updating,
            "DELETE_IN_PROGRESS" => StackPhase::Deleting,
            "DELETE_COMPLETE" => StackPhase::Deleted,
            s if s.ends_with("_FAILED") || s.starts_with("ROLLBACK_") => StackPhase::Failed,
            _ => return None,
        };
        Some(phase)
    }
}

/// Remote stack management calls, provider-agnostic.
///
/// Every call is wrapped with a caller-supplied timeout by the driver;
/// implementations do not need their own.
pub trait StackClient: Send + Sync {
    /// Create a stack; returns the opaque stack id.
    fn create_stack(
        &self,
        name: &str,
        template_body: &str,
        parameters: &BTreeMap<String, String>,
        notification_arns: &[String],
    ) -> BoxFuture<'_, Result<String, ClientError>>;

    fn update_stack(
        &self,
        stack_id: &str,
        template_body: &str,
        parameters: &BTreeMap<String, String>,
    ) -> BoxFuture<'_, Result<(), ClientError>>;

    fn describe_stack(&self, stack_id: &str)
        -> BoxFuture<'_, Result<RemoteStackStatus, ClientError>>;

    fn delete_stack(&self, stack_id: &str) -> BoxFuture<'_, Result<(), ClientError>>;
}
