use std::time::Duration;

use thiserror::Error;

use stackctl_cfn::TemplateError;
use stackctl_core::error::CoreError;
use stackctl_core::lifecycle::LifecycleError;

use crate::client::ClientError;

#[derive(Debug, Error)]
pub enum OperatorError {
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("remote stack client: {0}")]
    Client(#[from] ClientError),

    #[error("{operation} timed out after {timeout:?}")]
    Timeout {
        operation: &'static str,
        timeout: Duration,
    },

    #[error("status flush failed: {0}")]
    StatusFlush(String),

    #[error("no registration for kind {service}.{kind}")]
    UnknownKind { service: String, kind: String },
}

impl OperatorError {
    /// Whether the next reconciliation trigger may succeed without the
    /// owner changing the spec.
    ///
    /// Malformed embedded documents are the owner's to fix; timeouts,
    /// serialization hiccups, and opaque remote errors are retried.
    pub fn retryable(&self) -> bool {
        match self {
            Self::Template(TemplateError::MalformedEmbeddedDocument { .. }) => false,
            Self::Template(_) => true,
            Self::Lifecycle(_) => false,
            Self::Core(_) => true,
            Self::Client(ClientError::NotFound(_)) => false,
            Self::Client(_) => true,
            Self::Timeout { .. } => true,
            Self::StatusFlush(_) => true,
            Self::UnknownKind { .. } => false,
        }
    }
}
