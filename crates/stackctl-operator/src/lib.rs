//! stackctl-operator
//!
//! The StackObject reconciliation contract and its driver. A resource
//! kind implements [`StackResource`] (accessors plus its mapping table);
//! the blanket [`StackObject`] impl gives it the uniform protocol the
//! reconciler drives: render a template, fingerprint the spec, name the
//! stack, and track the remote stack's lifecycle on the resource status.
//!
//! The remote provider is only ever reached through the [`StackClient`]
//! trait; persisted status only through the [`StatusSink`] trait. The
//! driver assumes at most one in-flight reconciliation per resource
//! identity; the embedding platform supplies that exclusivity.

pub mod apis;
pub mod client;
pub mod config;
pub mod error;
pub mod reconcile;
pub mod registry;
pub mod sink;
pub mod stack_object;

pub use crate::client::{ClientError, RemoteStackStatus, StackClient};
pub use crate::config::ReconcileConfig;
pub use crate::error::OperatorError;
pub use crate::reconcile::{Outcome, Reconciler};
pub use crate::registry::Registry;
pub use crate::sink::{InMemorySink, SinkError, StatusSink};
pub use crate::stack_object::{ResourceIdentity, StackObject, StackResource};
