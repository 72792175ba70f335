//! Persisted-status write-back surface.
//!
//! The resource status block is the sole persistence surface of the
//! system; the driver flushes it through this trait after every
//! mutation. Flushes must be atomic per identity: a failed flush leaves
//! the previously persisted label/status pair unchanged.

use std::collections::BTreeMap;
use std::sync::Mutex;

use thiserror::Error;

use stackctl_core::status::StackStatus;

use crate::client::BoxFuture;
use crate::stack_object::ResourceIdentity;

#[derive(Debug, Error)]
#[error("{0}")]
pub struct SinkError(pub String);

pub trait StatusSink: Send + Sync {
    /// Persist the label map and status block for one resource identity.
    fn flush(
        &self,
        identity: &ResourceIdentity,
        labels: &BTreeMap<String, String>,
        status: &StackStatus,
    ) -> BoxFuture<'_, Result<(), SinkError>>;
}

/// In-memory sink for tests and dry runs.
#[derive(Default)]
pub struct InMemorySink {
    records: Mutex<BTreeMap<String, (BTreeMap<String, String>, StackStatus)>>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(
        &self,
        identity: &ResourceIdentity,
    ) -> Option<(BTreeMap<String, String>, StackStatus)> {
        self.records.lock().ok()?.get(&identity.to_string()).cloned()
    }
}

impl StatusSink for InMemorySink {
    fn flush(
        &self,
        identity: &ResourceIdentity,
        labels: &BTreeMap<String, String>,
        status: &StackStatus,
    ) -> BoxFuture<'_, Result<(), SinkError>> {
        let key = identity.to_string();
        let labels = labels.clone();
        let status = status.clone();
        Box::pin(async move {
            self.records
                .lock()
                .map_err(|_| SinkError("sink mutex poisoned".to_string()))?
                .insert(key, (labels, status));
            Ok(())
        })
    }
}
