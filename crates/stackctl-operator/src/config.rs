use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Driver settings supplied by the embedding process.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Timeout applied to every remote stack call.
    pub remote_timeout: Duration,
    /// Timeout applied to every status flush.
    pub flush_timeout: Duration,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            remote_timeout: Duration::from_secs(30),
            flush_timeout: Duration::from_secs(10),
        }
    }
}
