//! Types reported by collaborators.

use derive_getters::Getters;
use quarry_core::BackendKind;
use serde::{Deserialize, Serialize};

/// Health status of a backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum HealthStatus {
    /// Fully operational
    Healthy,
    /// Operational with reduced capability
    Degraded {
        /// Description of the degradation
        message: String,
    },
    /// Not operational
    Unhealthy {
        /// Description of the problem
        message: String,
    },
}

/// Snapshot returned by [`crate::ExecutionBackend::status`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct BackendStatus {
    kind: BackendKind,
    connected: bool,
    health: HealthStatus,
    /// Backend-specific details (URL, session id, running jobs, ...)
    details: serde_json::Map<String, serde_json::Value>,
}

impl BackendStatus {
    /// Status with no extra details.
    pub fn new(kind: BackendKind, connected: bool, health: HealthStatus) -> Self {
        Self {
            kind,
            connected,
            health,
            details: serde_json::Map::new(),
        }
    }

    /// Attach one detail entry.
    pub fn with_detail(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }
}
