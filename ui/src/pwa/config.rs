//! Settings for the lifecycle manager.

use std::time::Duration;

use serde::Deserialize;

/// Default bound on waiting for a worker to take control.
pub const DEFAULT_ACTIVATION_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PwaConfig {
    /// Script registered as the background worker.
    pub worker_script_url: String,
    pub worker_scope: String,
    pub activation_timeout_ms: u64,
}

impl Default for PwaConfig {
    fn default() -> Self {
        Self {
            worker_script_url: "/sw.js".to_string(),
            worker_scope: "/".to_string(),
            activation_timeout_ms: DEFAULT_ACTIVATION_TIMEOUT_MS,
        }
    }
}

impl PwaConfig {
    /// Parses a (possibly partial) JSON document; missing keys keep their
    /// defaults.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn activation_timeout(&self) -> Duration {
        Duration::from_millis(self.activation_timeout_ms)
    }
}
