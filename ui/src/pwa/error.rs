//! Error taxonomy for the PWA lifecycle core.
//!
//! None of these ever escape into unrelated application code: listener and
//! subscription failures are logged where they happen, and only the
//! activation outcome is handed back to the caller of
//! [`PwaManager::activate_update`](super::PwaManager::activate_update).

use std::time::Duration;

use thiserror::Error;

/// Error returned by a listener that could not handle an event.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ListenerError(String);

impl ListenerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

/// Host notification channels the core attaches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Connectivity,
    Worker,
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Channel::Connectivity => "connectivity",
            Channel::Worker => "worker",
        })
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PwaError {
    /// A registered listener failed while handling an event.
    #[error("listener failed: {0}")]
    Listener(#[from] ListenerError),

    /// Attaching to a host notification channel failed.
    #[error("{channel} channel unavailable: {reason}")]
    Subscription { channel: Channel, reason: String },

    /// The waiting worker never confirmed it took control.
    #[error("worker did not take control within {}ms", waited.as_millis())]
    ActivationTimeout { waited: Duration },

    /// A newer activation request replaced this one before it completed.
    #[error("activation superseded by a newer request")]
    ActivationSuperseded,

    /// A host primitive (skip-waiting message, reload) failed.
    #[error("host error: {0}")]
    Host(String),
}

impl PwaError {
    pub fn subscription(channel: Channel, reason: impl Into<String>) -> Self {
        Self::Subscription {
            channel,
            reason: reason.into(),
        }
    }
}

#[cfg(target_arch = "wasm32")]
impl From<wasm_bindgen::JsValue> for PwaError {
    fn from(js_val: wasm_bindgen::JsValue) -> Self {
        let message = js_val
            .as_string()
            .unwrap_or_else(|| format!("{js_val:?}"));
        PwaError::Host(message)
    }
}

#[cfg(target_arch = "wasm32")]
impl From<PwaError> for wasm_bindgen::JsValue {
    fn from(err: PwaError) -> Self {
        wasm_bindgen::JsValue::from_str(&err.to_string())
    }
}

pub type PwaResult<T> = Result<T, PwaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_message_reports_bound() {
        let err = PwaError::ActivationTimeout {
            waited: Duration::from_millis(2500),
        };
        assert_eq!(err.to_string(), "worker did not take control within 2500ms");
    }

    #[test]
    fn subscription_names_channel() {
        let err = PwaError::subscription(Channel::Worker, "service workers unsupported");
        assert_eq!(
            err.to_string(),
            "worker channel unavailable: service workers unsupported"
        );
    }
}
