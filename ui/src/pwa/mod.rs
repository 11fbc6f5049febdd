//! Process-wide Progressive-Web-App lifecycle manager.
//!
//! One [`PwaManager`] per UI thread owns connectivity tracking, waiting
//! worker detection and the listener registry UI components subscribe to.
//! It is created on first use ([`PwaManager::global`]) or explicitly at app
//! start ([`PwaManager::install`]) and is never torn down; host
//! subscriptions live as long as it does.
//!
//! ```ignore
//! let manager = PwaManager::global();
//! let listener = Listener::infallible(|event| tracing::info!(%event, "pwa"));
//! manager.add_event_listener(&listener);
//! // ... on unmount
//! manager.remove_event_listener(&listener);
//! ```

use std::rc::Rc;

use once_cell::unsync::OnceCell;

use crate::core::platform;

mod bus;
mod config;
mod connectivity;
mod error;
mod event;
mod host;
mod update;
#[cfg(target_arch = "wasm32")]
mod web_host;

pub use bus::{DispatchReport, EventBus, Listener};
pub use config::{PwaConfig, DEFAULT_ACTIVATION_TIMEOUT_MS};
pub use connectivity::{ConnectivityMonitor, ConnectivityState};
pub use error::{Channel, ListenerError, PwaError, PwaResult};
pub use event::LifecycleEvent;
pub use host::{ConnectivitySink, DetachedHost, PwaHost, WorkerSignal, WorkerSink, WorkerVersion};
pub use update::UpdateDetector;
#[cfg(target_arch = "wasm32")]
pub use web_host::WebHost;

thread_local! {
    static MANAGER: OnceCell<Rc<PwaManager>> = const { OnceCell::new() };
}

pub struct PwaManager {
    bus: Rc<EventBus>,
    connectivity: Rc<ConnectivityMonitor>,
    updates: Rc<UpdateDetector>,
}

impl PwaManager {
    /// Installs the process-wide manager on `host`. Later calls (from any
    /// call site) return the instance created first and ignore their
    /// arguments.
    pub fn install(host: Rc<dyn PwaHost>, config: &PwaConfig) -> Rc<Self> {
        if let Some(existing) = Self::installed() {
            tracing::debug!("pwa manager already installed");
            return existing;
        }

        let bus = Rc::new(EventBus::new());
        let manager = Rc::new(Self {
            connectivity: Rc::new(ConnectivityMonitor::new(bus.clone(), host.is_online())),
            updates: Rc::new(UpdateDetector::new(
                bus.clone(),
                host.clone(),
                config.activation_timeout(),
            )),
            bus,
        });
        MANAGER.with(|cell| {
            let _ = cell.set(manager.clone());
        });

        // Attached only after the instance is published: host callbacks that
        // reach for `global()` find it instead of constructing a second one.
        manager.attach(host.as_ref());
        tracing::info!(
            platform = %platform::platform_string(),
            online = manager.connectivity.is_online(),
            "pwa manager installed"
        );
        manager
    }

    /// The installed manager, installing one on the platform default host
    /// with default settings if nobody did yet.
    pub fn global() -> Rc<Self> {
        Self::installed().unwrap_or_else(|| {
            let config = PwaConfig::default();
            Self::install(default_host(&config), &config)
        })
    }

    pub fn installed() -> Option<Rc<Self>> {
        MANAGER.with(|cell| cell.get().cloned())
    }

    pub fn add_event_listener(&self, listener: &Listener) {
        self.bus.add_event_listener(listener);
    }

    pub fn remove_event_listener(&self, listener: &Listener) {
        self.bus.remove_event_listener(listener);
    }

    /// Swaps in the waiting worker and reloads the page. Resolves at once
    /// when no update is pending; fails with
    /// [`PwaError::ActivationTimeout`] if the worker never confirms.
    pub async fn activate_update(&self) -> PwaResult<()> {
        self.updates.activate_update().await
    }

    fn attach(&self, host: &dyn PwaHost) {
        if let Err(err) = self.connectivity.attach(host) {
            tracing::warn!(error = %err, "connectivity tracking disabled");
        }
        if let Err(err) = self.updates.attach() {
            tracing::debug!(error = %err, "update detection not attached");
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn default_host(config: &PwaConfig) -> Rc<dyn PwaHost> {
    WebHost::new(config)
}

#[cfg(not(target_arch = "wasm32"))]
fn default_host(_config: &PwaConfig) -> Rc<dyn PwaHost> {
    Rc::new(DetachedHost)
}
