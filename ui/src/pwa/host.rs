//! Boundary between the lifecycle core and the runtime it runs in.

use std::rc::Rc;

use super::error::{Channel, PwaError, PwaResult};

/// Identity of one waiting worker instance. The host bumps `generation`
/// whenever it observes a worker object it has not seen before.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkerVersion {
    pub script_url: String,
    pub generation: u64,
}

impl WorkerVersion {
    pub fn new(script_url: impl Into<String>, generation: u64) -> Self {
        Self {
            script_url: script_url.into(),
            generation,
        }
    }
}

impl std::fmt::Display for WorkerVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.script_url, self.generation)
    }
}

/// Notifications delivered on the worker channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerSignal {
    /// A new version finished installing and waits to take control.
    Waiting(WorkerVersion),
    /// A different worker now controls the page.
    ControllerChanged,
    /// The channel failed after it was attached (e.g. registration rejected).
    Unavailable(String),
}

pub type ConnectivitySink = Rc<dyn Fn(bool)>;
pub type WorkerSink = Rc<dyn Fn(WorkerSignal)>;

/// Runtime primitives the core consumes. Implementations deliver host
/// notifications through the sinks handed to the `watch_*` methods for the
/// rest of the process lifetime.
pub trait PwaHost {
    /// Current connectivity flag (`navigator.onLine` on the web).
    fn is_online(&self) -> bool;

    fn watch_connectivity(&self, sink: ConnectivitySink) -> PwaResult<()>;

    fn watch_worker(&self, sink: WorkerSink) -> PwaResult<()>;

    /// The worker currently waiting to activate, if any.
    fn waiting_worker(&self) -> PwaResult<Option<WorkerVersion>>;

    /// Asks `worker` to take control without waiting for open pages to close.
    fn skip_waiting(&self, worker: &WorkerVersion) -> PwaResult<()>;

    fn reload(&self) -> PwaResult<()>;
}

/// Host for targets without a browser runtime: permanently online, no
/// background worker, no page to reload.
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedHost;

impl PwaHost for DetachedHost {
    fn is_online(&self) -> bool {
        true
    }

    fn watch_connectivity(&self, _sink: ConnectivitySink) -> PwaResult<()> {
        // Never changes, so there is nothing to deliver.
        Ok(())
    }

    fn watch_worker(&self, _sink: WorkerSink) -> PwaResult<()> {
        Err(PwaError::subscription(
            Channel::Worker,
            "background workers are not available on this platform",
        ))
    }

    fn waiting_worker(&self) -> PwaResult<Option<WorkerVersion>> {
        Ok(None)
    }

    fn skip_waiting(&self, _worker: &WorkerVersion) -> PwaResult<()> {
        Err(PwaError::Host("no background worker to activate".into()))
    }

    fn reload(&self) -> PwaResult<()> {
        Err(PwaError::Host("page reload is not available on this platform".into()))
    }
}
