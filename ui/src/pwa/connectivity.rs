//! Edge-triggered online/offline tracking.
//!
//! Purely reactive: if the host stops delivering notifications the state
//! goes stale. There is no polling fallback.

use std::cell::Cell;
use std::rc::Rc;

use super::bus::EventBus;
use super::error::PwaResult;
use super::event::LifecycleEvent;
use super::host::PwaHost;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityState {
    Online,
    Offline,
}

impl ConnectivityState {
    pub fn from_flag(online: bool) -> Self {
        if online {
            Self::Online
        } else {
            Self::Offline
        }
    }
}

pub struct ConnectivityMonitor {
    bus: Rc<EventBus>,
    state: Cell<ConnectivityState>,
}

impl ConnectivityMonitor {
    /// Starts in the state the host reports right now.
    pub fn new(bus: Rc<EventBus>, initially_online: bool) -> Self {
        Self {
            bus,
            state: Cell::new(ConnectivityState::from_flag(initially_online)),
        }
    }

    pub fn state(&self) -> ConnectivityState {
        self.state.get()
    }

    pub fn is_online(&self) -> bool {
        self.state.get() == ConnectivityState::Online
    }

    /// Feeds one host signal. Emits and returns an event only when the
    /// signal crosses an edge; repeats of the current state are dropped.
    pub fn observe(&self, online: bool) -> Option<LifecycleEvent> {
        let next = ConnectivityState::from_flag(online);
        let previous = self.state.replace(next);
        if previous == next {
            tracing::debug!(state = ?next, "duplicate connectivity signal suppressed");
            return None;
        }

        let event = LifecycleEvent::for_connectivity(online);
        tracing::debug!(from = ?previous, to = ?next, "connectivity changed");
        self.bus.dispatch(event);
        Some(event)
    }

    /// Subscribes to the host connectivity channel for the rest of the
    /// process lifetime.
    pub(crate) fn attach(self: &Rc<Self>, host: &dyn PwaHost) -> PwaResult<()> {
        let monitor = Rc::downgrade(self);
        host.watch_connectivity(Rc::new(move |online| {
            if let Some(monitor) = monitor.upgrade() {
                monitor.observe(online);
            }
        }))
    }
}
