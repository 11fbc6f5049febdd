//! Synchronous publish/subscribe for lifecycle events.
//!
//! Listeners are identified by their [`Listener`] handle (pointer identity of
//! the shared callback), so registering a clone of a handle twice is a no-op.
//! Dispatch works on a snapshot of the registry and re-checks membership
//! before every call: a listener removed mid-dispatch is not invoked again,
//! and listeners added mid-dispatch first see the next event.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use super::error::{ListenerError, PwaError};
use super::event::LifecycleEvent;

type Callback = dyn Fn(LifecycleEvent) -> Result<(), ListenerError>;

/// Shared handle to a lifecycle callback. Clones refer to the same listener.
#[derive(Clone)]
pub struct Listener(Rc<Callback>);

impl Listener {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(LifecycleEvent) -> Result<(), ListenerError> + 'static,
    {
        Self(Rc::new(callback))
    }

    /// Wraps a callback that cannot fail.
    pub fn infallible<F>(callback: F) -> Self
    where
        F: Fn(LifecycleEvent) + 'static,
    {
        Self::new(move |event| {
            callback(event);
            Ok(())
        })
    }

    fn call(&self, event: LifecycleEvent) -> Result<(), ListenerError> {
        (self.0)(event)
    }
}

impl PartialEq for Listener {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Listener {}

impl std::fmt::Debug for Listener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Listener")
            .field(&Rc::as_ptr(&self.0).cast::<()>())
            .finish()
    }
}

/// Outcome counts of a single dispatch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: usize,
    pub failed: usize,
    /// Listeners removed by an earlier listener during this dispatch.
    pub skipped: usize,
}

struct Entry {
    id: u64,
    listener: Listener,
}

#[derive(Default)]
pub struct EventBus {
    entries: RefCell<Vec<Entry>>,
    next_id: Cell<u64>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `listener` unless it is already registered.
    pub fn add_event_listener(&self, listener: &Listener) {
        let mut entries = self.entries.borrow_mut();
        if entries.iter().any(|entry| entry.listener == *listener) {
            return;
        }
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        entries.push(Entry {
            id,
            listener: listener.clone(),
        });
    }

    /// Unregisters `listener`; absent listeners are ignored.
    pub fn remove_event_listener(&self, listener: &Listener) {
        self.entries
            .borrow_mut()
            .retain(|entry| entry.listener != *listener);
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Delivers `event` to every registered listener in registration order.
    /// Listener failures (errors or panics) are logged and counted, never
    /// propagated.
    pub fn dispatch(&self, event: LifecycleEvent) -> DispatchReport {
        let snapshot: Vec<(u64, Listener)> = self
            .entries
            .borrow()
            .iter()
            .map(|entry| (entry.id, entry.listener.clone()))
            .collect();

        let mut report = DispatchReport::default();
        for (id, listener) in snapshot {
            if !self.is_registered(id) {
                report.skipped += 1;
                continue;
            }

            match panic::catch_unwind(AssertUnwindSafe(|| listener.call(event))) {
                Ok(Ok(())) => report.delivered += 1,
                Ok(Err(err)) => {
                    report.failed += 1;
                    tracing::warn!(%event, error = %PwaError::from(err), "lifecycle listener failed");
                }
                Err(payload) => {
                    report.failed += 1;
                    tracing::warn!(
                        %event,
                        panic = panic_message(payload.as_ref()),
                        "lifecycle listener panicked"
                    );
                }
            }
        }

        tracing::debug!(
            %event,
            delivered = report.delivered,
            failed = report.failed,
            skipped = report.skipped,
            "lifecycle event dispatched"
        );
        report
    }

    fn is_registered(&self, id: u64) -> bool {
        self.entries.borrow().iter().any(|entry| entry.id == id)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "<non-string panic payload>"
    }
}
