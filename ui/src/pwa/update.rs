//! Detection and activation of waiting background-worker versions.
//!
//! Every waiting version is announced at most once for the life of the
//! process, however often the host re-reports it or detection is re-run.
//! Activation is a two step swap: ask the waiting worker to skip waiting,
//! then wait (bounded) for the host to confirm a controller change before
//! reloading the page.
//!
//! Detection is best effort. If the worker channel cannot be attached the
//! detector logs once and behaves as if no update ever becomes available.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;
use std::time::Duration;

use futures::future::{self, Either};
use futures_channel::oneshot;

use super::bus::EventBus;
use super::error::{Channel, PwaError, PwaResult};
use super::event::LifecycleEvent;
use super::host::{PwaHost, WorkerSignal, WorkerVersion};
use crate::core::platform;

#[derive(Debug, Default)]
struct UpdateState {
    /// Detected and not yet activated.
    pending: Option<WorkerVersion>,
    /// Every version already announced.
    signaled: HashSet<WorkerVersion>,
}

pub struct UpdateDetector {
    bus: Rc<EventBus>,
    host: Rc<dyn PwaHost>,
    activation_timeout: Duration,
    state: RefCell<UpdateState>,
    /// Completion handle of the activation currently waiting for control.
    waiter: RefCell<Option<oneshot::Sender<()>>>,
    /// Version the page was last reloaded for.
    reloaded: RefCell<Option<WorkerVersion>>,
    unavailable: Cell<bool>,
}

impl UpdateDetector {
    pub fn new(bus: Rc<EventBus>, host: Rc<dyn PwaHost>, activation_timeout: Duration) -> Self {
        Self {
            bus,
            host,
            activation_timeout,
            state: RefCell::new(UpdateState::default()),
            waiter: RefCell::new(None),
            reloaded: RefCell::new(None),
            unavailable: Cell::new(false),
        }
    }

    pub fn pending(&self) -> Option<WorkerVersion> {
        self.state.borrow().pending.clone()
    }

    /// False once the worker channel failed; detection is then permanently off.
    pub fn is_available(&self) -> bool {
        !self.unavailable.get()
    }

    /// Records a waiting worker. Returns `true` (and dispatches
    /// `UpdateAvailable`) only the first time `version` is seen.
    pub fn observe_waiting(&self, version: WorkerVersion) -> bool {
        let fresh = {
            let mut state = self.state.borrow_mut();
            let fresh = state.signaled.insert(version.clone());
            if fresh {
                state.pending = Some(version.clone());
            }
            fresh
        };

        if fresh {
            tracing::info!(%version, "update available");
            self.bus.dispatch(LifecycleEvent::UpdateAvailable);
        } else {
            tracing::debug!(%version, "waiting worker already announced");
        }
        fresh
    }

    /// Re-queries the host for a waiting worker.
    pub fn check_for_update(&self) -> bool {
        if self.unavailable.get() {
            return false;
        }
        match self.host.waiting_worker() {
            Ok(Some(version)) => self.observe_waiting(version),
            Ok(None) => false,
            Err(err) => {
                tracing::warn!(error = %err, "update check failed; assuming no update");
                false
            }
        }
    }

    pub fn handle_signal(&self, signal: WorkerSignal) {
        match signal {
            WorkerSignal::Waiting(version) => {
                self.observe_waiting(version);
            }
            WorkerSignal::ControllerChanged => self.on_controller_changed(),
            WorkerSignal::Unavailable(reason) => {
                self.mark_unavailable(&PwaError::subscription(Channel::Worker, reason));
            }
        }
    }

    /// Hands control to the pending worker and reloads once it confirms.
    ///
    /// Resolves immediately when nothing is pending. On timeout the pending
    /// version is kept so the caller can retry. If the pending worker took
    /// control without us (another tab activated it), the page reloads
    /// without asking the worker again.
    pub async fn activate_update(&self) -> PwaResult<()> {
        let Some(mut version) = self.pending() else {
            tracing::debug!("activation requested with no pending update");
            return Ok(());
        };

        match self.host.waiting_worker() {
            Ok(Some(waiting)) if waiting == version => {}
            Ok(Some(waiting)) => {
                tracing::debug!(stale = %version, %waiting, "pending worker was replaced");
                self.observe_waiting(waiting.clone());
                self.state.borrow_mut().pending = Some(waiting.clone());
                version = waiting;
            }
            Ok(None) => {
                tracing::info!(%version, "pending worker already took control");
                return self.finish_activation(&version);
            }
            Err(err) => {
                tracing::debug!(error = %err, "waiting worker lookup failed; asking pending worker");
            }
        }

        let (done_tx, done_rx) = oneshot::channel();
        if self.waiter.borrow_mut().replace(done_tx).is_some() {
            tracing::debug!("superseding in-flight activation");
        }

        tracing::info!(%version, "activating waiting worker");
        // The host may confirm synchronously, so the waiter is installed first.
        if let Err(err) = self.host.skip_waiting(&version) {
            self.release_waiter(&done_rx);
            tracing::warn!(%version, error = %err, "skip-waiting request failed");
            return Err(err);
        }

        let timeout = Box::pin(platform::sleep(self.activation_timeout));
        match future::select(done_rx, timeout).await {
            Either::Left((Ok(()), _)) => self.finish_activation(&version),
            Either::Left((Err(oneshot::Canceled), _)) => Err(PwaError::ActivationSuperseded),
            Either::Right(((), done_rx)) => {
                self.release_waiter(&done_rx);
                tracing::warn!(
                    %version,
                    waited_ms = u64::try_from(self.activation_timeout.as_millis()).unwrap_or(u64::MAX),
                    "worker did not take control in time"
                );
                Err(PwaError::ActivationTimeout {
                    waited: self.activation_timeout,
                })
            }
        }
    }

    pub(crate) fn attach(self: &Rc<Self>) -> PwaResult<()> {
        let detector = Rc::downgrade(self);
        let attached = self.host.watch_worker(Rc::new(move |signal| {
            if let Some(detector) = detector.upgrade() {
                detector.handle_signal(signal);
            }
        }));

        match attached {
            Ok(()) => {
                self.check_for_update();
                Ok(())
            }
            Err(err) => {
                self.mark_unavailable(&err);
                Err(err)
            }
        }
    }

    fn on_controller_changed(&self) {
        match self.waiter.borrow_mut().take() {
            Some(done) => {
                // A dropped receiver means that activation already gave up.
                let _ = done.send(());
            }
            None => tracing::debug!("controller change without pending activation ignored"),
        }
    }

    fn finish_activation(&self, version: &WorkerVersion) -> PwaResult<()> {
        if self.reloaded.borrow().as_ref() == Some(version) {
            tracing::debug!(%version, "already reloaded for this worker");
            return Ok(());
        }
        if let Err(err) = self.host.reload() {
            tracing::warn!(%version, error = %err, "reload after activation failed");
            return Err(err);
        }
        *self.reloaded.borrow_mut() = Some(version.clone());

        let mut state = self.state.borrow_mut();
        if state.pending.as_ref() == Some(version) {
            state.pending = None;
        }
        tracing::info!(%version, "worker took control; reloading");
        Ok(())
    }

    /// Drops the stored waiter if it still belongs to `done_rx`.
    fn release_waiter(&self, done_rx: &oneshot::Receiver<()>) {
        let mut waiter = self.waiter.borrow_mut();
        if waiter
            .as_ref()
            .is_some_and(|done_tx| done_tx.is_connected_to(done_rx))
        {
            waiter.take();
        }
    }

    fn mark_unavailable(&self, err: &PwaError) {
        if !self.unavailable.replace(true) {
            tracing::warn!(error = %err, "update detection disabled");
        }
    }
}
