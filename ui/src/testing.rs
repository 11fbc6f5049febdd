//! In-memory [`PwaHost`] whose notifications are driven by the test.

use std::cell::{Cell, RefCell};

use crate::pwa::{
    Channel, ConnectivitySink, PwaError, PwaHost, PwaResult, WorkerSignal, WorkerSink,
    WorkerVersion,
};

pub struct ScriptedHost {
    online: Cell<bool>,
    connectivity: RefCell<Option<ConnectivitySink>>,
    worker: RefCell<Option<WorkerSink>>,
    waiting: RefCell<Option<WorkerVersion>>,
    next_generation: Cell<u64>,
    failing_channels: RefCell<Vec<Channel>>,
    confirm_on_skip: Cell<bool>,
    fail_skip_waiting: Cell<bool>,
    skip_requests: RefCell<Vec<WorkerVersion>>,
    reloads: Cell<usize>,
}

impl Default for ScriptedHost {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedHost {
    /// Starts online with no waiting worker.
    pub fn new() -> Self {
        Self {
            online: Cell::new(true),
            connectivity: RefCell::new(None),
            worker: RefCell::new(None),
            waiting: RefCell::new(None),
            next_generation: Cell::new(1),
            failing_channels: RefCell::new(Vec::new()),
            confirm_on_skip: Cell::new(false),
            fail_skip_waiting: Cell::new(false),
            skip_requests: RefCell::new(Vec::new()),
            reloads: Cell::new(0),
        }
    }

    pub fn starting_offline() -> Self {
        let host = Self::new();
        host.online.set(false);
        host
    }

    /// Makes the next `watch_*` call for `channel` fail.
    pub fn fail_channel(&self, channel: Channel) {
        self.failing_channels.borrow_mut().push(channel);
    }

    /// Updates the flag and delivers a connectivity notification, even when
    /// the flag did not change.
    pub fn set_online(&self, online: bool) {
        self.online.set(online);
        let sink = self.connectivity.borrow().clone();
        if let Some(sink) = sink {
            sink(online);
        }
    }

    /// Installs a fresh waiting worker without notifying anyone.
    pub fn stage_waiting(&self, script_url: &str) -> WorkerVersion {
        let generation = self.next_generation.get();
        self.next_generation.set(generation + 1);
        let version = WorkerVersion::new(script_url, generation);
        *self.waiting.borrow_mut() = Some(version.clone());
        version
    }

    /// Installs a fresh waiting worker and announces it.
    pub fn publish_waiting(&self, script_url: &str) -> WorkerVersion {
        let version = self.stage_waiting(script_url);
        self.deliver(WorkerSignal::Waiting(version.clone()));
        version
    }

    /// Announces the current waiting worker again.
    pub fn redeliver_waiting(&self) {
        let waiting = self.waiting.borrow().clone();
        if let Some(version) = waiting {
            self.deliver(WorkerSignal::Waiting(version));
        }
    }

    /// The waiting worker takes control.
    pub fn confirm_control(&self) {
        self.waiting.borrow_mut().take();
        self.deliver(WorkerSignal::ControllerChanged);
    }

    pub fn report_unavailable(&self, reason: &str) {
        self.deliver(WorkerSignal::Unavailable(reason.to_string()));
    }

    /// Confirm control synchronously from inside `skip_waiting`.
    pub fn confirm_on_skip(&self, confirm: bool) {
        self.confirm_on_skip.set(confirm);
    }

    pub fn fail_skip_waiting(&self, fail: bool) {
        self.fail_skip_waiting.set(fail);
    }

    pub fn skip_requests(&self) -> Vec<WorkerVersion> {
        self.skip_requests.borrow().clone()
    }

    pub fn reload_count(&self) -> usize {
        self.reloads.get()
    }

    fn deliver(&self, signal: WorkerSignal) {
        let sink = self.worker.borrow().clone();
        if let Some(sink) = sink {
            sink(signal);
        }
    }

    fn take_failure(&self, channel: Channel) -> PwaResult<()> {
        let mut failing = self.failing_channels.borrow_mut();
        match failing.iter().position(|c| *c == channel) {
            Some(index) => {
                failing.remove(index);
                Err(PwaError::subscription(channel, "scripted failure"))
            }
            None => Ok(()),
        }
    }
}

impl PwaHost for ScriptedHost {
    fn is_online(&self) -> bool {
        self.online.get()
    }

    fn watch_connectivity(&self, sink: ConnectivitySink) -> PwaResult<()> {
        self.take_failure(Channel::Connectivity)?;
        *self.connectivity.borrow_mut() = Some(sink);
        Ok(())
    }

    fn watch_worker(&self, sink: WorkerSink) -> PwaResult<()> {
        self.take_failure(Channel::Worker)?;
        *self.worker.borrow_mut() = Some(sink);
        Ok(())
    }

    fn waiting_worker(&self) -> PwaResult<Option<WorkerVersion>> {
        Ok(self.waiting.borrow().clone())
    }

    fn skip_waiting(&self, worker: &WorkerVersion) -> PwaResult<()> {
        if self.fail_skip_waiting.get() {
            return Err(PwaError::Host("scripted skip-waiting failure".into()));
        }
        self.skip_requests.borrow_mut().push(worker.clone());
        if self.confirm_on_skip.get() {
            self.confirm_control();
        }
        Ok(())
    }

    fn reload(&self) -> PwaResult<()> {
        self.reloads.set(self.reloads.get() + 1);
        Ok(())
    }
}
