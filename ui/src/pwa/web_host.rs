//! Browser implementation of [`PwaHost`] over `web-sys`.
//!
//! Closures handed to the DOM are leaked with `forget`: the subscriptions
//! last for the whole page lifetime, same as the manager.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    Event, RegistrationOptions, ServiceWorker, ServiceWorkerContainer, ServiceWorkerRegistration,
    ServiceWorkerState, Window,
};

use super::config::PwaConfig;
use super::error::{Channel, PwaError, PwaResult};
use super::event::LifecycleEvent;
use super::host::{ConnectivitySink, PwaHost, WorkerSignal, WorkerSink, WorkerVersion};
use crate::core::platform;

/// Message understood by the worker script as "activate now".
const SKIP_WAITING_MESSAGE: &str = "SKIP_WAITING";

pub struct WebHost {
    this: Weak<WebHost>,
    script_url: String,
    scope: String,
    registration: RefCell<Option<ServiceWorkerRegistration>>,
    /// Worker objects seen so far with the generation assigned to each.
    known_workers: RefCell<Vec<(ServiceWorker, u64)>>,
    next_generation: Cell<u64>,
}

impl WebHost {
    pub fn new(config: &PwaConfig) -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            this: this.clone(),
            script_url: config.worker_script_url.clone(),
            scope: config.worker_scope.clone(),
            registration: RefCell::new(None),
            known_workers: RefCell::new(Vec::new()),
            next_generation: Cell::new(1),
        })
    }

    fn version_of(&self, worker: &ServiceWorker) -> WorkerVersion {
        let mut known = self.known_workers.borrow_mut();
        let generation = match known
            .iter()
            .find(|(seen, _)| js_sys::Object::is(seen.as_ref(), worker.as_ref()))
        {
            Some((_, generation)) => *generation,
            None => {
                let generation = self.next_generation.get();
                self.next_generation.set(generation + 1);
                known.push((worker.clone(), generation));
                generation
            }
        };
        WorkerVersion::new(worker.script_url(), generation)
    }

    fn worker_for(&self, version: &WorkerVersion) -> Option<ServiceWorker> {
        self.known_workers
            .borrow()
            .iter()
            .find(|(_, generation)| *generation == version.generation)
            .map(|(worker, _)| worker.clone())
    }

    /// A waiting worker only counts as an update when some version already
    /// controls the page; otherwise it is the first install.
    fn has_controller(&self) -> bool {
        container().is_some_and(|container| container.controller().is_some())
    }

    fn track_registration(&self, registration: ServiceWorkerRegistration, sink: WorkerSink) {
        if let Some(waiting) = registration.waiting() {
            if self.has_controller() {
                sink(WorkerSignal::Waiting(self.version_of(&waiting)));
            }
        }

        let this = self.this.clone();
        let watched = registration.clone();
        let on_update_found: Closure<dyn Fn()> = Closure::new(move || {
            let Some(installing) = watched.installing() else {
                return;
            };
            let this = this.clone();
            let sink = sink.clone();
            let worker = installing.clone();
            let on_state_change: Closure<dyn Fn()> = Closure::new(move || {
                if worker.state() != ServiceWorkerState::Installed {
                    return;
                }
                if let Some(host) = this.upgrade() {
                    if host.has_controller() {
                        sink(WorkerSignal::Waiting(host.version_of(&worker)));
                    }
                }
            });
            installing.set_onstatechange(Some(on_state_change.as_ref().unchecked_ref()));
            on_state_change.forget();
        });
        registration.set_onupdatefound(Some(on_update_found.as_ref().unchecked_ref()));
        on_update_found.forget();

        *self.registration.borrow_mut() = Some(registration);
    }
}

impl PwaHost for WebHost {
    fn is_online(&self) -> bool {
        platform::is_online()
    }

    fn watch_connectivity(&self, sink: ConnectivitySink) -> PwaResult<()> {
        let window = window(Channel::Connectivity)?;
        for name in ["online", "offline"] {
            let sink = sink.clone();
            let callback: Closure<dyn Fn(Event)> = Closure::new(move |event: Event| {
                match LifecycleEvent::from_host_name(&event.type_()) {
                    Some(LifecycleEvent::Online) => sink(true),
                    Some(LifecycleEvent::Offline) => sink(false),
                    _ => tracing::debug!(kind = %event.type_(), "ignored host event"),
                }
            });
            window
                .add_event_listener_with_callback(name, callback.as_ref().unchecked_ref())
                .map_err(|err| {
                    PwaError::subscription(Channel::Connectivity, PwaError::from(err).to_string())
                })?;
            callback.forget();
        }
        Ok(())
    }

    fn watch_worker(&self, sink: WorkerSink) -> PwaResult<()> {
        let window = window(Channel::Worker)?;
        let navigator = window.navigator();
        let supported = js_sys::Reflect::has(&navigator, &JsValue::from_str("serviceWorker"))
            .unwrap_or(false);
        if !supported {
            return Err(PwaError::subscription(
                Channel::Worker,
                "service workers are not supported in this context",
            ));
        }
        let container = navigator.service_worker();

        let on_change_sink = sink.clone();
        let on_controller_change: Closure<dyn Fn()> =
            Closure::new(move || on_change_sink(WorkerSignal::ControllerChanged));
        container.set_oncontrollerchange(Some(on_controller_change.as_ref().unchecked_ref()));
        on_controller_change.forget();

        let options = RegistrationOptions::new();
        options.set_scope(&self.scope);
        let registering = container.register_with_options(&self.script_url, &options);

        let this = self.this.clone();
        platform::spawn_future(async move {
            let registered = JsFuture::from(registering)
                .await
                .and_then(|value| value.dyn_into::<ServiceWorkerRegistration>());
            match registered {
                Ok(registration) => {
                    if let Some(host) = this.upgrade() {
                        tracing::debug!(scope = %registration.scope(), "worker registered");
                        host.track_registration(registration, sink);
                    }
                }
                Err(err) => sink(WorkerSignal::Unavailable(PwaError::from(err).to_string())),
            }
        });
        Ok(())
    }

    fn waiting_worker(&self) -> PwaResult<Option<WorkerVersion>> {
        let waiting = self
            .registration
            .borrow()
            .as_ref()
            .and_then(ServiceWorkerRegistration::waiting);
        Ok(waiting
            .filter(|_| self.has_controller())
            .map(|worker| self.version_of(&worker)))
    }

    fn skip_waiting(&self, worker: &WorkerVersion) -> PwaResult<()> {
        let target = self
            .worker_for(worker)
            .ok_or_else(|| PwaError::Host(format!("unknown worker {worker}")))?;
        let message = js_sys::Object::new();
        js_sys::Reflect::set(
            &message,
            &JsValue::from_str("type"),
            &JsValue::from_str(SKIP_WAITING_MESSAGE),
        )?;
        target.post_message(&message)?;
        Ok(())
    }

    fn reload(&self) -> PwaResult<()> {
        let window = web_sys::window().ok_or_else(|| PwaError::Host("no window object".into()))?;
        window.location().reload()?;
        Ok(())
    }
}

fn window(channel: Channel) -> PwaResult<Window> {
    web_sys::window().ok_or_else(|| PwaError::subscription(channel, "no window object"))
}

fn container() -> Option<ServiceWorkerContainer> {
    let navigator = web_sys::window()?.navigator();
    js_sys::Reflect::has(&navigator, &JsValue::from_str("serviceWorker"))
        .unwrap_or(false)
        .then(|| navigator.service_worker())
}
