use dioxus::prelude::*;

use crate::core::platform;
use crate::pwa::{LifecycleEvent, Listener, PwaManager};
use crate::t;

/// Offline banner. Hidden while the host reports connectivity.
#[component]
pub fn PwaNetworkStatus() -> Element {
    let online = use_signal(platform::is_online);

    let listener = use_hook(|| {
        let listener = Listener::infallible(move |event| {
            let mut online = online;
            match event {
                LifecycleEvent::Online => online.set(true),
                LifecycleEvent::Offline => online.set(false),
                LifecycleEvent::UpdateAvailable => {}
            }
        });
        PwaManager::global().add_event_listener(&listener);
        listener
    });
    use_drop(move || PwaManager::global().remove_event_listener(&listener));

    rsx! {
        if !online() {
            div { class: "pwa-status pwa-status--offline", role: "status",
                span { class: "pwa-status__title", {t!("pwa-offline-title")} }
                span { class: "pwa-status__detail", {t!("pwa-offline-detail")} }
            }
        }
    }
}
