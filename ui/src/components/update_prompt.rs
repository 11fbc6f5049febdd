use dioxus::prelude::*;

use crate::pwa::{LifecycleEvent, Listener, PwaManager};
use crate::t;

#[derive(Clone, Debug, PartialEq)]
enum PromptStatus {
    Hidden,
    Available,
    Activating,
    Failed(String),
}

/// Offers to activate a waiting worker version. A failed activation keeps
/// the prompt open with a retry button.
#[component]
pub fn PwaUpdatePrompt() -> Element {
    let mut status = use_signal(|| PromptStatus::Hidden);

    let listener = use_hook(|| {
        let listener = Listener::infallible(move |event| {
            if event == LifecycleEvent::UpdateAvailable {
                let mut status = status;
                status.set(PromptStatus::Available);
            }
        });
        PwaManager::global().add_event_listener(&listener);
        listener
    });
    use_drop(move || PwaManager::global().remove_event_listener(&listener));

    let activate = move |_| {
        if status() == PromptStatus::Activating {
            return;
        }
        status.set(PromptStatus::Activating);
        spawn(async move {
            match PwaManager::global().activate_update().await {
                // Either the page is reloading or there was nothing to do.
                Ok(()) => status.set(PromptStatus::Hidden),
                Err(err) => {
                    tracing::warn!(error = %err, "update activation failed");
                    status.set(PromptStatus::Failed(err.to_string()));
                }
            }
        });
    };
    let dismiss = move |_| status.set(PromptStatus::Hidden);

    let current = status();
    if current == PromptStatus::Hidden {
        return rsx! {};
    }
    let busy = current == PromptStatus::Activating;
    let failure = match current {
        PromptStatus::Failed(reason) => Some(reason),
        _ => None,
    };
    let action_label = if failure.is_some() {
        t!("pwa-update-retry")
    } else if busy {
        t!("pwa-update-activating")
    } else {
        t!("pwa-update-action")
    };

    rsx! {
        div { class: "pwa-update", role: "alert",
            p { class: "pwa-update__message", {t!("pwa-update-available")} }
            if let Some(reason) = failure {
                p { class: "pwa-update__error", {t!("pwa-update-failed", reason = reason)} }
            }
            div { class: "pwa-update__actions",
                button {
                    class: "pwa-update__action",
                    disabled: busy,
                    onclick: activate,
                    "{action_label}"
                }
                button {
                    class: "pwa-update__dismiss",
                    disabled: busy,
                    onclick: dismiss,
                    {t!("pwa-update-later")}
                }
            }
        }
    }
}
