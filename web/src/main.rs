use std::rc::Rc;

use dioxus::prelude::*;

use ui::components::{PwaNetworkStatus, PwaUpdatePrompt};
use ui::pwa::{PwaConfig, PwaManager};
use ui::i18n;

const MAIN_CSS: Asset = asset!("/assets/main.css");

/// Worker settings shipped with the bundle.
const PWA_CONFIG: &str = include_str!("../pwa.json");

fn main() {
    #[cfg(target_arch = "wasm32")]
    {
        console_error_panic_hook::set_once();
        tracing_wasm::set_as_global_default();
    }

    dioxus::launch(App);
}

fn load_config() -> PwaConfig {
    PwaConfig::from_json(PWA_CONFIG).unwrap_or_else(|err| {
        tracing::warn!(error = %err, "invalid bundled pwa.json; using defaults");
        PwaConfig::default()
    })
}

#[cfg(target_arch = "wasm32")]
fn install_pwa() -> Rc<PwaManager> {
    let config = load_config();
    PwaManager::install(ui::pwa::WebHost::new(&config), &config)
}

#[cfg(not(target_arch = "wasm32"))]
fn install_pwa() -> Rc<PwaManager> {
    let config = load_config();
    PwaManager::install(Rc::new(ui::pwa::DetachedHost), &config)
}

#[component]
fn App() -> Element {
    use_hook(|| {
        i18n::init();
        install_pwa();
    });

    rsx! {
        // Global app resources
        document::Link { rel: "stylesheet", href: MAIN_CSS }
        document::Link { rel: "manifest", href: "/manifest.webmanifest" }

        PwaNetworkStatus {}
        PwaUpdatePrompt {}

        main { class: "app-shell",
            h1 { class: "app-shell__brand", "Pinreel" }
        }
    }
}
