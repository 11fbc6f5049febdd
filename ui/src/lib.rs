//! Shared UI crate for Pinreel. The PWA lifecycle core and the components
//! consuming it live here; platform crates only launch the app.

pub mod core;
pub mod i18n;
pub mod pwa;

#[cfg(any(test, feature = "test-host"))]
pub mod testing;

pub mod components {
    // Offline banner (components/network_status.rs)
    pub mod network_status;
    pub use network_status::PwaNetworkStatus;

    // Waiting-worker prompt (components/update_prompt.rs)
    pub mod update_prompt;
    pub use update_prompt::PwaUpdatePrompt;
}
