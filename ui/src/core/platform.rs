//! Platform detection and async helpers.

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Web,
    Desktop,
    Mobile,
    Unknown,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_arch = "wasm32") {
            Self::Web
        } else if cfg!(any(target_os = "android", target_os = "ios")) {
            Self::Mobile
        } else if cfg!(any(target_os = "linux", target_os = "macos", target_os = "windows")) {
            Self::Desktop
        } else {
            Self::Unknown
        }
    }
}

pub fn platform_string() -> String {
    match Platform::current() {
        Platform::Web => "web",
        Platform::Desktop => "desktop",
        Platform::Mobile => "mobile",
        Platform::Unknown => "unknown",
    }
    .to_string()
}

/// Connectivity flag as the runtime reports it right now.
#[cfg(target_arch = "wasm32")]
pub fn is_online() -> bool {
    web_sys::window()
        .map(|window| window.navigator().on_line())
        .unwrap_or(true)
}

#[cfg(not(target_arch = "wasm32"))]
pub fn is_online() -> bool {
    true
}

#[cfg(target_arch = "wasm32")]
pub fn spawn_future<F>(future: F)
where
    F: std::future::Future<Output = ()> + 'static,
{
    wasm_bindgen_futures::spawn_local(future);
}

#[cfg(target_arch = "wasm32")]
pub async fn sleep(duration: Duration) {
    let millis = u32::try_from(duration.as_millis()).unwrap_or(u32::MAX);
    gloo_timers::future::TimeoutFuture::new(millis).await;
}

/// Requires a Tokio runtime with the time driver enabled.
#[cfg(not(target_arch = "wasm32"))]
pub async fn sleep(duration: Duration) {
    tokio::time::sleep(duration).await;
}
