//! Lifecycle events delivered to UI listeners.

/// The only event kinds the core ever dispatches. Carries no payload;
/// listeners needing more detail query the host themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    Online,
    Offline,
    UpdateAvailable,
}

impl LifecycleEvent {
    /// Maps a host event name onto a lifecycle event. Anything outside the
    /// three known kinds is rejected.
    pub fn from_host_name(name: &str) -> Option<Self> {
        match name {
            "online" => Some(Self::Online),
            "offline" => Some(Self::Offline),
            "updateavailable" => Some(Self::UpdateAvailable),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
            Self::UpdateAvailable => "updateavailable",
        }
    }

    /// Connectivity event for a host online flag.
    pub fn for_connectivity(online: bool) -> Self {
        if online {
            Self::Online
        } else {
            Self::Offline
        }
    }
}

impl std::fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
