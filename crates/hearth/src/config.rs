//! Server configuration.

use std::time::Duration;

use serde::Deserialize;

/// Network and scheduling settings for a [`HearthServer`](crate::HearthServer).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the WebSocket listener binds to.
    pub bind_addr: String,

    /// Seconds between autosave passes over every online player.
    pub autosave_interval_secs: u64,

    /// A connection that sends nothing for this long is dropped. Clients
    /// heartbeat well inside this window.
    pub idle_timeout_secs: u64,

    /// How long a fresh connection has to send its `Login`.
    pub login_timeout_secs: u64,
}

impl ServerConfig {
    pub fn autosave_interval(&self) -> Duration {
        Duration::from_secs(self.autosave_interval_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn login_timeout(&self) -> Duration {
        Duration::from_secs(self.login_timeout_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            autosave_interval_secs: 60,
            idle_timeout_secs: 15,
            login_timeout_secs: 5,
        }
    }
}
