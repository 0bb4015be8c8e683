//! Push channel connection configuration

use serde::{Deserialize, Serialize};

/// Connection settings for the aggregator push channel.
///
/// The WebSocket endpoint is derived from `origin` and `path`; see
/// [`crate::channel::ws_endpoint`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// HTTP(S) origin of the aggregator. Secure origins upgrade to wss.
    pub origin: String,
    /// Channel path on the origin.
    pub path: String,
    /// Fixed delay between reconnection attempts. No backoff, no cap;
    /// reconnection is unconditional until shutdown.
    pub reconnect_delay_seconds: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            origin: "http://127.0.0.1:8080".to_string(),
            path: "/ws".to_string(),
            reconnect_delay_seconds: 3,
        }
    }
}
