use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::protocol::{SystemMetrics, LOCAL_SERVER_ID};

/// Whether a server is the locally hosted instance or a remote agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerKind {
    Local,
    Remote,
}

impl ServerKind {
    /// Classify a server id. The aggregator reserves `"local"` for the
    /// instance hosting the dashboard itself.
    pub fn from_id(id: &str) -> Self {
        if id == LOCAL_SERVER_ID {
            ServerKind::Local
        } else {
            ServerKind::Remote
        }
    }
}

/// Stable identity of a monitored host, rebuilt from every batch that
/// mentions it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerIdentity {
    /// Unique key distinguishing hosts across batches.
    pub id: String,
    pub display_name: String,
    pub kind: ServerKind,
    pub location: Option<String>,
    pub provider: Option<String>,
    pub tag: Option<String>,
    pub version: Option<String>,
}

/// Derived network throughput, bytes per second. Never negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SpeedSample {
    pub rx_per_sec: f64,
    pub tx_per_sec: f64,
}

/// The externally visible per-server unit: identity, latest snapshot,
/// derived speed, and the batch-sourced connectivity flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerState {
    pub identity: ServerIdentity,
    /// `None` when the server produced no data in the latest batch.
    pub snapshot: Option<SystemMetrics>,
    pub speed: SpeedSample,
    /// Online flag as reported by the aggregator for this server. This is
    /// independent of the push channel's own connection state.
    pub connected: bool,
    pub last_error: Option<String>,
    /// Receipt time of the batch this state came from.
    pub updated_at: DateTime<Utc>,
}
