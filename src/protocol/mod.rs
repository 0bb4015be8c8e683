//! Wire contract for the aggregator push channel.
//!
//! The aggregator pushes JSON text frames. Only `"metrics"` batches update
//! server state; any batch may carry a `site_settings` payload. Decoding is
//! strict: a frame that does not match these shapes is dropped by the
//! channel manager, it never reaches the engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reserved server id for the locally hosted instance.
pub const LOCAL_SERVER_ID: &str = "local";

/// Discriminator value for batches that update server state.
pub const METRICS_BATCH: &str = "metrics";

/// One decoded inbound message: zero or more per-server updates plus an
/// optional settings payload.
///
/// `servers` is `Option` rather than defaulting to an empty list: the
/// aggregator omits the field entirely on non-metrics messages, and a
/// `"metrics"` frame without it carries no server state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servers: Option<Vec<ServerUpdate>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_settings: Option<SiteSettings>,
}

impl Batch {
    /// Decode a raw text frame. Shape mismatches fail closed.
    pub fn decode(frame: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(frame)
    }

    /// True when this batch updates server state.
    pub fn is_metrics(&self) -> bool {
        self.kind == METRICS_BATCH && self.servers.is_some()
    }
}

/// Per-server update record within a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerUpdate {
    pub server_id: String,
    pub server_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub online: bool,
    /// `null` when the server produced no data this tick.
    #[serde(default)]
    pub metrics: Option<SystemMetrics>,
}

/// Point-in-time measurement bundle for one server.
///
/// The engine interprets only `network`; the remaining gauges pass through
/// untouched for presentation. Gauge groups are defaulted so a minimal
/// `{"network": {...}}` object decodes, but a snapshot without `network`
/// fails the whole frame.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SystemMetrics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub hostname: String,
    #[serde(default)]
    pub os: OsInfo,
    #[serde(default)]
    pub cpu: CpuMetrics,
    #[serde(default)]
    pub memory: MemoryMetrics,
    #[serde(default)]
    pub disks: Vec<DiskMetrics>,
    pub network: NetworkCounters,
    #[serde(default)]
    pub uptime: u64,
    #[serde(default)]
    pub load_average: LoadAverage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OsInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub kernel: String,
    #[serde(default)]
    pub arch: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CpuMetrics {
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub cores: u32,
    /// Average usage across cores, percent.
    #[serde(default)]
    pub usage: f32,
    /// Frequency in MHz.
    #[serde(default)]
    pub frequency: u64,
    #[serde(default)]
    pub per_core: Vec<f32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryMetrics {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub used: u64,
    #[serde(default)]
    pub available: u64,
    #[serde(default)]
    pub swap_total: u64,
    #[serde(default)]
    pub swap_used: u64,
    #[serde(default)]
    pub usage_percent: f32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiskMetrics {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub used: u64,
    #[serde(default)]
    pub usage_percent: f32,
    #[serde(default)]
    pub mount_points: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoadAverage {
    #[serde(default)]
    pub one: f64,
    #[serde(default)]
    pub five: f64,
    #[serde(default)]
    pub fifteen: f64,
}

/// Cumulative traffic counters, with optional aggregator-precomputed rates.
///
/// `rx_speed`/`tx_speed` are authoritative only when both are present; a
/// single direction on its own falls back to client-side derivation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkCounters {
    /// Cumulative received bytes since server boot.
    pub total_rx: u64,
    /// Cumulative transmitted bytes since server boot.
    pub total_tx: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rx_speed: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_speed: Option<u64>,
}

/// Opaque pass-through site configuration. Stored last-write-wins and
/// exposed unchanged; the engine never validates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteSettings {
    pub site_name: String,
    pub site_description: String,
    pub social_links: Vec<serde_json::Value>,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            site_name: "Vigil Dashboard".to_string(),
            site_description: "Real-time Server Monitoring".to_string(),
            social_links: Vec::new(),
        }
    }
}
