//! Live metrics synchronization engine.
//!
//! Normalizes heterogeneous per-server updates into the stable client-side
//! model held by the [`FleetStore`](crate::store::FleetStore): decodes
//! batches from the push channel, derives network throughput from cumulative
//! counters where the aggregator does not pre-compute it, and tracks the
//! one-way readiness flag that distinguishes "no data yet" from "refreshing
//! existing data".

pub mod rate;


use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Instant;

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::protocol::{Batch, NetworkCounters, ServerUpdate, SiteSettings};
use crate::store::{FleetStore, ServerIdentity, ServerKind, ServerState, SpeedSample};

/// One-way engine readiness: `Loading` until the first metrics batch has
/// been processed, `Ready` forever after. Reconnects never revert it, so
/// consumers can keep showing the last good view across transient
/// disconnects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Readiness {
    Loading,
    Ready,
}

/// Counter sample carried forward between batches, kept only long enough to
/// derive the next [`SpeedSample`] for its server.
#[derive(Debug, Clone, Copy)]
struct CounterSample {
    total_rx: u64,
    total_tx: u64,
    received_at: Instant,
}

/// The orchestrator of the sync pipeline. Single writer for both the
/// previous-sample map and the visible collection; callers must serialize
/// `ingest` invocations, which [`SyncEngine::start`] does by draining a
/// single-consumer queue.
pub struct SyncEngine {
    store: Arc<FleetStore>,
    /// Previous counter sample per server id. Entries for ids absent from
    /// the latest batch are retained so a reappearing server still gets a
    /// derived rate.
    previous: DashMap<String, CounterSample>,
    ready: AtomicBool,
    settings: RwLock<SiteSettings>,
}

impl SyncEngine {
    /// Create an engine writing into `store`.
    pub fn new(store: Arc<FleetStore>) -> Self {
        Self {
            store,
            previous: DashMap::new(),
            ready: AtomicBool::new(false),
            settings: RwLock::new(SiteSettings::default()),
        }
    }

    /// Current readiness.
    pub fn readiness(&self) -> Readiness {
        if self.ready.load(Ordering::SeqCst) {
            Readiness::Ready
        } else {
            Readiness::Loading
        }
    }

    /// Most recently received site settings (or the defaults).
    pub fn site_settings(&self) -> SiteSettings {
        self.settings.read().unwrap().clone()
    }

    /// The store this engine writes into.
    pub fn store(&self) -> &Arc<FleetStore> {
        &self.store
    }

    /// Process one decoded batch to completion, stamped with the current
    /// time.
    pub fn ingest(&self, batch: Batch) {
        self.ingest_at(batch, Instant::now());
    }

    /// Process one decoded batch using `now` as the receipt time. Split out
    /// from [`SyncEngine::ingest`] so elapsed-time behavior is testable.
    pub fn ingest_at(&self, batch: Batch, now: Instant) {
        if let Some(ref settings) = batch.site_settings {
            tracing::debug!(site_name = %settings.site_name, "site settings updated");
            *self.settings.write().unwrap() = settings.clone();
        }

        if !batch.is_metrics() {
            tracing::debug!(kind = %batch.kind, "ignoring non-metrics batch");
            return;
        }

        let updates = batch.servers.unwrap_or_default();
        let received_at = Utc::now();
        let states: Vec<ServerState> = updates
            .into_iter()
            .map(|update| {
                let speed = match update.metrics.as_ref() {
                    Some(metrics) => self.compute_speed(&update.server_id, &metrics.network, now),
                    None => SpeedSample::default(),
                };

                if let Some(metrics) = update.metrics.as_ref() {
                    self.previous.insert(
                        update.server_id.clone(),
                        CounterSample {
                            total_rx: metrics.network.total_rx,
                            total_tx: metrics.network.total_tx,
                            received_at: now,
                        },
                    );
                }

                build_state(update, speed, received_at)
            })
            .collect();

        let server_count = states.len();
        self.store.replace_all(states);

        if !self.ready.swap(true, Ordering::SeqCst) {
            tracing::info!(servers = server_count, "first metrics batch processed");
        } else {
            tracing::trace!(servers = server_count, "metrics batch processed");
        }
    }

    /// Derive the speed sample for one server.
    ///
    /// Aggregator-supplied rates win when both directions are present;
    /// otherwise the rate is estimated against the previous counter sample,
    /// and a missing sample or non-positive elapsed time yields zero.
    fn compute_speed(&self, server_id: &str, counters: &NetworkCounters, now: Instant) -> SpeedSample {
        if let (Some(rx), Some(tx)) = (counters.rx_speed, counters.tx_speed) {
            return SpeedSample {
                rx_per_sec: rx as f64,
                tx_per_sec: tx as f64,
            };
        }

        match self.previous.get(server_id) {
            Some(prev) => {
                let elapsed = now.saturating_duration_since(prev.received_at).as_secs_f64();
                SpeedSample {
                    rx_per_sec: rate::estimate(prev.total_rx, counters.total_rx, elapsed),
                    tx_per_sec: rate::estimate(prev.total_tx, counters.total_tx, elapsed),
                }
            }
            None => SpeedSample::default(),
        }
    }

    /// Start the engine's consumer task: drains the single-consumer queue,
    /// processing batches one at a time to completion.
    /// Returns a JoinHandle that resolves when the engine stops.
    pub fn start(
        self: Arc<Self>,
        mut batches: mpsc::Receiver<Batch>,
        cancel_token: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            tracing::info!("sync engine started");
            loop {
                tokio::select! {
                    _ = cancel_token.cancelled() => {
                        tracing::info!("sync engine shutting down");
                        break;
                    }
                    batch = batches.recv() => match batch {
                        Some(batch) => self.ingest(batch),
                        None => {
                            tracing::info!("batch queue closed, sync engine stopping");
                            break;
                        }
                    }
                }
            }
        })
    }
}

fn build_state(
    update: ServerUpdate,
    speed: SpeedSample,
    received_at: chrono::DateTime<Utc>,
) -> ServerState {
    let snapshot_version = update.metrics.as_ref().and_then(|m| m.version.clone());
    let identity = ServerIdentity {
        kind: ServerKind::from_id(&update.server_id),
        id: update.server_id,
        display_name: update.server_name,
        location: update.location,
        provider: update.provider,
        tag: update.tag,
        version: update.version.or(snapshot_version),
    };

    ServerState {
        identity,
        snapshot: update.metrics,
        speed,
        connected: update.online,
        last_error: None,
        updated_at: received_at,
    }
}
