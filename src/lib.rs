//! Vigil - Real-time server fleet dashboard client
//!
//! This library provides the live metrics synchronization engine behind the
//! Vigil dashboard: it owns the push connection to a backend aggregator,
//! normalizes heterogeneous per-server updates into a stable client-side
//! model, derives network throughput from cumulative counters, and recovers
//! transparently from connection loss.
//!
//! The pieces compose as a pipeline:
//!
//! - [`channel::ChannelManager`] owns exactly one WebSocket connection and
//!   forwards strictly-decoded [`protocol::Batch`]es into a queue,
//!   reconnecting on a fixed delay after any failure;
//! - [`engine::SyncEngine`] drains the queue one batch at a time, deriving
//!   per-server speeds and replacing the visible collection wholesale;
//! - [`store::FleetStore`] holds the latest per-server states for
//!   presentation layers to read.

pub mod channel;
pub mod cli;
pub mod config;
pub mod engine;
pub mod logging;
pub mod protocol;
pub mod store;
