//! Server state store.
//!
//! Holds the visible per-server collection. The synchronization engine is
//! the single writer and replaces the whole collection per batch; readers
//! never observe a half-updated view.

mod state;


pub use state::*;

use std::sync::RwLock;

/// Addressable collection of the latest [`ServerState`] per monitored host.
///
/// The collection always reflects exactly the membership of the latest
/// fully-decoded batch: ids absent from that batch are dropped, not carried
/// forward as stale entries. Iteration order is arrival order within the
/// batch.
pub struct FleetStore {
    states: RwLock<Vec<ServerState>>,
}

impl FleetStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            states: RwLock::new(Vec::new()),
        }
    }

    /// Swap the entire visible collection under one write lock.
    ///
    /// Duplicate ids within `new_states` collapse to the last occurrence,
    /// keeping the first occurrence's position, so the "one state per id"
    /// invariant holds even against a misbehaving aggregator.
    pub fn replace_all(&self, new_states: Vec<ServerState>) {
        let mut deduped: Vec<ServerState> = Vec::with_capacity(new_states.len());
        for state in new_states {
            match deduped.iter_mut().find(|s| s.identity.id == state.identity.id) {
                Some(existing) => *existing = state,
                None => deduped.push(state),
            }
        }

        let mut states = self.states.write().unwrap();
        *states = deduped;
    }

    /// Look up a server by id. Absence is not an error.
    pub fn get(&self, id: &str) -> Option<ServerState> {
        self.states
            .read()
            .unwrap()
            .iter()
            .find(|s| s.identity.id == id)
            .cloned()
    }

    /// All current states, in arrival order.
    pub fn all(&self) -> Vec<ServerState> {
        self.states.read().unwrap().clone()
    }

    /// Number of servers in the current collection.
    pub fn len(&self) -> usize {
        self.states.read().unwrap().len()
    }

    /// True when no batch has populated the store yet (or the latest batch
    /// was empty).
    pub fn is_empty(&self) -> bool {
        self.states.read().unwrap().is_empty()
    }
}

impl Default for FleetStore {
    fn default() -> Self {
        Self::new()
    }
}
