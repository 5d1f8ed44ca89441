//! Pending-restart marker persistence.

use anyhow::Result;
use rebounce_models::PendingRestart;

use crate::define_simple_storage;

/// Fixed slot key: at most one restart is ever awaiting its notice, and a
/// new request overwrites a stale one.
const CURRENT: &str = "current";

define_simple_storage! {
    /// Durable marker slot, surviving the process replacement a restart
    /// causes. Writes commit synchronously before `set` returns.
    pub struct MarkerStorage { table: "pending_restart" }
}

impl MarkerStorage {
    pub fn set(&self, marker: &PendingRestart) -> Result<()> {
        self.put_raw(CURRENT, &serde_json::to_vec(marker)?)
    }

    pub fn get(&self) -> Result<Option<PendingRestart>> {
        match self.get_raw(CURRENT)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Remove the marker. Returns true when one was present.
    pub fn clear(&self) -> Result<bool> {
        self.delete(CURRENT)
    }
}
