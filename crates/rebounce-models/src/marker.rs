//! Durable pending-restart marker.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Record of a restart awaiting its completion notice.
///
/// Written before the restart request leaves the process and consumed by the
/// notifier once the platform comes back, so it survives the process
/// replacement in between. `umo` and `start_ts` are the persisted field
/// names; the Rust names spell out what they hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingRestart {
    /// Platform the completion notice is addressed through.
    pub platform_id: String,
    /// Opaque routing token for the requester; empty for scheduled restarts.
    #[serde(rename = "umo")]
    pub origin_session: String,
    /// Epoch milliseconds at the moment the restart was requested.
    #[serde(rename = "start_ts")]
    pub requested_at: i64,
}

impl PendingRestart {
    pub fn new(origin_session: impl Into<String>, platform_id: impl Into<String>) -> Self {
        Self {
            platform_id: platform_id.into(),
            origin_session: origin_session.into(),
            requested_at: Utc::now().timestamp_millis(),
        }
    }

    /// Fractional seconds elapsed since the restart was requested.
    /// Clamped at zero so clock skew never reports negative downtime.
    pub fn elapsed_seconds(&self, now_ms: i64) -> f64 {
        (now_ms - self.requested_at).max(0) as f64 / 1000.0
    }
}
