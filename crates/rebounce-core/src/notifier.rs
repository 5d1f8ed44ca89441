//! Restart completion notification.
//!
//! Watches for the managed platform coming back after a restart and delivers
//! the "restart complete" notice recorded in the pending-restart marker.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::error::{CoreError, Result};
use crate::platform::{CompletionSink, ConnectionWatch, MemorySampler};
use rebounce_storage::MarkerStorage;

/// Grace period for the transport to settle after the platform reconnects.
const RECONNECT_GRACE: Duration = Duration::from_secs(10);

pub struct CompletionNotifier {
    markers: MarkerStorage,
    platform_id: String,
    sink: Arc<dyn CompletionSink>,
    watch: Arc<dyn ConnectionWatch>,
    memory: Option<Arc<dyn MemorySampler>>,
    grace: Duration,
}

impl CompletionNotifier {
    pub fn new(
        markers: MarkerStorage,
        platform_id: impl Into<String>,
        sink: Arc<dyn CompletionSink>,
        watch: Arc<dyn ConnectionWatch>,
    ) -> Self {
        Self {
            markers,
            platform_id: platform_id.into(),
            sink,
            watch,
            memory: None,
            grace: RECONNECT_GRACE,
        }
    }

    /// Append a host memory reading to the notice.
    pub fn with_memory(mut self, sampler: Arc<dyn MemorySampler>) -> Self {
        self.memory = Some(sampler);
        self
    }

    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Platform id this notifier answers for.
    pub fn platform_id(&self) -> &str {
        &self.platform_id
    }

    /// Handle a platform (re)connection.
    ///
    /// When a marker is pending for `platform_id`, waits out the reconnect
    /// grace, sends the completion notice, and clears the marker. The marker
    /// is consumed exactly once: a delivery failure is logged, never allowed
    /// to resurrect it, so a broken sink cannot spam the requester on every
    /// later reconnect.
    pub async fn on_platform_connected(&self, platform_id: &str) -> Result<()> {
        if platform_id != self.platform_id {
            debug!(platform_id, "connection from a platform this notifier does not serve");
            return Ok(());
        }

        let Some(marker) = self.markers.get()? else {
            debug!(platform_id, "platform connected with no restart pending");
            return Ok(());
        };

        if marker.platform_id != platform_id {
            info!(
                pending = %marker.platform_id,
                connected = %platform_id,
                "restart pending for a different platform, leaving marker in place"
            );
            return Ok(());
        }

        if let Err(e) = self.wait_for_transport().await {
            warn!(error = %e, "transport not ready in time, sending anyway");
        }

        let elapsed = marker.elapsed_seconds(Utc::now().timestamp_millis());
        let mut text = format!("Restart complete in {elapsed:.2} seconds");
        if let Some(sampler) = &self.memory
            && let Some(reading) = sampler.sample()
        {
            text.push_str(&format!(" | memory {reading}"));
        }

        if marker.origin_session.is_empty() {
            info!("restart had no origin session, skipping the notice");
        } else if let Err(e) = self.sink.send_text(&marker.origin_session, &text).await {
            warn!(error = %e, "failed to deliver the completion notice");
        }

        self.markers.clear()?;
        info!(elapsed_seconds = elapsed, "pending-restart marker cleared");
        Ok(())
    }

    async fn wait_for_transport(&self) -> Result<()> {
        timeout(self.grace, self.watch.wait_ready())
            .await
            .map_err(|_| CoreError::NotificationTimeout(self.grace))
    }
}
