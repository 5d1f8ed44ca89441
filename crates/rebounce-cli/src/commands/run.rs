//! The long-running rebounce daemon.
//!
//! Hosts the recurring-restart trigger and watches the dashboard so finished
//! restarts get their completion notice.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{info, warn};

use rebounce_core::{AppCore, CompletionNotifier, CompletionSink};

use crate::daemon::{DashboardWatch, LogSink, SystemMemorySampler, TelegramSink};

/// How the reconnect watcher polls the dashboard.
pub struct MonitorConfig {
    pub poll_interval: Duration,
    /// Consecutive up polls with a marker still pending before the restart
    /// counts as finished even though no downtime was observed.
    pub confirm_ticks: u32,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            confirm_ticks: 5,
        }
    }
}

/// Decides, one poll at a time, when the dashboard counts as back up.
pub struct RecoveryMonitor {
    prev_up: bool,
    marker_ticks: u32,
    confirm_ticks: u32,
}

impl RecoveryMonitor {
    pub fn new(confirm_ticks: u32) -> Self {
        Self {
            prev_up: false,
            marker_ticks: 0,
            confirm_ticks,
        }
    }

    /// Feed one observation. Returns true when the pending restart should be
    /// announced.
    pub fn observe(&mut self, reachable: bool, marker_pending: bool) -> bool {
        let came_back = reachable && !self.prev_up;
        self.prev_up = reachable;

        if !reachable || !marker_pending {
            self.marker_ticks = 0;
            return false;
        }

        if came_back {
            self.marker_ticks = 0;
            return true;
        }

        // A quick restart can finish between two polls without the monitor
        // ever seeing the dashboard down. Enough steady up polls with the
        // marker still pending count as a completed restart too.
        self.marker_ticks += 1;
        if self.marker_ticks >= self.confirm_ticks {
            self.marker_ticks = 0;
            return true;
        }
        false
    }
}

pub async fn run(core: AppCore) -> Result<()> {
    let settings = core.storage.settings.load()?;
    core.orchestrator.sync_recurring(&settings).await?;

    let sink: Arc<dyn CompletionSink> = if settings.notify_bot_token.trim().is_empty() {
        Arc::new(LogSink)
    } else {
        Arc::new(TelegramSink::with_token(settings.notify_bot_token.trim()))
    };
    let watch = Arc::new(DashboardWatch::new(core.client.base_url()));

    let mut notifier = CompletionNotifier::new(
        core.storage.marker.clone(),
        &settings.platform_id,
        sink,
        watch.clone(),
    );
    if settings.show_memory_info {
        notifier = notifier.with_memory(Arc::new(SystemMemorySampler::new()));
    }

    println!("rebounce daemon watching {}", core.client.base_url());
    if settings.restart_switch && !settings.trigger.is_none() {
        println!("Recurring restart armed: {}", settings.trigger);
    } else {
        println!("No recurring restart armed.");
    }
    info!("daemon started");

    let config = MonitorConfig::default();
    let mut monitor = RecoveryMonitor::new(config.confirm_ticks);
    let mut poll = tokio::time::interval(config.poll_interval);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("shutdown signal received");
                break;
            }
            _ = poll.tick() => {
                let reachable = watch.reachable().await;
                let marker_pending = match core.storage.marker.get() {
                    Ok(marker) => marker.is_some(),
                    Err(e) => {
                        warn!(error = %e, "failed to read the pending-restart marker");
                        false
                    }
                };
                if monitor.observe(reachable, marker_pending) {
                    let platform_id = notifier.platform_id().to_string();
                    if let Err(e) = notifier.on_platform_connected(&platform_id).await {
                        warn!(error = %e, "completion notification failed");
                    }
                }
            }
        }
    }

    core.orchestrator.shutdown().await?;
    println!("rebounce daemon stopped");
    Ok(())
}
