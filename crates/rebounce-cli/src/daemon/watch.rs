//! Dashboard reachability probing.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tokio::time::sleep;

use rebounce_core::ConnectionWatch;

/// Timeout for a single probe (seconds).
const PROBE_TIMEOUT_SECS: u64 = 2;
/// Delay between probes while waiting for the dashboard to come back.
const PROBE_INTERVAL_MS: u64 = 500;

pub struct DashboardWatch {
    client: Client,
    base_url: String,
}

impl DashboardWatch {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    /// One probe. Any HTTP answer counts as up, an auth rejection included;
    /// only a connection-level failure means the dashboard is down.
    pub async fn reachable(&self) -> bool {
        self.client
            .get(&self.base_url)
            .timeout(Duration::from_secs(PROBE_TIMEOUT_SECS))
            .send()
            .await
            .is_ok()
    }
}

#[async_trait]
impl ConnectionWatch for DashboardWatch {
    async fn wait_ready(&self) {
        loop {
            if self.reachable().await {
                return;
            }
            sleep(Duration::from_millis(PROBE_INTERVAL_MS)).await;
        }
    }
}
