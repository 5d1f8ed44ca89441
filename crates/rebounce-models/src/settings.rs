//! Persisted application settings.

use serde::{Deserialize, Serialize};

use crate::trigger::{Trigger, TriggerError};

const DEFAULT_DASHBOARD_HOST: &str = "127.0.0.1";
const DEFAULT_DASHBOARD_PORT: u16 = 6185;

/// Environment variable overriding the configured dashboard port.
pub const DASHBOARD_PORT_ENV: &str = "DASHBOARD_PORT";

/// Where the managed service's dashboard listens and how to log in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_DASHBOARD_HOST.to_string(),
            port: DEFAULT_DASHBOARD_PORT,
            username: String::new(),
            password: String::new(),
        }
    }
}

impl DashboardSettings {
    /// A stored bind-all address is not connectable; dial loopback instead.
    pub fn effective_host(&self) -> &str {
        if self.host == "0.0.0.0" {
            "127.0.0.1"
        } else {
            &self.host
        }
    }

    /// Stored port, unless `DASHBOARD_PORT` holds a valid override.
    pub fn effective_port(&self) -> u16 {
        std::env::var(DASHBOARD_PORT_ENV)
            .ok()
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(self.port)
    }

    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.effective_host(), self.effective_port())
    }
}

/// The whole persisted configuration document.
///
/// Every field carries a serde default so documents written by older
/// versions deserialize cleanly.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub dashboard: DashboardSettings,
    /// Gate for the recurring trigger: the trigger stays configured while
    /// the switch is off, it just is not armed.
    pub restart_switch: bool,
    pub trigger: Trigger,
    /// IANA zone name for daily/cron evaluation; empty means host-local.
    pub timezone: String,
    /// Append memory utilization to the completion notice.
    pub show_memory_info: bool,
    /// Telegram bot token for the completion sink; empty logs instead.
    pub notify_bot_token: String,
    /// Platform identity this deployment reports for.
    pub platform_id: String,
}

impl AppSettings {
    pub fn validate(&self) -> Result<(), TriggerError> {
        self.trigger.validate()
    }
}
