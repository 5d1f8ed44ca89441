//! Restart orchestration.
//!
//! Couples the durable pending-restart marker to the dashboard restart call
//! and keeps the recurring-restart job in sync with the stored settings.

use std::sync::Arc;

use tracing::info;

use crate::client::DashboardClient;
use crate::error::Result;
use crate::scheduler::{JobAction, RestartScheduler, resolve_timezone};
use rebounce_models::{AppSettings, PendingRestart, Trigger};
use rebounce_storage::Storage;

/// Scheduler slot the recurring restart trigger occupies.
pub const RECURRING_SLOT: &str = "recurring-restart";

/// Write the completion marker, then ask the dashboard to restart the core.
///
/// The marker is committed before the restart call so the obligation to
/// notify survives this process being replaced mid-request. On a failed call
/// the marker stays put: the dashboard may have acted before the error
/// surfaced, and the next request overwrites a stale marker anyway.
async fn perform_restart(
    storage: &Storage,
    client: &DashboardClient,
    origin_session: &str,
    platform_id: &str,
) -> Result<()> {
    let marker = PendingRestart::new(origin_session, platform_id);
    storage.marker.set(&marker)?;
    info!(platform_id, "pending-restart marker persisted");

    client.restart().await?;
    info!("restart request accepted by dashboard");
    Ok(())
}

pub struct RestartOrchestrator {
    storage: Arc<Storage>,
    client: Arc<DashboardClient>,
    scheduler: RestartScheduler,
}

impl RestartOrchestrator {
    pub async fn new(storage: Arc<Storage>, client: Arc<DashboardClient>) -> Result<Self> {
        let scheduler = RestartScheduler::new().await?;
        scheduler.start().await?;

        Ok(Self {
            storage,
            client,
            scheduler,
        })
    }

    /// One on-demand restart. `origin_session` is where the completion
    /// notice goes once the platform reconnects; empty means notify nobody.
    pub async fn request_restart(&self, origin_session: &str, platform_id: &str) -> Result<()> {
        perform_restart(&self.storage, &self.client, origin_session, platform_id).await
    }

    /// Store a new recurring trigger and re-arm the scheduler accordingly.
    ///
    /// Validation runs before anything is written, so a rejected trigger
    /// leaves both the stored settings and the armed job as they were.
    pub async fn configure_recurring(&self, trigger: Trigger) -> Result<AppSettings> {
        trigger.validate()?;
        let settings = self.storage.settings.modify(|s| s.trigger = trigger)?;
        self.sync_recurring(&settings).await?;
        Ok(settings)
    }

    pub async fn enable_recurring(&self) -> Result<AppSettings> {
        let settings = self.storage.settings.modify(|s| s.restart_switch = true)?;
        self.sync_recurring(&settings).await?;
        Ok(settings)
    }

    pub async fn disable_recurring(&self) -> Result<AppSettings> {
        let settings = self.storage.settings.modify(|s| s.restart_switch = false)?;
        self.sync_recurring(&settings).await?;
        Ok(settings)
    }

    /// Bring the armed job in line with `settings`. Called at daemon startup
    /// and after every settings change.
    ///
    /// A recurring restart fires with no origin session, so nobody is
    /// notified, but it carries the configured platform id: that way the
    /// reconnect of the managed platform still clears the marker.
    pub async fn sync_recurring(&self, settings: &AppSettings) -> Result<()> {
        if !settings.restart_switch || settings.trigger.is_none() {
            self.scheduler.disarm(RECURRING_SLOT).await?;
            return Ok(());
        }

        let tz = resolve_timezone(&settings.timezone);
        let storage = self.storage.clone();
        let client = self.client.clone();
        let platform_id = settings.platform_id.clone();
        let action: JobAction = Arc::new(move || {
            let storage = storage.clone();
            let client = client.clone();
            let platform_id = platform_id.clone();
            Box::pin(async move {
                info!("recurring trigger fired, restarting core");
                perform_restart(&storage, &client, "", &platform_id).await
            })
        });

        self.scheduler
            .arm(RECURRING_SLOT, &settings.trigger, tz, action)
            .await
    }

    pub async fn active_jobs(&self) -> usize {
        self.scheduler.active_jobs().await
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.scheduler.shutdown().await
    }
}
