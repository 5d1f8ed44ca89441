//! Recurring-restart job scheduling on top of tokio-cron-scheduler.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::Duration;

use chrono_tz::Tz;
use tokio::sync::RwLock;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::{CoreError, Result};
use rebounce_models::Trigger;

/// Boxed job action. Failures are caught and logged at the scheduler
/// boundary so the trigger keeps firing on schedule.
pub type JobAction =
    Arc<dyn Fn() -> Pin<Box<dyn Future<Output = Result<()>> + Send>> + Send + Sync>;

/// Resolve a configured zone name. Empty input means host-local time; an
/// unknown name also falls back to host-local with a warning, since a bad
/// timezone string must never break scheduling.
pub fn resolve_timezone(name: &str) -> Option<Tz> {
    let name = name.trim();
    if name.is_empty() {
        debug!("no timezone configured, evaluating triggers in host-local time");
        return None;
    }
    match name.parse::<Tz>() {
        Ok(tz) => Some(tz),
        Err(_) => {
            warn!(timezone = name, "unknown timezone, falling back to host-local time");
            None
        }
    }
}

/// One named slot per logical job, at most one armed trigger per slot.
pub struct RestartScheduler {
    scheduler: JobScheduler,
    /// slot name -> scheduler job id
    slots: Arc<RwLock<HashMap<String, Uuid>>>,
    /// Tracks whether shutdown has been requested to refuse new arms
    is_shutdown: AtomicBool,
}

impl RestartScheduler {
    pub async fn new() -> Result<Self> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| CoreError::Scheduling(format!("failed to create job scheduler: {e}")))?;

        Ok(Self {
            scheduler,
            slots: Arc::new(RwLock::new(HashMap::new())),
            is_shutdown: AtomicBool::new(false),
        })
    }

    pub async fn start(&self) -> Result<()> {
        self.scheduler
            .start()
            .await
            .map_err(|e| CoreError::Scheduling(format!("failed to start scheduler: {e}")))?;
        debug!("restart scheduler started");
        Ok(())
    }

    /// Arm `slot` with `trigger`, replacing whatever was armed before.
    ///
    /// The trigger is validated and the job built before the existing one is
    /// touched, so a rejected trigger leaves the previous one running.
    /// `Trigger::None` behaves as `disarm`.
    pub async fn arm(
        &self,
        slot: &str,
        trigger: &Trigger,
        tz: Option<Tz>,
        action: JobAction,
    ) -> Result<()> {
        if self.is_shutdown.load(Ordering::SeqCst) {
            return Err(CoreError::Scheduling(
                "scheduler has been shut down".to_string(),
            ));
        }

        trigger.validate()?;
        if trigger.is_none() {
            self.disarm(slot).await?;
            return Ok(());
        }

        let job = build_job(trigger, tz, &action)?;

        // Swap under one write guard so a concurrent reconfiguration can
        // never observe zero or two armed jobs for the slot.
        let mut slots = self.slots.write().await;
        if let Some(old_id) = slots.remove(slot) {
            self.scheduler
                .remove(&old_id)
                .await
                .map_err(|e| CoreError::Scheduling(format!("failed to remove previous job: {e}")))?;
            debug!(slot, job_id = %old_id, "previous trigger removed");
        }
        let job_id = self
            .scheduler
            .add(job)
            .await
            .map_err(|e| CoreError::Scheduling(format!("failed to add job: {e}")))?;
        slots.insert(slot.to_string(), job_id);

        info!(slot, job_id = %job_id, trigger = %trigger, "trigger armed");
        Ok(())
    }

    /// Remove the job armed for `slot`. Returns true when one existed.
    pub async fn disarm(&self, slot: &str) -> Result<bool> {
        let mut slots = self.slots.write().await;
        match slots.remove(slot) {
            Some(job_id) => {
                self.scheduler
                    .remove(&job_id)
                    .await
                    .map_err(|e| CoreError::Scheduling(format!("failed to remove job: {e}")))?;
                info!(slot, job_id = %job_id, "trigger disarmed");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub async fn active_jobs(&self) -> usize {
        self.slots.read().await.len()
    }

    /// Stop the timer. Idempotent; armed-slot bookkeeping refuses new
    /// registrations afterwards.
    pub async fn shutdown(&self) -> Result<()> {
        if self.is_shutdown.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        // JobScheduler is a cheap handle over shared state; shutdown wants
        // a mutable binding.
        let mut scheduler = self.scheduler.clone();
        scheduler
            .shutdown()
            .await
            .map_err(|e| CoreError::Scheduling(format!("failed to shut down scheduler: {e}")))?;
        info!("restart scheduler stopped");
        Ok(())
    }
}

fn build_job(trigger: &Trigger, tz: Option<Tz>, action: &JobAction) -> Result<Job> {
    let job = match trigger {
        Trigger::None => {
            return Err(CoreError::Scheduling(
                "cannot build a job for an empty trigger".to_string(),
            ));
        }
        Trigger::Interval { seconds } => {
            let action = action.clone();
            Job::new_repeated_async(Duration::from_secs(*seconds), move |_uuid, _lock| {
                let action = action.clone();
                Box::pin(async move {
                    run_action(action).await;
                })
            })
        }
        Trigger::Daily { .. } | Trigger::Cron { .. } => {
            let expression = trigger
                .six_field_cron()
                .ok_or_else(|| CoreError::Scheduling("trigger has no cron form".to_string()))?;
            match tz {
                Some(tz) => {
                    let action = action.clone();
                    Job::new_async_tz(expression.as_str(), tz, move |_uuid, _lock| {
                        let action = action.clone();
                        Box::pin(async move {
                            run_action(action).await;
                        })
                    })
                }
                None => {
                    let action = action.clone();
                    Job::new_async_tz(expression.as_str(), chrono::Local, move |_uuid, _lock| {
                        let action = action.clone();
                        Box::pin(async move {
                            run_action(action).await;
                        })
                    })
                }
            }
        }
    }
    .map_err(|e| CoreError::Scheduling(format!("failed to create job: {e}")))?;

    Ok(job)
}

async fn run_action(action: JobAction) {
    if let Err(e) = action().await {
        error!(error = %e, "scheduled restart failed, trigger stays armed");
    }
}
