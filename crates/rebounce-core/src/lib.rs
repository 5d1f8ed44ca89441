//! Rebounce core logic.
//!
//! The pieces every command shares: the authenticated dashboard client, the
//! restart orchestrator with its recurring-trigger scheduler, and the
//! completion notifier that announces a finished restart once the managed
//! platform reconnects.

pub mod client;
pub mod error;
pub mod notifier;
pub mod orchestrator;
pub mod paths;
pub mod platform;
pub mod scheduler;

use std::sync::Arc;

use tracing::info;

pub use client::DashboardClient;
pub use error::{CoreError, Result};
pub use notifier::CompletionNotifier;
pub use orchestrator::{RECURRING_SLOT, RestartOrchestrator};
pub use platform::{CompletionSink, ConnectionWatch, MemoryReading, MemorySampler};
pub use scheduler::{JobAction, RestartScheduler, resolve_timezone};

use rebounce_storage::Storage;

/// Shared handles behind every command.
pub struct AppCore {
    pub storage: Arc<Storage>,
    pub client: Arc<DashboardClient>,
    pub orchestrator: Arc<RestartOrchestrator>,
}

impl AppCore {
    /// Open the database at `db_path` and wire the client and orchestrator
    /// up from the stored settings.
    pub async fn new(db_path: &str) -> Result<Self> {
        let storage = Arc::new(Storage::new(db_path)?);
        let settings = storage.settings.load()?;
        let client = Arc::new(DashboardClient::new(&settings.dashboard)?);
        let orchestrator =
            Arc::new(RestartOrchestrator::new(storage.clone(), client.clone()).await?);

        info!(db_path, "core initialized");
        Ok(Self {
            storage,
            client,
            orchestrator,
        })
    }
}
