//! Rebounce persistence layer, using redb as the embedded database.
//!
//! Everything that must outlive a single process lives here: the restart
//! trigger configuration and the pending-restart marker that carries the
//! notification obligation across the process replacement a restart causes.
//!
//! # Tables
//!
//! - `settings` - Application settings document
//! - `pending_restart` - Durable pending-restart marker

pub mod marker;
pub mod settings;
pub mod simple_storage;

use anyhow::{Context, Result};
use redb::Database;
use std::sync::Arc;

pub use marker::MarkerStorage;
pub use settings::SettingsStorage;
pub use simple_storage::SimpleStorage;

/// Central storage manager that initializes all storage subsystems
pub struct Storage {
    db: Arc<Database>,
    pub settings: SettingsStorage,
    pub marker: MarkerStorage,
}

impl Storage {
    /// Open (or create) the database at `path` and initialize all tables.
    ///
    /// redb holds an exclusive lock on the file, so this fails while another
    /// rebounce process has the same database open.
    pub fn new(path: &str) -> Result<Self> {
        let db = Arc::new(
            Database::create(path)
                .with_context(|| format!("Failed to open database at {path}"))?,
        );
        let settings = SettingsStorage::new(db.clone())?;
        let marker = MarkerStorage::new(db.clone())?;

        Ok(Self {
            db,
            settings,
            marker,
        })
    }

    pub fn get_db(&self) -> Arc<Database> {
        self.db.clone()
    }
}
