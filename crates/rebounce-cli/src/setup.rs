//! CLI setup module
//!
//! Handles initialization of the rebounce core for CLI usage.

use anyhow::Result;
use rebounce_core::{AppCore, paths};

/// Build the embedded rebounce core
pub async fn prepare_core(db_path: Option<String>) -> Result<AppCore> {
    let db_path = match db_path {
        Some(path) => path,
        None => paths::ensure_database_path_string()?,
    };
    Ok(AppCore::new(&db_path).await?)
}
