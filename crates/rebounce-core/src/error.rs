//! Error types for the rebounce core.

use std::time::Duration;
use thiserror::Error;

use rebounce_models::TriggerError;

/// Core failure taxonomy.
///
/// Every failure path in this crate returns one of these; nothing here is
/// fatal to the host process.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Login failed, or the dashboard rejected our credential twice in a row.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The request never produced a usable 2xx response.
    #[error("transport error: {message}")]
    Transport {
        status: Option<u16>,
        message: String,
    },

    /// HTTP 200, but the response envelope signals failure.
    #[error("dashboard rejected the request: {0}")]
    Business(String),

    /// Malformed trigger, or the job engine refused a registration.
    #[error("scheduling error: {0}")]
    Scheduling(String),

    /// The connection did not become ready within the notification grace
    /// period. The notice is still sent; this only drives the warning.
    #[error("connection not ready after {0:?}")]
    NotificationTimeout(Duration),

    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl From<TriggerError> for CoreError {
    fn from(err: TriggerError) -> Self {
        CoreError::Scheduling(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
