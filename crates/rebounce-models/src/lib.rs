//! Shared data types for rebounce: the restart trigger union, the durable
//! pending-restart marker, and the persisted application settings.

pub mod marker;
pub mod settings;
pub mod trigger;

pub use marker::PendingRestart;
pub use settings::{AppSettings, DashboardSettings};
pub use trigger::{Trigger, TriggerError};
