//! Concrete platform adapters the daemon plugs into the core seams.

pub mod memory;
pub mod telegram;
pub mod watch;

pub use memory::SystemMemorySampler;
pub use telegram::{LogSink, TelegramSink};
pub use watch::DashboardWatch;
