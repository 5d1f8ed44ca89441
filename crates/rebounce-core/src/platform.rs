//! Seams to the platform hosting the requester.
//!
//! The notifier talks to the outside world only through these traits, so
//! deployments plug in their own delivery channel and readiness probe, and
//! tests substitute recording doubles.

use anyhow::Result;
use async_trait::async_trait;
use std::fmt;

/// Outbound delivery of the completion notice.
#[async_trait]
pub trait CompletionSink: Send + Sync {
    /// Send `text` to the opaque routing token `session`.
    async fn send_text(&self, session: &str, text: &str) -> Result<()>;
}

/// Readiness of the transport the notice travels over.
#[async_trait]
pub trait ConnectionWatch: Send + Sync {
    /// Resolves once the connection is live. Callers bound the wait with a
    /// timeout; implementations may poll indefinitely.
    async fn wait_ready(&self);
}

/// Point-in-time memory utilization of the host.
pub trait MemorySampler: Send + Sync {
    fn sample(&self) -> Option<MemoryReading>;
}

const BYTES_PER_GB: f64 = 1_073_741_824.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemoryReading {
    pub used_bytes: u64,
    pub total_bytes: u64,
}

impl fmt::Display for MemoryReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let used = self.used_bytes as f64 / BYTES_PER_GB;
        let total = self.total_bytes as f64 / BYTES_PER_GB;
        let percent = if self.total_bytes == 0 {
            0.0
        } else {
            self.used_bytes as f64 / self.total_bytes as f64 * 100.0
        };
        write!(f, "{used:.1}GB/{total:.1}GB({percent:.1}%)")
    }
}
