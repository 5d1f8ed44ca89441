//! Host memory sampling for the completion notice.

use std::sync::Mutex;

use sysinfo::System;

use rebounce_core::{MemoryReading, MemorySampler};

pub struct SystemMemorySampler {
    system: Mutex<System>,
}

impl SystemMemorySampler {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
        }
    }
}

impl Default for SystemMemorySampler {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySampler for SystemMemorySampler {
    fn sample(&self) -> Option<MemoryReading> {
        let mut system = self.system.lock().ok()?;
        system.refresh_memory();

        let total = system.total_memory();
        if total == 0 {
            return None;
        }
        // Available counts reclaimable caches, so this tracks what a process
        // monitor reports better than used_memory() alone.
        let used = total.saturating_sub(system.available_memory());
        Some(MemoryReading {
            used_bytes: used,
            total_bytes: total,
        })
    }
}
