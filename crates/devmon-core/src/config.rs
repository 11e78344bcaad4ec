//! Shared runtime configuration
//!
//! One small record behind one lock. Twin reconciliation writes it, the
//! telemetry loop reads it; nothing else is shared between the two. Any
//! future remotely tunable parameter belongs in the same record, behind
//! the same lock.

use std::sync::Arc;
use tokio::sync::RwLock;

/// Reporting interval used until the remote side sets one.
pub const DEFAULT_INTERVAL_MSEC: u64 = 60_000;

/// Runtime-tunable monitor settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Milliseconds between telemetry ticks. Always > 0.
    pub interval_msec: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval_msec: DEFAULT_INTERVAL_MSEC,
        }
    }
}

/// Cheaply cloneable handle to the live configuration.
#[derive(Debug, Clone, Default)]
pub struct SharedConfig {
    inner: Arc<RwLock<MonitorConfig>>,
}

impl SharedConfig {
    /// Create a configuration holding the default interval.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a configuration with a specific starting interval.
    pub fn with_interval_msec(interval_msec: u64) -> Self {
        Self {
            inner: Arc::new(RwLock::new(MonitorConfig { interval_msec })),
        }
    }

    /// One consistent snapshot of the current interval.
    pub async fn interval_msec(&self) -> u64 {
        self.inner.read().await.interval_msec
    }

    /// Exclusive write of a new interval.
    pub async fn set_interval_msec(&self, interval_msec: u64) {
        self.inner.write().await.interval_msec = interval_msec;
    }
}
