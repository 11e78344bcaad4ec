//! Per-tick monitor report and wire payloads

use anyhow::Result;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Snapshot of the observed metric for one tick. Built once per tick and
/// never partially published.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorReport {
    pub processor_time_percent: f32,
    /// Second-precision local time, `YYYY-MM-DD HH:MM:SS`.
    pub timestamp: String,
}

impl MonitorReport {
    /// Build a fully populated report for one tick.
    pub fn new(processor_time_percent: f32, at: DateTime<Local>) -> Self {
        Self {
            processor_time_percent,
            timestamp: at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }

    /// Reported-state document, nested under the `monitor` key.
    pub fn to_reported_state(&self) -> Value {
        serde_json::json!({ "monitor": self })
    }
}

/// Telemetry event payload: the report plus the interval in effect for
/// the tick that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryPayload {
    pub monitoring: MonitorReport,
    pub interval_m_sec: u64,
}

impl TelemetryPayload {
    /// UTF-8 JSON frame for the session's telemetry channel.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}
