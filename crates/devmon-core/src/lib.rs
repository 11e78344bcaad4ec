//! Device Monitor Agent Core
//!
//! Connection bootstrap and the live configuration/telemetry control loop:
//! - Two-variant bootstrap: manual connection string or provisioning enrollment
//! - Desired-state reconciliation into one shared runtime configuration
//! - A cancellable periodic telemetry loop reading that configuration live
//! - Session and transport traits at the connectivity collaborator boundary

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod report;
pub mod sampler;
pub mod session;
pub mod twin;
pub mod worker;

pub use bootstrap::{establish_session, BootstrapParameters};
pub use config::{MonitorConfig, SharedConfig, DEFAULT_INTERVAL_MSEC};
pub use error::AgentError;
pub use report::{MonitorReport, TelemetryPayload};
pub use sampler::{ProcessorSampler, SystemProcessorSampler};
pub use twin::TwinSync;
pub use worker::{Worker, WorkerState, MODEL_ID};
