//! Session collaborator contract
//!
//! The connectivity library is an external collaborator; these traits are
//! the surface the agent core programs against. The `memory` backend is a
//! non-networked implementation for development and tests.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Provisioning service registration states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationStatus {
    Assigned,
    Assigning,
    Unassigned,
    Failed,
    Disabled,
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Assigned => "Assigned",
            Self::Assigning => "Assigning",
            Self::Unassigned => "Unassigned",
            Self::Failed => "Failed",
            Self::Disabled => "Disabled",
        };
        write!(f, "{name}")
    }
}

/// Outcome of one provisioning registration attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRegistration {
    pub status: RegistrationStatus,
    /// Hub host assigned by the provisioning service.
    pub assigned_hub: String,
    /// Device identity under the assigned hub.
    pub device_id: String,
}

/// Handler for connection status transitions, invoked by the session with
/// `(status, reason)`.
pub type ConnectionStatusHandler = Box<dyn Fn(&str, &str) + Send + Sync>;

/// Receiver for remotely pushed desired-state deltas.
///
/// Invoked on the session's own execution context, concurrently with the
/// telemetry loop.
#[async_trait]
pub trait DesiredStateHandler: Send + Sync {
    async fn on_desired_state(&self, delta: Value);
}

/// An open connection to the management endpoint.
#[async_trait]
pub trait Session: Send + Sync {
    /// Install a handler for connection status transitions.
    async fn set_connection_status_handler(&self, handler: ConnectionStatusHandler);

    /// Fetch the full current desired-state document.
    async fn fetch_desired_state(&self) -> Result<Value>;

    /// Register the receiver for asynchronously pushed desired-state
    /// deltas.
    async fn register_desired_state_callback(
        &self,
        handler: Arc<dyn DesiredStateHandler>,
    ) -> Result<()>;

    /// Publish the device's reported state, queryable by the remote side
    /// at any time.
    async fn update_reported_state(&self, reported: Value) -> Result<()>;

    /// Publish one telemetry event.
    async fn send_telemetry(&self, payload: Vec<u8>) -> Result<()>;

    /// Close the connection. In-flight publications are not aborted.
    async fn close(&self) -> Result<()>;
}

/// Factory side of the connectivity collaborator.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open a session directly from a connection string, tagged with the
    /// given model identifier.
    async fn open_from_connection_string(
        &self,
        connection_string: &str,
        model_id: &str,
    ) -> Result<Box<dyn Session>>;

    /// Register a device identity against the provisioning endpoint. One
    /// bounded call, no internal retry.
    async fn register_device(
        &self,
        global_endpoint: &str,
        id_scope: &str,
        device_id: &str,
        symmetric_key: &str,
    ) -> Result<DeviceRegistration>;

    /// Open a session to an assigned hub with a derived identity.
    async fn open(
        &self,
        assigned_hub: &str,
        device_id: &str,
        symmetric_key: &str,
        model_id: &str,
    ) -> Result<Box<dyn Session>>;
}
