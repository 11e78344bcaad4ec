//! In-memory connectivity backend for testing and development
//!
//! Non-networked stand-in for a real cloud transport. Sessions record
//! every published document so a harness can inspect them, and expose a
//! hook to push desired-state deltas into the registered handler.

use super::{
    ConnectionStatusHandler, DesiredStateHandler, DeviceRegistration, RegistrationStatus, Session,
    Transport,
};
use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// In-memory session (non-persistent, non-networked).
///
/// Clones share state, so a harness can hold one handle while the worker
/// owns another.
#[derive(Clone)]
pub struct MemorySession {
    inner: Arc<SessionState>,
}

struct SessionState {
    model_id: String,
    desired: RwLock<Value>,
    reported: Mutex<Vec<Value>>,
    telemetry: Mutex<Vec<Vec<u8>>>,
    desired_handler: Mutex<Option<Arc<dyn DesiredStateHandler>>>,
    status_handler: Mutex<Option<ConnectionStatusHandler>>,
    fail_io: AtomicBool,
    closed: AtomicBool,
}

impl MemorySession {
    fn new(model_id: &str, desired: Value) -> Self {
        Self {
            inner: Arc::new(SessionState {
                model_id: model_id.to_string(),
                desired: RwLock::new(desired),
                reported: Mutex::new(Vec::new()),
                telemetry: Mutex::new(Vec::new()),
                desired_handler: Mutex::new(None),
                status_handler: Mutex::new(None),
                fail_io: AtomicBool::new(false),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Model identifier the session was tagged with at open time.
    pub fn model_id(&self) -> &str {
        &self.inner.model_id
    }

    /// Push a desired-state delta into the registered handler, the way the
    /// remote side would.
    pub async fn push_desired_state(&self, delta: Value) {
        let handler = self.inner.desired_handler.lock().await.clone();
        if let Some(handler) = handler {
            handler.on_desired_state(delta).await;
        }
    }

    /// Invoke the installed connection status handler.
    pub async fn emit_connection_status(&self, status: &str, reason: &str) {
        if let Some(handler) = self.inner.status_handler.lock().await.as_ref() {
            handler(status, reason);
        }
    }

    /// Every reported-state document published so far.
    pub async fn reported_states(&self) -> Vec<Value> {
        self.inner.reported.lock().await.clone()
    }

    /// Every telemetry frame published so far.
    pub async fn telemetry_frames(&self) -> Vec<Vec<u8>> {
        self.inner.telemetry.lock().await.clone()
    }

    /// Make subsequent session I/O fail, simulating a dropped transport.
    pub fn set_transport_failure(&self, fail: bool) {
        self.inner.fail_io.store(fail, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    fn check_open(&self) -> Result<()> {
        if self.inner.closed.load(Ordering::SeqCst) {
            bail!("session is closed");
        }
        if self.inner.fail_io.load(Ordering::SeqCst) {
            bail!("simulated transport failure");
        }
        Ok(())
    }
}

#[async_trait]
impl Session for MemorySession {
    async fn set_connection_status_handler(&self, handler: ConnectionStatusHandler) {
        *self.inner.status_handler.lock().await = Some(handler);
    }

    async fn fetch_desired_state(&self) -> Result<Value> {
        self.check_open()?;
        Ok(self.inner.desired.read().await.clone())
    }

    async fn register_desired_state_callback(
        &self,
        handler: Arc<dyn DesiredStateHandler>,
    ) -> Result<()> {
        *self.inner.desired_handler.lock().await = Some(handler);
        Ok(())
    }

    async fn update_reported_state(&self, reported: Value) -> Result<()> {
        self.check_open()?;
        self.inner.reported.lock().await.push(reported);
        Ok(())
    }

    async fn send_telemetry(&self, payload: Vec<u8>) -> Result<()> {
        self.check_open()?;
        self.inner.telemetry.lock().await.push(payload);
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.inner.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// In-memory transport: opens `MemorySession`s and records every bootstrap
/// interaction.
#[derive(Clone)]
pub struct MemoryTransport {
    inner: Arc<TransportState>,
}

struct TransportState {
    registration_status: RwLock<RegistrationStatus>,
    registrations: Mutex<Vec<DeviceRegistration>>,
    connection_strings: Mutex<Vec<String>>,
    opened_hubs: Mutex<Vec<String>>,
    desired_seed: RwLock<Value>,
    sessions: Mutex<Vec<MemorySession>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(TransportState {
                registration_status: RwLock::new(RegistrationStatus::Assigned),
                registrations: Mutex::new(Vec::new()),
                connection_strings: Mutex::new(Vec::new()),
                opened_hubs: Mutex::new(Vec::new()),
                desired_seed: RwLock::new(Value::Object(serde_json::Map::new())),
                sessions: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Status every subsequent registration attempt will resolve to.
    pub async fn set_registration_status(&self, status: RegistrationStatus) {
        *self.inner.registration_status.write().await = status;
    }

    /// Desired-state document newly opened sessions start with.
    pub async fn set_desired_seed(&self, document: Value) {
        *self.inner.desired_seed.write().await = document;
    }

    /// Registration attempts observed so far.
    pub async fn registrations(&self) -> Vec<DeviceRegistration> {
        self.inner.registrations.lock().await.clone()
    }

    /// Connection strings sessions were opened with.
    pub async fn connection_strings(&self) -> Vec<String> {
        self.inner.connection_strings.lock().await.clone()
    }

    /// Assigned hubs sessions were opened against.
    pub async fn opened_hubs(&self) -> Vec<String> {
        self.inner.opened_hubs.lock().await.clone()
    }

    /// The most recently opened session, if any.
    pub async fn last_session(&self) -> Option<MemorySession> {
        self.inner.sessions.lock().await.last().cloned()
    }

    async fn open_session(&self, model_id: &str) -> MemorySession {
        let desired = self.inner.desired_seed.read().await.clone();
        let session = MemorySession::new(model_id, desired);
        self.inner.sessions.lock().await.push(session.clone());
        session
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn open_from_connection_string(
        &self,
        connection_string: &str,
        model_id: &str,
    ) -> Result<Box<dyn Session>> {
        self.inner
            .connection_strings
            .lock()
            .await
            .push(connection_string.to_string());
        Ok(Box::new(self.open_session(model_id).await))
    }

    async fn register_device(
        &self,
        _global_endpoint: &str,
        id_scope: &str,
        device_id: &str,
        _symmetric_key: &str,
    ) -> Result<DeviceRegistration> {
        let status = *self.inner.registration_status.read().await;
        let registration = DeviceRegistration {
            status,
            assigned_hub: format!("{id_scope}.devices.local"),
            device_id: device_id.to_string(),
        };
        self.inner
            .registrations
            .lock()
            .await
            .push(registration.clone());
        Ok(registration)
    }

    async fn open(
        &self,
        assigned_hub: &str,
        _device_id: &str,
        _symmetric_key: &str,
        model_id: &str,
    ) -> Result<Box<dyn Session>> {
        self.inner
            .opened_hubs
            .lock()
            .await
            .push(assigned_hub.to_string());
        Ok(Box::new(self.open_session(model_id).await))
    }
}
