//! Desired-state reconciliation
//!
//! Keeps the shared runtime configuration consistent with the remote
//! side's desired-state document, idempotently, whether the document
//! arrives from the initial fetch or an asynchronous push.

use crate::config::SharedConfig;
use crate::error::AgentError;
use crate::session::{DesiredStateHandler, Session};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

/// Recognized desired-state path: `configuration.IntervalMSec`.
const CONFIGURATION_KEY: &str = "configuration";
const INTERVAL_KEY: &str = "IntervalMSec";

/// Applies desired-state documents to the shared runtime configuration.
pub struct TwinSync {
    config: SharedConfig,
}

impl TwinSync {
    pub fn new(config: SharedConfig) -> Self {
        Self { config }
    }

    /// Initial reconciliation: fetch the full desired-state document and
    /// apply it before the first telemetry tick, so the first tick already
    /// uses the last known remote intent. A failed fetch is fatal.
    pub async fn reconcile(&self, session: &dyn Session) -> Result<(), AgentError> {
        let document = session.fetch_desired_state().await?;
        self.apply_desired_state(&document).await;
        Ok(())
    }

    /// Apply whatever recognized fields are present in `document`.
    ///
    /// Absent fields are a no-op. Malformed shapes leave the configuration
    /// unchanged and surface only as a diagnostic.
    pub async fn apply_desired_state(&self, document: &Value) {
        match Self::interpret(document) {
            Ok(Some(interval_msec)) => {
                self.config.set_interval_msec(interval_msec).await;
                info!(interval_msec, "desired state updated reporting interval");
            }
            Ok(None) => debug!("desired state carries no recognized configuration"),
            Err(err) => warn!(%err, "ignoring uninterpretable desired state"),
        }
    }

    /// Extract the desired interval, if the document carries one.
    fn interpret(document: &Value) -> Result<Option<u64>, AgentError> {
        if document.is_null() {
            return Ok(None);
        }
        let Some(document) = document.as_object() else {
            return Err(AgentError::MalformedDesiredState(
                "document is not an object".to_string(),
            ));
        };
        let Some(configuration) = document.get(CONFIGURATION_KEY) else {
            return Ok(None);
        };
        let Some(configuration) = configuration.as_object() else {
            return Err(AgentError::MalformedDesiredState(format!(
                "'{CONFIGURATION_KEY}' is not an object"
            )));
        };
        let Some(interval) = configuration.get(INTERVAL_KEY) else {
            return Ok(None);
        };
        match interval.as_u64() {
            Some(interval_msec) if interval_msec > 0 => Ok(Some(interval_msec)),
            _ => Err(AgentError::MalformedDesiredState(format!(
                "'{INTERVAL_KEY}' should be a positive integer, got {interval}"
            ))),
        }
    }
}

#[async_trait]
impl DesiredStateHandler for TwinSync {
    async fn on_desired_state(&self, delta: Value) {
        self.apply_desired_state(&delta).await;
    }
}
