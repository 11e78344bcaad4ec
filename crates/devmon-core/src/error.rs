//! Error taxonomy for the agent core
//!
//! Configuration and registration errors abort startup before the loop
//! begins; in-loop errors end the run and leave restart policy to the
//! hosting wrapper.

use crate::session::RegistrationStatus;
use thiserror::Error;

/// Errors surfaced by the agent core.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Malformed startup mode or settings. Raised before any connection
    /// attempt.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Provisioning handshake did not reach an assigned status. Fatal for
    /// the run, not retried.
    #[error("device registration failed with status {status}")]
    RegistrationFailure { status: RegistrationStatus },

    /// A desired-state document could not be interpreted. Diagnosed and
    /// recovered locally, never propagated out of reconciliation.
    #[error("malformed desired state: {0}")]
    MalformedDesiredState(String),

    /// Session open or publish failure. Ends the run, no internal
    /// reconnect.
    #[error("transport failure: {0}")]
    Transport(anyhow::Error),
}

impl From<anyhow::Error> for AgentError {
    fn from(err: anyhow::Error) -> Self {
        Self::Transport(err)
    }
}
