//! The telemetry loop
//!
//! One long-lived cooperative task: bootstrap, initial reconciliation,
//! then strictly sequential ticks (sample, report, publish, wait). The
//! live interval is read exactly once per tick; a concurrent
//! desired-state write lands on the next tick, never mid-tick.

use crate::bootstrap::{establish_session, BootstrapParameters};
use crate::config::SharedConfig;
use crate::error::AgentError;
use crate::report::MonitorReport;
use crate::sampler::ProcessorSampler;
use crate::session::{Session, Transport};
use crate::twin::TwinSync;
use chrono::Local;
use std::sync::Arc;
use std::time::Duration;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Capability descriptor attached to every session at open time.
pub const MODEL_ID: &str = "dtmi:devmon:agent:OsMonitor;1";

/// Lifecycle states of the telemetry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Starting,
    Connected,
    Reporting,
    Waiting,
    Stopped,
    Failed,
}

/// The periodic monitor worker.
pub struct Worker {
    params: BootstrapParameters,
    config: SharedConfig,
    transport: Arc<dyn Transport>,
    sampler: Box<dyn ProcessorSampler>,
    state: WorkerState,
}

impl Worker {
    pub fn new(
        params: BootstrapParameters,
        config: SharedConfig,
        transport: Arc<dyn Transport>,
        sampler: Box<dyn ProcessorSampler>,
    ) -> Self {
        Self {
            params,
            config,
            transport,
            sampler,
            state: WorkerState::Starting,
        }
    }

    /// Run until cancelled or a fatal error.
    ///
    /// Startup failures and in-loop session failures both end the run;
    /// restart policy belongs to the hosting wrapper. Returns the terminal
    /// state on a clean stop.
    pub async fn run(mut self, cancel: CancellationToken) -> Result<WorkerState, AgentError> {
        let session = match self.start().await {
            Ok(session) => session,
            Err(err) => {
                self.transition(WorkerState::Failed);
                error!(%err, "startup failed");
                return Err(err);
            }
        };
        self.transition(WorkerState::Connected);
        info!("connected to management endpoint");

        let result = self.run_loop(session.as_ref(), &cancel).await;
        session.close().await.ok();
        match result {
            Ok(()) => {
                self.transition(WorkerState::Stopped);
                info!("telemetry loop stopped");
                Ok(self.state)
            }
            Err(err) => {
                self.transition(WorkerState::Failed);
                error!(%err, "telemetry loop ended on error");
                Err(err)
            }
        }
    }

    /// `Starting`: establish the session, install handlers, and perform
    /// the initial twin reconciliation so the first tick uses the last
    /// known remote intent.
    async fn start(&self) -> Result<Box<dyn Session>, AgentError> {
        let session = establish_session(&self.params, self.transport.as_ref(), MODEL_ID).await?;
        session
            .set_connection_status_handler(Box::new(|status, reason| {
                info!(status, reason, "connection status changed");
            }))
            .await;

        let twin_sync = Arc::new(TwinSync::new(self.config.clone()));
        session
            .register_desired_state_callback(twin_sync.clone())
            .await?;
        twin_sync.reconcile(session.as_ref()).await?;
        Ok(session)
    }

    async fn run_loop(
        &mut self,
        session: &dyn Session,
        cancel: &CancellationToken,
    ) -> Result<(), AgentError> {
        while !cancel.is_cancelled() {
            self.transition(WorkerState::Reporting);
            let report = MonitorReport::new(self.sampler.sample(), Local::now());

            // One snapshot serves both the telemetry payload and the wait
            // below.
            let interval_msec = self.config.interval_msec().await;

            session.update_reported_state(report.to_reported_state()).await?;
            info!(timestamp = %report.timestamp, "updated reported state");

            #[cfg(feature = "telemetry")]
            {
                let payload = crate::report::TelemetryPayload {
                    monitoring: report,
                    interval_m_sec: interval_msec,
                };
                session.send_telemetry(payload.to_bytes()?).await?;
            }

            // The sole suspension point between ticks. Cancellation here
            // suppresses the next iteration without aborting anything
            // already published.
            self.transition(WorkerState::Waiting);
            tokio::select! {
                () = cancel.cancelled() => break,
                () = time::sleep(Duration::from_millis(interval_msec)) => {}
            }
        }
        Ok(())
    }

    fn transition(&mut self, next: WorkerState) {
        debug!(from = ?self.state, to = ?next, "worker state transition");
        self.state = next;
    }
}
