//! Device monitor agent binary
//!
//! Thin hosting wrapper: resolves startup inputs, initializes logging,
//! wires the connectivity backend, and runs the worker until Ctrl-C. The
//! worker does not restart itself; a supervisor (systemd, service
//! manager) owns restart policy.

use anyhow::{bail, Context, Result};
use devmon_core::session::memory::MemoryTransport;
use devmon_core::{BootstrapParameters, SharedConfig, SystemProcessorSampler, Worker};
use std::env;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Environment fallbacks used when no positional arguments are given.
const MODE_VAR: &str = "DEVMON_MODE";
const CONNECTION_VAR: &str = "DEVMON_CONNECTION_STRING";

/// `(mode, settings)` from exactly two positional arguments, `None` when
/// no arguments were given, an error for any other shape.
fn positional_inputs(args: &[String]) -> Result<Option<(String, String)>> {
    match args {
        [] => Ok(None),
        [mode, settings] => Ok(Some((mode.clone(), settings.clone()))),
        _ => bail!("usage: devmon-agent <manual|dps> <settings>"),
    }
}

fn startup_inputs() -> Result<(String, String)> {
    let args: Vec<String> = env::args().skip(1).collect();
    if let Some(inputs) = positional_inputs(&args)? {
        return Ok(inputs);
    }
    let mode = env::var(MODE_VAR)
        .with_context(|| format!("no positional arguments and {MODE_VAR} is not set"))?;
    let settings = env::var(CONNECTION_VAR)
        .with_context(|| format!("no positional arguments and {CONNECTION_VAR} is not set"))?;
    Ok((mode, settings))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Fail fast on malformed input, before any connection attempt.
    let (mode, settings) = startup_inputs()?;
    let params = BootstrapParameters::from_mode_and_settings(&mode, &settings)?;

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            signal_cancel.cancel();
        }
    });

    // The in-memory backend stands in for a real cloud transport, which
    // plugs in at this seam.
    let worker = Worker::new(
        params,
        SharedConfig::new(),
        Arc::new(MemoryTransport::new()),
        Box::new(SystemProcessorSampler::new()),
    );
    let state = worker.run(cancel).await?;
    info!(?state, "agent stopped");
    Ok(())
}
