//! `ptydeck serve`: the registry behind a JSON-lines stdio transport.

use anyhow::{Context, Result};
use ptydeck_config::PtydeckConfig;
use ptydeck_core::{NativePtySpawner, SessionRegistry};
use ptydeck_core::transport::{self, codec};
use tokio::io::BufReader;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServeExit {
    /// stdin reached EOF
    Finished,
    Interrupted,
}

pub async fn run(config: &PtydeckConfig) -> Result<ServeExit> {
    let (event_tx, event_rx) = transport::event_channel();
    let (command_tx, command_rx) = transport::command_channel();

    let registry = SessionRegistry::new(config, NativePtySpawner::new(), event_tx);
    let writer = tokio::spawn(codec::write_lines(event_rx, tokio::io::stdout()));
    let server = tokio::spawn(transport::serve(registry, command_rx));

    info!(target: "ptydeck.transport", "serving on stdio");
    let reader = codec::read_lines(BufReader::new(tokio::io::stdin()), command_tx);
    let exit = tokio::select! {
        result = reader => {
            let forwarded = result.context("Failed to read commands from stdin")?;
            debug!(target: "ptydeck.transport", forwarded, "command stream closed");
            ServeExit::Finished
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for Ctrl-C")?;
            info!(target: "ptydeck.transport", "interrupted");
            ServeExit::Interrupted
        }
    };

    // Dropping the reader closed the command channel, so the server sweeps
    // and drops the registry, which in turn closes the event channel.
    let swept = server.await.context("registry task failed")?;
    info!(target: "ptydeck.transport", swept, "sessions shut down");

    let written = writer
        .await
        .context("event writer task failed")?
        .context("Failed to write events to stdout")?;
    debug!(target: "ptydeck.transport", written, "event stream closed");

    Ok(exit)
}
