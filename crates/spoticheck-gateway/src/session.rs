use std::sync::Arc;
use std::time::Duration;

use spoticheck_core::GatewayError;
use tracing::{error, info};

use crate::connection::Connection;
use crate::dispatcher::Dispatcher;
use crate::heartbeat::{run_heartbeat, HeartbeatReport};

/// Which half of a session stopped first.
#[derive(Debug)]
pub enum SessionEnd {
    Dispatcher(GatewayError),
    Heartbeat(HeartbeatReport),
    /// A task panicked or was cancelled.
    Aborted(String),
}

/// Run the heartbeat and the dispatcher concurrently on one connection.
///
/// Both run until the connection closes; whichever finishes first ends the
/// session and the other is aborted.
pub async fn run_session(
    connection: Arc<dyn Connection>,
    heartbeat_interval: Duration,
    mut dispatcher: Dispatcher,
) -> SessionEnd {
    info!(interval_ms = heartbeat_interval.as_millis() as u64, "session started");

    let mut heartbeat = tokio::spawn(run_heartbeat(connection.clone(), heartbeat_interval));
    let mut reader = tokio::spawn(async move { dispatcher.run(connection.as_ref()).await });

    let end = tokio::select! {
        result = &mut reader => match result {
            Ok(e) => SessionEnd::Dispatcher(e),
            Err(e) => SessionEnd::Aborted(format!("dispatcher task: {e}")),
        },
        result = &mut heartbeat => match result {
            Ok(report) => SessionEnd::Heartbeat(report),
            Err(e) => SessionEnd::Aborted(format!("heartbeat task: {e}")),
        },
    };

    heartbeat.abort();
    reader.abort();
    error!(?end, "session ended");
    end
}
