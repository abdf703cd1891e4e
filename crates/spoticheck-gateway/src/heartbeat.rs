//! Keep-alive loop, independent of inbound traffic.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use spoticheck_core::protocol::OutboundMessage;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::connection::Connection;

/// Summary of a finished heartbeat loop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeartbeatReport {
    pub sent: u64,
    pub failed: u64,
    pub last_sent_at: Option<DateTime<Utc>>,
}

/// Send a heartbeat every `period` until the connection closes.
///
/// The first heartbeat goes out one full period after start. A failed send
/// is logged and the loop carries on; closure is noticed on the next tick.
pub async fn run_heartbeat(connection: Arc<dyn Connection>, period: Duration) -> HeartbeatReport {
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut report = HeartbeatReport::default();

    loop {
        ticker.tick().await;
        if !connection.is_open() {
            debug!(sent = report.sent, failed = report.failed, "heartbeat stopped, connection closed");
            return report;
        }

        match connection.send(&OutboundMessage::heartbeat()).await {
            Ok(()) => {
                let now = Utc::now();
                report.sent += 1;
                report.last_sent_at = Some(now);
                debug!(sent_at = %now.to_rfc3339(), count = report.sent, "heartbeat sent");
            }
            Err(e) => {
                report.failed += 1;
                warn!(error = %e, "heartbeat send failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeConnection;
    use spoticheck_core::protocol::opcode;

    const PERIOD: Duration = Duration::from_millis(41_250);

    #[tokio::test(start_paused = true)]
    async fn one_heartbeat_per_interval() {
        let conn = Arc::new(FakeConnection::new());
        let handle = tokio::spawn(run_heartbeat(conn.clone(), PERIOD));

        time::sleep(PERIOD * 5 + PERIOD / 2).await;
        let sent = conn.sent();
        assert_eq!(sent.len(), 5);
        assert!(sent.iter().all(|m| m.op == opcode::HEARTBEAT && m.d.is_null()));

        conn.close();
        let report = handle.await.unwrap();
        assert_eq!(report.sent, 5);
        assert_eq!(report.failed, 0);
        assert!(report.last_sent_at.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn first_heartbeat_waits_a_full_period() {
        let conn = Arc::new(FakeConnection::new());
        let handle = tokio::spawn(run_heartbeat(conn.clone(), PERIOD));

        time::sleep(PERIOD - Duration::from_millis(1)).await;
        assert!(conn.sent().is_empty());

        time::sleep(Duration::from_millis(2)).await;
        assert_eq!(conn.sent().len(), 1);

        conn.close();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn failed_send_does_not_stop_loop() {
        let conn = Arc::new(FakeConnection::new());
        conn.fail_sends(2);
        let handle = tokio::spawn(run_heartbeat(conn.clone(), PERIOD));

        time::sleep(PERIOD * 3 + PERIOD / 2).await;
        conn.close();
        let report = handle.await.unwrap();
        assert_eq!(report.failed, 2);
        assert_eq!(report.sent, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn closed_connection_ends_loop_without_sending() {
        let conn = Arc::new(FakeConnection::new());
        conn.close();
        let report = run_heartbeat(conn.clone(), PERIOD).await;
        assert_eq!(report, HeartbeatReport::default());
        assert!(conn.sent().is_empty());
    }
}
