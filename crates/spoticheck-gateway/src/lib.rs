//! Gateway client: connection and handshake, the heartbeat driver, and the
//! presence-event dispatcher that feeds listening records into a sink.

pub mod connection;
pub mod dispatcher;
pub mod heartbeat;
pub mod session;

#[cfg(test)]
pub(crate) mod fake;

pub use connection::{handshake, Connection, WsConnection};
pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use heartbeat::{run_heartbeat, HeartbeatReport};
pub use session::{run_session, SessionEnd};
