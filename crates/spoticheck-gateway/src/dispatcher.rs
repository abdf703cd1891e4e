//! Inbound event loop.
//!
//! Messages are handled one at a time in arrival order. A message that fails
//! to decode is logged once and dropped; only connection failures end the
//! loop. Sink writes happen inline, so a slow sink delays the next read.

use std::sync::Arc;

use serde_json::Value;
use spoticheck_core::protocol::{kind, opcode, GatewayMessage, PresenceUpdate};
use spoticheck_core::{GatewayError, ListenerPresence, Sink, WatchedSet};
use tracing::{debug, error, info};

use crate::connection::Connection;

/// What the dispatcher did with one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Session is ready; nothing to record.
    Ready,
    /// A listening record was written to the sink.
    Recorded,
    /// A record was built but the sink rejected it.
    SinkFailed,
    /// Music activity from an identity outside the watched set.
    Unwatched,
    /// A present listener has no music activity any more.
    StoppedListening,
    /// Presence update without music for someone not marked listening.
    Idle,
    /// Any other message kind.
    Ignored,
}

pub struct Dispatcher {
    sink: Arc<dyn Sink>,
    watched: WatchedSet,
    presence: ListenerPresence,
}

impl Dispatcher {
    pub fn new(sink: Arc<dyn Sink>, watched: WatchedSet) -> Self {
        Self {
            sink,
            watched,
            presence: ListenerPresence::new(),
        }
    }

    pub fn presence(&self) -> &ListenerPresence {
        &self.presence
    }

    /// Consume messages until the connection closes. Returns the error that
    /// ended the loop.
    pub async fn run(&mut self, connection: &dyn Connection) -> GatewayError {
        while connection.is_open() {
            debug!("listening for events");
            let result = match connection.receive().await {
                Ok(Some(message)) => self.handle(&message),
                Ok(None) => continue,
                Err(e) => Err(e),
            };
            match result {
                Ok(outcome) => debug!(?outcome, "message handled"),
                Err(GatewayError::Decode(reason)) => {
                    error!(error = %reason, "dropping malformed gateway message");
                }
                Err(e) => {
                    error!(error = %e, kind = e.error_kind(), "gateway connection lost");
                    return e;
                }
            }
        }
        error!("gateway connection closed");
        GatewayError::Closed
    }

    /// Process one decoded message.
    pub fn handle(&mut self, message: &GatewayMessage) -> Result<DispatchOutcome, GatewayError> {
        match message.kind() {
            Some(kind::READY) => {
                let user = message.d["user"]["username"].as_str().unwrap_or("unknown");
                info!(user, "gateway session ready");
                Ok(DispatchOutcome::Ready)
            }
            Some(kind::PRESENCE_UPDATE) => self.on_presence(&message.d),
            other => {
                if message.op == opcode::HEARTBEAT_ACK {
                    debug!("heartbeat acknowledged");
                } else {
                    debug!(op = message.op, kind = other, "ignoring message");
                }
                Ok(DispatchOutcome::Ignored)
            }
        }
    }

    fn on_presence(&mut self, payload: &Value) -> Result<DispatchOutcome, GatewayError> {
        let update = PresenceUpdate::from_payload(payload)?;
        let user = &update.user;

        let Some(activity) = update.music_activity() else {
            if self.presence.remove(&user.id) {
                info!(user_id = %user.id, "{} stopped listening", user.display());
                return Ok(DispatchOutcome::StoppedListening);
            }
            return Ok(DispatchOutcome::Idle);
        };

        // Presence is tracked for everyone, watched or not.
        self.presence.insert(&user.id);
        if !self.watched.allows(&user.id) {
            debug!(user_id = %user.id, "music activity outside watched set");
            return Ok(DispatchOutcome::Unwatched);
        }

        let record = activity.to_record(user)?;
        info!(
            user_id = %user.id,
            "{} is listening to {} by {} inside of the {} album",
            record.discord_name(),
            record.song(),
            record.artist(),
            record.album()
        );

        match self.sink.put(&record) {
            Ok(()) => Ok(DispatchOutcome::Recorded),
            Err(e) => {
                error!(error = %e, user_id = %user.id, "failed to store listening record");
                Ok(DispatchOutcome::SinkFailed)
            }
        }
    }
}
