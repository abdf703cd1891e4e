//! Gateway wire format.
//!
//! Inbound frames are `{op, t, s, d}` envelopes; outbound frames are `{op, d}`.
//! Only the handful of opcodes and dispatch kinds the collector needs are
//! modelled. Payload fields are optional except the ones a message cannot do
//! without.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::errors::{GatewayError, RecordError};
use crate::record::{Listener, ListeningRecord, Track};

pub mod opcode {
    pub const DISPATCH: u8 = 0;
    pub const HEARTBEAT: u8 = 1;
    pub const IDENTIFY: u8 = 2;
    pub const HELLO: u8 = 10;
    pub const HEARTBEAT_ACK: u8 = 11;
}

pub mod kind {
    pub const READY: &str = "READY";
    pub const PRESENCE_UPDATE: &str = "PRESENCE_UPDATE";
}

/// Intent bit selecting presence-update delivery.
pub const GUILD_PRESENCES: u64 = 1 << 9;

/// Activity name that marks a music-listening activity.
pub const MUSIC_ACTIVITY: &str = "Spotify";

/// A decoded inbound frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GatewayMessage {
    pub op: u8,
    #[serde(default)]
    pub t: Option<String>,
    #[serde(default)]
    pub s: Option<u64>,
    #[serde(default)]
    pub d: Value,
}

impl GatewayMessage {
    pub fn decode(text: &str) -> Result<Self, GatewayError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Dispatch kind tag, if any.
    pub fn kind(&self) -> Option<&str> {
        self.t.as_deref()
    }

    pub fn dispatch(kind: &str, d: Value) -> Self {
        Self {
            op: opcode::DISPATCH,
            t: Some(kind.to_string()),
            s: None,
            d,
        }
    }

    /// Heartbeat interval announced by a HELLO frame.
    pub fn heartbeat_interval(&self) -> Result<Duration, GatewayError> {
        if self.op != opcode::HELLO {
            return Err(GatewayError::Handshake(format!(
                "expected HELLO (op {}), got op {}",
                opcode::HELLO,
                self.op
            )));
        }
        self.d
            .get("heartbeat_interval")
            .and_then(Value::as_u64)
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
            .ok_or_else(|| GatewayError::Handshake("HELLO without a heartbeat_interval".into()))
    }
}

/// An outbound `{op, d}` frame.
#[derive(Clone, Debug, PartialEq)]
pub struct OutboundMessage {
    pub op: u8,
    pub d: Value,
}

impl OutboundMessage {
    pub fn heartbeat() -> Self {
        Self {
            op: opcode::HEARTBEAT,
            d: Value::Null,
        }
    }

    pub fn identify(identify: &Identify) -> Self {
        Self {
            op: opcode::IDENTIFY,
            d: json!({
                "token": identify.token,
                "intents": identify.intents,
                "presence": identify.presence,
                "properties": identify.properties,
            }),
        }
    }

    pub fn encode(&self) -> String {
        json!({ "op": self.op, "d": self.d }).to_string()
    }
}

/// IDENTIFY payload. The token is redacted from `Debug` output.
#[derive(Clone, PartialEq)]
pub struct Identify {
    pub token: String,
    pub intents: u64,
    pub presence: InitialPresence,
    pub properties: ClientProperties,
}

impl Identify {
    /// Identify with presence-only intents and an idle online presence.
    pub fn new(token: impl Into<String>, properties: ClientProperties) -> Self {
        Self {
            token: token.into(),
            intents: GUILD_PRESENCES,
            presence: InitialPresence::default(),
            properties,
        }
    }
}

impl fmt::Debug for Identify {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identify")
            .field("token", &"[redacted]")
            .field("intents", &self.intents)
            .field("presence", &self.presence)
            .field("properties", &self.properties)
            .finish()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InitialPresence {
    pub activities: Vec<Value>,
    pub afk: bool,
    pub status: String,
    pub since: u64,
}

impl Default for InitialPresence {
    fn default() -> Self {
        Self {
            activities: Vec::new(),
            afk: false,
            status: "online".into(),
            since: 0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClientProperties {
    pub os: String,
    pub browser: String,
    pub device: String,
}

impl Default for ClientProperties {
    fn default() -> Self {
        Self {
            os: "linux".into(),
            browser: "chrome".into(),
            device: "pc".into(),
        }
    }
}

/// `PRESENCE_UPDATE` payload. A missing `activities` list fails decoding.
#[derive(Clone, Debug, Deserialize)]
pub struct PresenceUpdate {
    pub user: PresenceUser,
    pub activities: Vec<Activity>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PresenceUser {
    pub id: String,
    #[serde(default)]
    pub username: Option<String>,
}

impl PresenceUser {
    /// Name for log lines, falling back to the id.
    pub fn display(&self) -> &str {
        self.username.as_deref().unwrap_or(&self.id)
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Activity {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub assets: Option<ActivityAssets>,
    #[serde(default)]
    pub timestamps: Option<ActivityTimestamps>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ActivityAssets {
    #[serde(default)]
    pub large_text: Option<String>,
    #[serde(default)]
    pub large_image: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ActivityTimestamps {
    #[serde(default)]
    pub start: Option<i64>,
    #[serde(default)]
    pub end: Option<i64>,
}

impl PresenceUpdate {
    pub fn from_payload(d: &Value) -> Result<Self, GatewayError> {
        Ok(Self::deserialize(d)?)
    }

    /// First music activity in list order.
    pub fn music_activity(&self) -> Option<&Activity> {
        self.activities.iter().find(|a| a.is_music())
    }
}

impl Activity {
    pub fn is_music(&self) -> bool {
        self.name == MUSIC_ACTIVITY
    }

    /// Map this activity onto a record for `user`.
    pub fn to_record(&self, user: &PresenceUser) -> Result<ListeningRecord, RecordError> {
        let assets = self.assets.as_ref();
        let timestamps = self.timestamps.as_ref();
        let track = Track {
            song: required(self.details.as_ref(), "details")?,
            spotify_id: required(assets.and_then(|a| a.large_image.as_ref()), "assets.large_image")?,
            artist: required(self.state.as_ref(), "state")?,
            album: required(assets.and_then(|a| a.large_text.as_ref()), "assets.large_text")?,
        };
        let listener = Listener {
            id: user.id.clone(),
            name: required(user.username.as_ref(), "user.username")?,
        };
        let start = timestamps
            .and_then(|t| t.start)
            .ok_or(RecordError::MissingField("timestamps.start"))?;
        let end = timestamps
            .and_then(|t| t.end)
            .ok_or(RecordError::MissingField("timestamps.end"))?;
        ListeningRecord::from_millis(track, listener, start, end)
    }
}

fn required(value: Option<&String>, field: &'static str) -> Result<String, RecordError> {
    value.cloned().ok_or(RecordError::MissingField(field))
}
