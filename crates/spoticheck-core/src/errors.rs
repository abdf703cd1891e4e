use chrono::{DateTime, Utc};

/// Failures on the gateway connection and its inbound message stream.
///
/// Only [`GatewayError::Decode`] is recoverable: it is scoped to a single
/// message and the read loop keeps going. Everything else ends the session.
#[derive(Clone, Debug, thiserror::Error)]
pub enum GatewayError {
    /// Socket-level failure while connecting, reading, or writing.
    #[error("connection error: {0}")]
    Connection(String),

    /// The connection has been reported closed.
    #[error("connection closed")]
    Closed,

    /// The opening HELLO exchange could not be completed.
    #[error("handshake failed: {0}")]
    Handshake(String),

    /// An inbound frame or payload did not have the expected shape.
    #[error("decode error: {0}")]
    Decode(String),
}

impl GatewayError {
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Decode(_))
    }

    /// Short classification string for logging.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::Connection(_) => "connection",
            Self::Closed => "closed",
            Self::Handshake(_) => "handshake",
            Self::Decode(_) => "decode",
        }
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(e: serde_json::Error) -> Self {
        GatewayError::Decode(e.to_string())
    }
}

/// Reasons a music activity cannot become a [`crate::ListeningRecord`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("timestamp {0} is out of range")]
    TimestampOutOfRange(i64),

    #[error("listening window ends before it starts ({start} > {end})")]
    InvertedWindow {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

impl From<RecordError> for GatewayError {
    fn from(e: RecordError) -> Self {
        GatewayError::Decode(e.to_string())
    }
}

/// A sink rejected or failed a write.
#[derive(Clone, Debug, thiserror::Error)]
#[error("sink write failed: {0}")]
pub struct SinkError(pub String);
