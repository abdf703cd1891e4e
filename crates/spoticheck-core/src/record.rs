use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::RecordError;

/// Track metadata lifted from a music activity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Track {
    pub song: String,
    pub spotify_id: String,
    pub artist: String,
    pub album: String,
}

/// The watched identity a record was observed for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Listener {
    pub id: String,
    pub name: String,
}

/// One observed "user X is listening to song Y" fact.
///
/// Immutable once built. Serializes to a flat document whose keys match the
/// stored collection; window instants are epoch milliseconds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredRecord")]
pub struct ListeningRecord {
    song: String,
    spotify_id: String,
    artist: String,
    album: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    song_start: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    song_probably_end: DateTime<Utc>,
    discord_id: String,
    discord_name: String,
}

impl ListeningRecord {
    /// Build a record, rejecting a window that ends before it starts.
    pub fn new(
        track: Track,
        listener: Listener,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Self, RecordError> {
        if start > end {
            return Err(RecordError::InvertedWindow { start, end });
        }
        Ok(Self {
            song: track.song,
            spotify_id: track.spotify_id,
            artist: track.artist,
            album: track.album,
            song_start: start,
            song_probably_end: end,
            discord_id: listener.id,
            discord_name: listener.name,
        })
    }

    /// Same as [`ListeningRecord::new`] with the window given as epoch millis.
    pub fn from_millis(
        track: Track,
        listener: Listener,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<Self, RecordError> {
        Self::new(track, listener, instant(start_ms)?, instant(end_ms)?)
    }

    pub fn song(&self) -> &str {
        &self.song
    }

    pub fn spotify_id(&self) -> &str {
        &self.spotify_id
    }

    pub fn artist(&self) -> &str {
        &self.artist
    }

    pub fn album(&self) -> &str {
        &self.album
    }

    pub fn song_start(&self) -> DateTime<Utc> {
        self.song_start
    }

    pub fn song_probably_end(&self) -> DateTime<Utc> {
        self.song_probably_end
    }

    pub fn discord_id(&self) -> &str {
        &self.discord_id
    }

    pub fn discord_name(&self) -> &str {
        &self.discord_name
    }

    /// Flat key/value document handed to the store.
    pub fn to_document(&self) -> serde_json::Value {
        serde_json::json!({
            "song": self.song,
            "spotify_id": self.spotify_id,
            "artist": self.artist,
            "album": self.album,
            "song_start": self.song_start.timestamp_millis(),
            "song_probably_end": self.song_probably_end.timestamp_millis(),
            "discord_id": self.discord_id,
            "discord_name": self.discord_name,
        })
    }
}

fn instant(ms: i64) -> Result<DateTime<Utc>, RecordError> {
    DateTime::from_timestamp_millis(ms).ok_or(RecordError::TimestampOutOfRange(ms))
}

/// Wire shape of a stored document, validated on the way in.
#[derive(Deserialize)]
struct StoredRecord {
    song: String,
    spotify_id: String,
    artist: String,
    album: String,
    song_start: i64,
    song_probably_end: i64,
    discord_id: String,
    discord_name: String,
}

impl TryFrom<StoredRecord> for ListeningRecord {
    type Error = RecordError;

    fn try_from(raw: StoredRecord) -> Result<Self, Self::Error> {
        ListeningRecord::from_millis(
            Track {
                song: raw.song,
                spotify_id: raw.spotify_id,
                artist: raw.artist,
                album: raw.album,
            },
            Listener {
                id: raw.discord_id,
                name: raw.discord_name,
            },
            raw.song_start,
            raw.song_probably_end,
        )
    }
}
