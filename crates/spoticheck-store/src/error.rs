use spoticheck_core::SinkError;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(String),

    #[error("invalid storage uri: {0}")]
    InvalidUri(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("corrupt document {id}: {reason}")]
    CorruptDocument { id: String, reason: String },

    #[error("IO error: {0}")]
    Io(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

impl From<StoreError> for SinkError {
    fn from(e: StoreError) -> Self {
        SinkError(e.to_string())
    }
}
