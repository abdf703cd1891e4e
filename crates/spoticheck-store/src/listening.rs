use spoticheck_core::{ListeningRecord, Sink, SinkError};
use tracing::{debug, instrument};

use crate::database::Database;
use crate::documents::DocumentStore;
use crate::error::StoreError;

/// Listening records stored as documents in one collection.
pub struct ListeningRepo {
    docs: DocumentStore,
    collection: String,
}

impl ListeningRepo {
    pub fn new(db: Database, collection: impl Into<String>) -> Self {
        Self {
            docs: DocumentStore::new(db),
            collection: collection.into(),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    #[instrument(skip(self, record), fields(collection = %self.collection, user_id = record.discord_id()))]
    pub fn insert(&self, record: &ListeningRecord) -> Result<String, StoreError> {
        let id = self.docs.insert(&self.collection, &record.to_document())?;
        debug!(document_id = %id, "listening record stored");
        Ok(id)
    }

    /// Every stored record. A document that no longer parses as a record
    /// fails the whole read.
    #[instrument(skip(self), fields(collection = %self.collection))]
    pub fn all(&self) -> Result<Vec<ListeningRecord>, StoreError> {
        self.docs
            .find_all(&self.collection)?
            .into_iter()
            .map(|doc| {
                serde_json::from_value(doc.body).map_err(|e| StoreError::CorruptDocument {
                    id: doc.id,
                    reason: e.to_string(),
                })
            })
            .collect()
    }

    pub fn count(&self) -> Result<u64, StoreError> {
        self.docs.count(&self.collection)
    }
}

impl Sink for ListeningRepo {
    fn put(&self, record: &ListeningRecord) -> Result<(), SinkError> {
        self.insert(record)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use spoticheck_core::{Listener, Track};

    fn record(song: &str, listener: &str) -> ListeningRecord {
        ListeningRecord::from_millis(
            Track {
                song: song.into(),
                spotify_id: format!("spotify:track:{song}"),
                artist: "Artist".into(),
                album: "Album".into(),
            },
            Listener {
                id: listener.into(),
                name: format!("user-{listener}"),
            },
            1000,
            5000,
        )
        .unwrap()
    }

    fn repo(db: &Database) -> ListeningRepo {
        ListeningRepo::new(db.clone(), "spotify_statistics")
    }

    #[test]
    fn put_through_sink_and_read_back() {
        let db = Database::in_memory().unwrap();
        let repo = repo(&db);
        let sink: &dyn Sink = &repo;
        sink.put(&record("a", "42")).unwrap();
        sink.put(&record("b", "7")).unwrap();

        let all = repo.all().unwrap();
        assert_eq!(all, vec![record("a", "42"), record("b", "7")]);
        assert_eq!(repo.count().unwrap(), 2);
    }

    #[test]
    fn stored_body_is_flat_document() {
        let db = Database::in_memory().unwrap();
        repo(&db).insert(&record("a", "42")).unwrap();

        let docs = DocumentStore::new(db).find_all("spotify_statistics").unwrap();
        assert_eq!(docs[0].body["song_start"], json!(1000));
        assert_eq!(docs[0].body["discord_id"], json!("42"));
    }

    #[test]
    fn collections_are_isolated() {
        let db = Database::in_memory().unwrap();
        repo(&db).insert(&record("a", "42")).unwrap();
        let other = ListeningRepo::new(db, "elsewhere");
        assert!(other.all().unwrap().is_empty());
    }

    #[test]
    fn foreign_document_is_corrupt() {
        let db = Database::in_memory().unwrap();
        DocumentStore::new(db.clone())
            .insert("spotify_statistics", &json!({"song": "only a title"}))
            .unwrap();
        let err = repo(&db).all().unwrap_err();
        assert!(matches!(err, StoreError::CorruptDocument { .. }));
    }

    #[test]
    fn store_errors_become_sink_errors() {
        let err: SinkError = StoreError::Database("locked".into()).into();
        assert!(err.to_string().contains("locked"));
    }
}
