use chrono::Utc;
use serde_json::Value;
use tracing::instrument;
use uuid::Uuid;

use crate::database::Database;
use crate::error::StoreError;

/// A stored JSON document.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub id: String,
    pub body: Value,
}

/// Schemaless JSON documents grouped into named collections.
pub struct DocumentStore {
    db: Database,
}

impl DocumentStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Insert one document and return its generated id.
    #[instrument(skip(self, body))]
    pub fn insert(&self, collection: &str, body: &Value) -> Result<String, StoreError> {
        if !body.is_object() {
            return Err(StoreError::Serialization(
                "documents must be JSON objects".into(),
            ));
        }
        let id = Uuid::now_v7().to_string();
        let encoded = serde_json::to_string(body)?;
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO documents (id, collection, body, inserted_at) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![id, collection, encoded, Utc::now().to_rfc3339()],
            )?;
            Ok(())
        })?;
        Ok(id)
    }

    /// Every document in `collection`, in insertion order.
    #[instrument(skip(self))]
    pub fn find_all(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let rows: Vec<(String, String)> = self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, body FROM documents WHERE collection = ?1 ORDER BY rowid",
            )?;
            let rows = stmt
                .query_map([collection], |row| Ok((row.get(0)?, row.get(1)?)))?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })?;

        rows.into_iter()
            .map(|(id, body)| -> Result<Document, StoreError> {
                let body = serde_json::from_str(&body).map_err(|e| StoreError::CorruptDocument {
                    id: id.clone(),
                    reason: e.to_string(),
                })?;
                Ok(Document { id, body })
            })
            .collect()
    }

    #[instrument(skip(self))]
    pub fn count(&self, collection: &str) -> Result<u64, StoreError> {
        let n: i64 = self.db.with_conn(|conn| {
            Ok(conn.query_row(
                "SELECT COUNT(*) FROM documents WHERE collection = ?1",
                [collection],
                |row| row.get(0),
            )?)
        })?;
        Ok(n.max(0) as u64)
    }
}
