use parking_lot::Mutex;

use crate::errors::SinkError;
use crate::record::ListeningRecord;

/// Durable destination for listening records.
///
/// Writes are synchronous and best-effort: each record is offered once and
/// never updated.
pub trait Sink: Send + Sync {
    fn put(&self, record: &ListeningRecord) -> Result<(), SinkError>;
}

/// In-memory collector.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<ListeningRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<ListeningRecord> {
        self.records.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl Sink for MemorySink {
    fn put(&self, record: &ListeningRecord) -> Result<(), SinkError> {
        self.records.lock().push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Listener, Track};

    #[test]
    fn memory_sink_collects_in_order() {
        let sink = MemorySink::new();
        for (i, song) in ["a", "b"].iter().enumerate() {
            let record = ListeningRecord::from_millis(
                Track {
                    song: (*song).into(),
                    spotify_id: format!("id-{i}"),
                    artist: "x".into(),
                    album: "y".into(),
                },
                Listener {
                    id: "1".into(),
                    name: "n".into(),
                },
                0,
                1,
            )
            .unwrap();
            sink.put(&record).unwrap();
        }
        let songs: Vec<_> = sink.records().iter().map(|r| r.song().to_string()).collect();
        assert_eq!(songs, vec!["a", "b"]);
    }
}
