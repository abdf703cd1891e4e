//! Aggregates over stored listening records.
//!
//! Pure functions, order of input irrelevant. Play counts are keyed by the
//! external track id so distinct tracks with equal counts stay distinct.

use std::collections::HashMap;

use serde::Serialize;

use crate::record::ListeningRecord;

/// Play count for one track.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TrackCount {
    pub spotify_id: String,
    pub song: String,
    pub artist: String,
    pub album: String,
    pub plays: usize,
}

/// A track two listeners both played.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SharedTrack {
    pub spotify_id: String,
    pub song: String,
    pub artist: String,
    pub first_plays: usize,
    pub second_plays: usize,
}

/// Play counts per track, unordered.
pub fn play_counts(records: &[ListeningRecord]) -> Vec<TrackCount> {
    let mut counts: HashMap<&str, TrackCount> = HashMap::new();
    for record in records {
        counts
            .entry(record.spotify_id())
            .or_insert_with(|| TrackCount {
                spotify_id: record.spotify_id().to_string(),
                song: record.song().to_string(),
                artist: record.artist().to_string(),
                album: record.album().to_string(),
                plays: 0,
            })
            .plays += 1;
    }
    counts.into_values().collect()
}

/// Tracks ordered from most to least played. Ties sort by track id.
pub fn most_played(records: &[ListeningRecord]) -> Vec<TrackCount> {
    let mut counts = play_counts(records);
    counts.sort_by(|a, b| b.plays.cmp(&a.plays).then_with(|| a.spotify_id.cmp(&b.spotify_id)));
    counts
}

/// Tracks ordered from least to most played. Ties sort by track id.
pub fn least_played(records: &[ListeningRecord]) -> Vec<TrackCount> {
    let mut counts = play_counts(records);
    counts.sort_by(|a, b| a.plays.cmp(&b.plays).then_with(|| a.spotify_id.cmp(&b.spotify_id)));
    counts
}

pub fn by_artist<'a>(records: &'a [ListeningRecord], artist: &str) -> Vec<&'a ListeningRecord> {
    records.iter().filter(|r| r.artist() == artist).collect()
}

pub fn by_listener<'a>(records: &'a [ListeningRecord], id: &str) -> Vec<&'a ListeningRecord> {
    records.iter().filter(|r| r.discord_id() == id).collect()
}

/// Records belonging to either of two listeners.
pub fn by_listeners<'a>(
    records: &'a [ListeningRecord],
    first: &str,
    second: &str,
) -> Vec<&'a ListeningRecord> {
    records
        .iter()
        .filter(|r| r.discord_id() == first || r.discord_id() == second)
        .collect()
}

/// Tracks both listeners have at least one record for, ordered by combined
/// plays (descending) then track id.
///
/// When both ids name the same listener every one of their tracks is shared,
/// with the listener's play count on both sides.
pub fn shared_tracks(records: &[ListeningRecord], first: &str, second: &str) -> Vec<SharedTrack> {
    let mut tracks: HashMap<&str, SharedTrack> = HashMap::new();
    for record in by_listeners(records, first, second) {
        let entry = tracks
            .entry(record.spotify_id())
            .or_insert_with(|| SharedTrack {
                spotify_id: record.spotify_id().to_string(),
                song: record.song().to_string(),
                artist: record.artist().to_string(),
                first_plays: 0,
                second_plays: 0,
            });
        if record.discord_id() == first {
            entry.first_plays += 1;
        }
        if record.discord_id() == second {
            entry.second_plays += 1;
        }
    }
    let mut shared: Vec<_> = tracks
        .into_values()
        .filter(|t| t.first_plays > 0 && t.second_plays > 0)
        .collect();
    shared.sort_by(|a, b| {
        (b.first_plays + b.second_plays)
            .cmp(&(a.first_plays + a.second_plays))
            .then_with(|| a.spotify_id.cmp(&b.spotify_id))
    });
    shared
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Listener, Track};

    fn record(id: &str, artist: &str, listener: &str) -> ListeningRecord {
        ListeningRecord::from_millis(
            Track {
                song: format!("song {id}"),
                spotify_id: id.into(),
                artist: artist.into(),
                album: "album".into(),
            },
            Listener {
                id: listener.into(),
                name: format!("user {listener}"),
            },
            0,
            1000,
        )
        .unwrap()
    }

    fn sample() -> Vec<ListeningRecord> {
        vec![
            record("t1", "A", "1"),
            record("t2", "B", "1"),
            record("t1", "A", "2"),
            record("t3", "A", "3"),
            record("t1", "A", "3"),
            record("t2", "B", "2"),
        ]
    }

    #[test]
    fn empty_input_gives_empty_output() {
        assert!(most_played(&[]).is_empty());
        assert!(least_played(&[]).is_empty());
        assert!(by_artist(&[], "A").is_empty());
        assert!(by_listeners(&[], "1", "2").is_empty());
        assert!(shared_tracks(&[], "1", "2").is_empty());
    }

    #[test]
    fn most_played_orders_by_count() {
        let ranked = most_played(&sample());
        let ids: Vec<_> = ranked.iter().map(|t| (t.spotify_id.as_str(), t.plays)).collect();
        assert_eq!(ids, vec![("t1", 3), ("t2", 2), ("t3", 1)]);
    }

    #[test]
    fn least_played_orders_by_count() {
        let ranked = least_played(&sample());
        assert_eq!(ranked[0].spotify_id, "t3");
        assert_eq!(ranked.last().unwrap().spotify_id, "t1");
    }

    #[test]
    fn equal_counts_keep_tracks_distinct() {
        let records = vec![record("b", "X", "1"), record("a", "Y", "1")];
        let ranked = most_played(&records);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].spotify_id, "a");
        assert_eq!(ranked[1].spotify_id, "b");
    }

    #[test]
    fn filters() {
        let records = sample();
        assert_eq!(by_artist(&records, "A").len(), 4);
        assert_eq!(by_artist(&records, "a").len(), 0);
        assert_eq!(by_listener(&records, "3").len(), 2);
        assert_eq!(by_listeners(&records, "1", "2").len(), 4);
    }

    #[test]
    fn shared_tracks_need_both_listeners() {
        let shared = shared_tracks(&sample(), "1", "3");
        assert_eq!(shared.len(), 1);
        assert_eq!(shared[0].spotify_id, "t1");
        assert_eq!((shared[0].first_plays, shared[0].second_plays), (1, 1));
    }

    #[test]
    fn same_listener_twice_shares_all_their_tracks() {
        let shared = shared_tracks(&sample(), "1", "1");
        let ids: Vec<_> = shared
            .iter()
            .map(|t| (t.spotify_id.as_str(), t.first_plays, t.second_plays))
            .collect();
        assert_eq!(ids, vec![("t1", 1, 1), ("t2", 1, 1)]);
    }
}
