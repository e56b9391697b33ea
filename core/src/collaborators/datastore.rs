//! Datastore collaborator: persistence operations for stream state.
//!
//! The real backend is out of scope; this module defines the trait plus
//! an in-memory reference implementation built on `DashMap`.

use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::DatastoreError;
use crate::model::Stream;

/// The datastore operations the core requires.
#[async_trait]
pub trait Datastore: Send + Sync {
    /// Upserts a stream row, preserving any existing fields not given here.
    async fn create_stream(&self, id: &str, updated: i64) -> Result<(), DatastoreError>;

    /// Sets `online = true, updated = ts`.
    async fn set_stream_online(&self, id: &str, updated: i64) -> Result<(), DatastoreError>;

    /// Sets `online = false` for every stream with `updated < threshold`.
    async fn update_stale_streams(&self, threshold: i64) -> Result<(), DatastoreError>;

    /// Returns all rows with `online = true`.
    async fn get_online_streams(&self) -> Result<Vec<Stream>, DatastoreError>;

    /// Sets the cached media-playlist URL for a stream.
    async fn update_stream_url(&self, id: &str, url: &str) -> Result<(), DatastoreError>;

    /// Overwrites a stream's extracted player names.
    async fn update_stream_data(
        &self,
        id: &str,
        player_names: Vec<String>,
    ) -> Result<(), DatastoreError>;

    /// Returns rows with any player name within `distance` edits of `query`
    /// (case-insensitive), capped at `max_rows`.
    async fn search_streams_by_nickname(
        &self,
        query: &str,
        distance: usize,
        max_rows: usize,
    ) -> Result<Vec<Stream>, DatastoreError>;
}

/// In-memory reference `Datastore`, keyed by lowercase stream id.
#[derive(Default)]
pub struct InMemoryDatastore {
    streams: DashMap<String, Stream>,
}

impl InMemoryDatastore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Datastore for InMemoryDatastore {
    async fn create_stream(&self, id: &str, updated: i64) -> Result<(), DatastoreError> {
        self.streams
            .entry(id.to_string())
            .or_insert_with(|| Stream::new(id, updated));
        Ok(())
    }

    async fn set_stream_online(&self, id: &str, updated: i64) -> Result<(), DatastoreError> {
        let mut entry = self
            .streams
            .entry(id.to_string())
            .or_insert_with(|| Stream::new(id, updated));
        entry.online = true;
        entry.updated = updated;
        Ok(())
    }

    async fn update_stale_streams(&self, threshold: i64) -> Result<(), DatastoreError> {
        for mut entry in self.streams.iter_mut() {
            if entry.updated < threshold {
                entry.online = false;
            }
        }
        Ok(())
    }

    async fn get_online_streams(&self) -> Result<Vec<Stream>, DatastoreError> {
        Ok(self
            .streams
            .iter()
            .filter(|e| e.online)
            .map(|e| e.value().clone())
            .collect())
    }

    async fn update_stream_url(&self, id: &str, url: &str) -> Result<(), DatastoreError> {
        if let Some(mut entry) = self.streams.get_mut(id) {
            entry.url = Some(url.to_string());
        }
        Ok(())
    }

    async fn update_stream_data(
        &self,
        id: &str,
        player_names: Vec<String>,
    ) -> Result<(), DatastoreError> {
        if let Some(mut entry) = self.streams.get_mut(id) {
            entry.player_names = player_names;
        }
        Ok(())
    }

    async fn search_streams_by_nickname(
        &self,
        query: &str,
        distance: usize,
        max_rows: usize,
    ) -> Result<Vec<Stream>, DatastoreError> {
        let query_lower = query.to_lowercase();
        let mut matches: Vec<Stream> = self
            .streams
            .iter()
            .filter(|e| e.online)
            .filter(|e| {
                e.player_names
                    .iter()
                    .any(|name| strsim::levenshtein(&name.to_lowercase(), &query_lower) <= distance)
            })
            .map(|e| e.value().clone())
            .collect();

        matches.truncate(max_rows);
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn upsert_then_online_then_stale() {
        let ds = InMemoryDatastore::new();
        ds.create_stream("alice", 100).await.unwrap();
        ds.set_stream_online("alice", 100).await.unwrap();

        let online = ds.get_online_streams().await.unwrap();
        assert_eq!(online.len(), 1);

        ds.update_stale_streams(200).await.unwrap();
        let online = ds.get_online_streams().await.unwrap();
        assert!(online.is_empty());
    }

    #[tokio::test]
    async fn search_matches_within_edit_distance() {
        let ds = InMemoryDatastore::new();
        ds.create_stream("host", 100).await.unwrap();
        ds.set_stream_online("host", 100).await.unwrap();
        ds.update_stream_data("host", vec!["bobby".to_string()])
            .await
            .unwrap();

        let results = ds.search_streams_by_nickname("bob", 3, 20).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "host");
    }
}
