//! Alert loop: periodically checks each configured streamer's watch-list
//! of nickname queries against the search index, and notifies chat on a
//! new (non-deduped) match.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::collaborators::{ChatApi, Datastore};
use crate::model::{AlertEntry, TriggerKey};
use crate::ttl_map::TtlMap;

use super::search::search_streams;

pub struct AlertLoop {
    datastore: Arc<dyn Datastore>,
    chat: Arc<dyn ChatApi>,
    entries: Vec<AlertEntry>,
    dedupe: TtlMap<TriggerKey, ()>,
    ttl: Duration,
    check_interval: Duration,
    dry_run: bool,
    cancel: CancellationToken,
}

impl AlertLoop {
    pub fn new(
        datastore: Arc<dyn Datastore>,
        chat: Arc<dyn ChatApi>,
        entries: Vec<AlertEntry>,
        ttl: Duration,
        check_interval: Duration,
        dry_run: bool,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            datastore,
            chat,
            entries,
            dedupe: TtlMap::new(),
            ttl,
            check_interval,
            dry_run,
            cancel,
        }
    }

    /// Runs the alert loop until cancelled: check every configured entry,
    /// then sleep, repeated.
    pub async fn run(&self) {
        loop {
            if self.cancel.is_cancelled() {
                return;
            }

            for entry in &self.entries {
                if let Err(e) = self.check_entry(entry).await {
                    log::error!("alert check failed for {}: {e}", entry.streamer);
                }
            }

            tokio::select! {
                _ = self.cancel.cancelled() => return,
                _ = tokio::time::sleep(self.check_interval) => {}
            }
        }
    }

    /// Searches `entry`'s queries in order and stops at the first match
    /// that isn't the streamer's own name. TTL dedupe only gates whether
    /// that single match gets notified, never which match "wins".
    async fn check_entry(&self, entry: &AlertEntry) -> Result<(), crate::error::DatastoreError> {
        let mut matched_id = None;
        for query in &entry.queries {
            let matches = search_streams(&self.datastore, query).await?;
            if let Some(matched) = matches
                .into_iter()
                .find(|s| !s.id.eq_ignore_ascii_case(&entry.streamer))
            {
                matched_id = Some(matched.id);
                break;
            }
        }

        let Some(matched_id) = matched_id else {
            return Ok(());
        };

        let key = TriggerKey {
            alerted_streamer: entry.streamer.clone(),
            matched_streamer: matched_id.clone(),
        };

        if self.dedupe.get_or_set(key, (), self.ttl) {
            return Ok(());
        }

        self.notify(&entry.streamer, &matched_id).await;
        Ok(())
    }

    async fn notify(&self, streamer: &str, matched: &str) {
        let text = format!(
            "@{streamer} you might be playing vs a streamer '{matched}', please check"
        );

        if self.dry_run {
            log::info!("[dry-run] would notify {streamer}: {text}");
            return;
        }

        if let Err(e) = self.chat.send_message(streamer, &text).await {
            log::error!("failed to send chat alert to {streamer}: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{Datastore, InMemoryDatastore};
    use crate::error::ChatError;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingChat {
        sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl ChatApi for RecordingChat {
        async fn send_message(&self, channel: &str, text: &str) -> Result<(), ChatError> {
            self.sent
                .lock()
                .push((channel.to_string(), text.to_string()));
            Ok(())
        }
    }

    async fn seed(datastore: &Arc<dyn Datastore>, id: &str, nickname: &str) {
        datastore.create_stream(id, 0).await.unwrap();
        datastore.set_stream_online(id, 0).await.unwrap();
        datastore
            .update_stream_data(id, vec![nickname.to_string()])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn self_match_is_skipped_in_favor_of_next_query() {
        let datastore: Arc<dyn Datastore> = Arc::new(InMemoryDatastore::new());
        seed(&datastore, "alice", "alice").await;
        seed(&datastore, "bob", "enemyname").await;

        let chat = Arc::new(RecordingChat::default());
        let entry = AlertEntry {
            streamer: "alice".to_string(),
            queries: vec!["alice".to_string(), "enemyname".to_string()],
        };

        let alert_loop = AlertLoop::new(
            Arc::clone(&datastore),
            chat.clone() as Arc<dyn ChatApi>,
            vec![],
            Duration::from_secs(60),
            Duration::from_secs(60),
            false,
            CancellationToken::new(),
        );

        alert_loop.check_entry(&entry).await.unwrap();

        let sent = chat.sent.lock();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "alice");
        assert!(sent[0].1.contains("bob"));
    }

    #[tokio::test]
    async fn repeat_match_within_ttl_is_not_resent() {
        let datastore: Arc<dyn Datastore> = Arc::new(InMemoryDatastore::new());
        seed(&datastore, "bob", "enemyname").await;

        let chat = Arc::new(RecordingChat::default());
        let entry = AlertEntry {
            streamer: "alice".to_string(),
            queries: vec!["enemyname".to_string()],
        };

        let alert_loop = AlertLoop::new(
            Arc::clone(&datastore),
            chat.clone() as Arc<dyn ChatApi>,
            vec![],
            Duration::from_secs(60),
            Duration::from_secs(60),
            false,
            CancellationToken::new(),
        );

        alert_loop.check_entry(&entry).await.unwrap();
        alert_loop.check_entry(&entry).await.unwrap();

        assert_eq!(chat.sent.lock().len(), 1);
    }
}
