//! Roster fetcher: polls the live-broadcast roster for a configured game,
//! paginating through every page, then reconciles stale stream rows.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::collaborators::{Datastore, RosterApi};
use crate::error::{RosterApiError, SnipeResult};
use crate::model::now_millis;

const RETRY_ATTEMPTS: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_secs(5);
const INTER_PAGE_DELAY: Duration = Duration::from_secs(3);
const CYCLE_DELAY: Duration = Duration::from_secs(60);

pub struct RosterFetcher {
    roster: Arc<dyn RosterApi>,
    datastore: Arc<dyn Datastore>,
    game_id: String,
    cancel: CancellationToken,
}

impl RosterFetcher {
    pub fn new(
        roster: Arc<dyn RosterApi>,
        datastore: Arc<dyn Datastore>,
        game_id: impl Into<String>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            roster,
            datastore,
            game_id: game_id.into(),
            cancel,
        }
    }

    /// Runs the fetch loop until cancelled: one cycle, then a 60s sleep,
    /// repeated. A failed cycle is logged and retried on the next tick.
    pub async fn run(&self) {
        loop {
            if self.cancel.is_cancelled() {
                return;
            }

            if let Err(e) = self.run_cycle().await {
                log::error!("roster fetch cycle failed: {e}");
            }

            tokio::select! {
                _ = self.cancel.cancelled() => return,
                _ = tokio::time::sleep(CYCLE_DELAY) => {}
            }
        }
    }

    /// Runs a single fetch cycle: paginate through every live broadcast,
    /// upsert each as online, then mark everything older than this
    /// cycle's start as offline.
    async fn run_cycle(&self) -> SnipeResult<()> {
        let started = now_millis();
        let mut cursor: Option<String> = None;
        let mut seen = 0usize;

        loop {
            if self.cancel.is_cancelled() {
                return Ok(());
            }

            let page = match self.fetch_page_with_retry(cursor.as_deref()).await {
                Ok(page) => page,
                Err(e) if self.cancel.is_cancelled() => {
                    log::debug!("roster fetch cancelled mid-retry: {e}");
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            };

            for entry in &page.streams {
                let id = entry.user_login.to_lowercase();
                self.datastore.create_stream(&id, started).await?;
                self.datastore.set_stream_online(&id, started).await?;
                seen += 1;
            }

            let has_next = page.next_cursor.is_some();
            cursor = page.next_cursor;

            if !has_next {
                break;
            }

            tokio::select! {
                _ = self.cancel.cancelled() => return Ok(()),
                _ = tokio::time::sleep(INTER_PAGE_DELAY) => {}
            }
        }

        self.datastore.update_stale_streams(started).await?;

        log::debug!("roster fetch cycle finished: {seen} streams observed");
        Ok(())
    }

    async fn fetch_page_with_retry(
        &self,
        cursor: Option<&str>,
    ) -> Result<crate::collaborators::RosterPage, RosterApiError> {
        let mut last_error = None;

        for attempt in 0..RETRY_ATTEMPTS {
            if attempt > 0 {
                log::warn!(
                    "retrying roster fetch (attempt {}/{RETRY_ATTEMPTS}) after {:?}",
                    attempt + 1,
                    RETRY_DELAY
                );
                tokio::select! {
                    _ = self.cancel.cancelled() => break,
                    _ = tokio::time::sleep(RETRY_DELAY) => {}
                }
            }

            match self.roster.get_live_streams(&self.game_id, cursor).await {
                Ok(page) => return Ok(page),
                Err(e) => last_error = Some(e),
            }
        }

        Err(last_error.expect("loop runs at least once"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{Datastore, InMemoryDatastore, LiveStreamRecord, RosterPage};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct TwoPageRoster {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl RosterApi for TwoPageRoster {
        async fn get_live_streams(
            &self,
            _game_id: &str,
            cursor: Option<&str>,
        ) -> Result<RosterPage, RosterApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if cursor.is_none() {
                Ok(RosterPage {
                    streams: vec![LiveStreamRecord {
                        user_login: "Alpha".to_string(),
                    }],
                    next_cursor: Some("page2".to_string()),
                })
            } else {
                Ok(RosterPage {
                    streams: vec![LiveStreamRecord {
                        user_login: "Beta".to_string(),
                    }],
                    next_cursor: None,
                })
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn consumes_final_page_before_stopping() {
        let roster = Arc::new(TwoPageRoster {
            calls: AtomicUsize::new(0),
        });
        let datastore: Arc<dyn Datastore> = Arc::new(InMemoryDatastore::new());

        let fetcher = RosterFetcher::new(
            roster.clone(),
            Arc::clone(&datastore),
            "123",
            CancellationToken::new(),
        );

        fetcher.run_cycle().await.unwrap();

        assert_eq!(roster.calls.load(Ordering::SeqCst), 2);
        let online = datastore.get_online_streams().await.unwrap();
        assert_eq!(online.len(), 2);
    }
}
