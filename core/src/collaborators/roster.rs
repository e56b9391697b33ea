//! Roster collaborator: paginated listing of currently-live broadcasts,
//! filtered to a single configured game id.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::RosterApiError;

/// One entry from a roster page.
#[derive(Debug, Clone, Deserialize)]
pub struct LiveStreamRecord {
    pub user_login: String,
}

/// One page of roster results, plus the cursor to fetch the next page.
/// `next_cursor` is `None` when this is the last page.
#[derive(Debug, Clone)]
pub struct RosterPage {
    pub streams: Vec<LiveStreamRecord>,
    pub next_cursor: Option<String>,
}

/// Paginated roster listing, filtered to a single game id.
#[async_trait]
pub trait RosterApi: Send + Sync {
    /// Fetches one page (up to 100 entries) of currently-live broadcasts
    /// for `game_id`, starting after `cursor` (`None` for the first page).
    async fn get_live_streams(
        &self,
        game_id: &str,
        cursor: Option<&str>,
    ) -> Result<RosterPage, RosterApiError>;
}

#[derive(Deserialize)]
struct RosterResponse {
    data: Vec<LiveStreamRecord>,
    pagination: RosterPagination,
}

#[derive(Deserialize)]
struct RosterPagination {
    #[serde(default)]
    cursor: Option<String>,
}

/// Default `RosterApi` implementation: a plain HTTP GET against the
/// streaming platform's "get streams" endpoint. The caller is responsible
/// for handing in a `reqwest::Client` that already carries auth headers;
/// authentication itself is out of scope for this core.
pub struct HttpRosterClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRosterClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl RosterApi for HttpRosterClient {
    async fn get_live_streams(
        &self,
        game_id: &str,
        cursor: Option<&str>,
    ) -> Result<RosterPage, RosterApiError> {
        let mut query = vec![
            ("game_id", game_id.to_string()),
            ("first", "100".to_string()),
            ("type", "live".to_string()),
        ];
        if let Some(cursor) = cursor {
            query.push(("after", cursor.to_string()));
        }

        let resp = self
            .client
            .get(format!("{}/streams", self.base_url))
            .query(&query)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(RosterApiError::Status(resp.status().as_u16()));
        }

        let parsed: RosterResponse = resp
            .json()
            .await
            .map_err(|e| RosterApiError::Decode(e.to_string()))?;

        Ok(RosterPage {
            streams: parsed.data,
            next_cursor: parsed.pagination.cursor.filter(|c| !c.is_empty()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeRoster {
        pages: Vec<RosterPage>,
    }

    #[async_trait]
    impl RosterApi for FakeRoster {
        async fn get_live_streams(
            &self,
            _game_id: &str,
            cursor: Option<&str>,
        ) -> Result<RosterPage, RosterApiError> {
            let idx = cursor.map(|c| c.parse::<usize>().unwrap()).unwrap_or(0);
            Ok(self.pages[idx].clone())
        }
    }

    impl Clone for RosterPage {
        fn clone(&self) -> Self {
            Self {
                streams: self.streams.clone(),
                next_cursor: self.next_cursor.clone(),
            }
        }
    }

    #[tokio::test]
    async fn fake_roster_returns_configured_pages() {
        let roster = FakeRoster {
            pages: vec![RosterPage {
                streams: vec![LiveStreamRecord {
                    user_login: "Alice".to_string(),
                }],
                next_cursor: None,
            }],
        };
        let page = roster.get_live_streams("123", None).await.unwrap();
        assert_eq!(page.streams.len(), 1);
        assert!(page.next_cursor.is_none());
    }
}
