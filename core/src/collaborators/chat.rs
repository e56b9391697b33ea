//! Chat collaborator: `SendMessage(channel, text) -> ok|error`.
//!
//! User and auth management are out of scope for this core; broadcaster
//! and sender id lookups are left to whatever builds the HTTP client.

use async_trait::async_trait;

use crate::error::ChatError;

#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Sends `text` to `channel`'s chat.
    async fn send_message(&self, channel: &str, text: &str) -> Result<(), ChatError>;
}

/// Default `ChatApi` implementation over HTTP.
pub struct HttpChatClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpChatClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl ChatApi for HttpChatClient {
    async fn send_message(&self, channel: &str, text: &str) -> Result<(), ChatError> {
        #[derive(serde::Serialize)]
        struct Body<'a> {
            channel: &'a str,
            message: &'a str,
        }

        let resp = self
            .client
            .post(format!("{}/chat/messages", self.base_url))
            .json(&Body {
                channel,
                message: text,
            })
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(ChatError::Status(resp.status().as_u16()));
        }
        Ok(())
    }
}
