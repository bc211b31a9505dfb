//! Support chat backed by the upstream webchat endpoints.
//!
//! There is no push channel; a widget polls for messages newer than the last
//! timestamp it has seen.

use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use log::{debug, warn};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::error::{CurrexError, Result};

pub const CHAT_POLL_INTERVAL: Duration = Duration::from_millis(2500);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebChatMessage {
    pub id: String,
    /// `client`, `admin`, or whatever the backend labels other senders.
    pub author: String,
    pub text: String,
    pub timestamp: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionBody {
    session_key: Option<String>,
}

#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    base_url: String,
}

impl ChatClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        ChatClient {
            client,
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Opens or resumes a session. Falls back to `existing` (or an empty key)
    /// when the backend does not hand one out.
    pub async fn ensure_session(&self, existing: Option<&str>) -> Result<String> {
        let response = self
            .client
            .post(self.url("/api/webchat/session"))
            .json(&json!({ "sessionKey": existing }))
            .send()
            .await?;
        let body: SessionBody = response.json().await?;

        Ok(body
            .session_key
            .filter(|key| !key.is_empty())
            .or_else(|| existing.map(str::to_string))
            .unwrap_or_default())
    }

    /// Messages of the session, optionally only those after `since`. A
    /// non-success status yields an empty list.
    pub async fn list_messages(
        &self,
        session_key: &str,
        since: Option<&str>,
    ) -> Result<Vec<WebChatMessage>> {
        let mut params = vec![("sessionKey", session_key)];
        if let Some(since) = since {
            params.push(("since", since));
        }
        let url = Url::parse_with_params(&self.url("/api/webchat/messages"), &params)
            .map_err(|e| CurrexError::Config(format!("webchat url: {}", e)))?;

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            debug!("Webchat list returned {}", response.status());
            return Ok(Vec::new());
        }
        Ok(response.json().await?)
    }

    pub async fn send_message(&self, session_key: &str, text: &str) -> Result<bool> {
        let response = self
            .client
            .post(self.url("/api/webchat/messages"))
            .json(&json!({ "sessionKey": session_key, "text": text }))
            .send()
            .await?;
        Ok(response.status().is_success())
    }
}

/// Message log of one chat widget, with the polling cursor.
pub struct ChatFeed {
    client: ChatClient,
    session_key: String,
    cursor: Option<String>,
    messages: Vec<WebChatMessage>,
}

impl ChatFeed {
    pub async fn open(client: ChatClient, existing: Option<&str>) -> Result<Self> {
        let session_key = client.ensure_session(existing).await?;
        Ok(ChatFeed {
            client,
            session_key,
            cursor: None,
            messages: Vec::new(),
        })
    }

    pub fn session_key(&self) -> &str {
        &self.session_key
    }

    pub fn messages(&self) -> &[WebChatMessage] {
        &self.messages
    }

    /// Fetches messages newer than the cursor and appends them. Returns the
    /// new messages.
    pub async fn poll(&mut self) -> Result<Vec<WebChatMessage>> {
        if self.session_key.is_empty() {
            return Ok(Vec::new());
        }

        let fresh = self
            .client
            .list_messages(&self.session_key, self.cursor.as_deref())
            .await?;
        if let Some(last) = fresh.last() {
            self.cursor = Some(last.timestamp.clone());
        }
        self.messages.extend(fresh.iter().cloned());
        Ok(fresh)
    }

    /// Sends `text` and echoes it into the log once the backend accepts it.
    pub async fn send(&mut self, text: &str) -> Result<bool> {
        let text = text.trim();
        if text.is_empty() || self.session_key.is_empty() {
            return Ok(false);
        }

        let accepted = self.client.send_message(&self.session_key, text).await?;
        if accepted {
            self.messages.push(WebChatMessage {
                id: Uuid::new_v4().to_string(),
                author: "client".to_string(),
                text: text.to_string(),
                timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            });
        }
        Ok(accepted)
    }

    /// Polls every `every` and forwards new messages until `tx` is closed.
    /// Poll errors are logged and skipped.
    pub async fn watch(mut self, every: Duration, tx: mpsc::Sender<WebChatMessage>) {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            if tx.is_closed() {
                debug!("Chat watcher for {} stopped", self.session_key);
                return;
            }

            match self.poll().await {
                Ok(fresh) => {
                    for message in fresh {
                        if tx.send(message).await.is_err() {
                            return;
                        }
                    }
                }
                Err(e) => warn!("Chat poll failed: {}", e),
            }
        }
    }
}
