use log::{debug, warn};
use reqwest::Client;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendRequest<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    chat_id: Option<&'a str>,
}

/// Relays admin notices to the operators' Telegram chat through the backend.
/// Without a chat id the backend's default chat is used.
#[derive(Clone)]
pub struct TelegramNotifier {
    client: Client,
    base_url: String,
    admin_key: String,
    chat_id: Option<String>,
}

impl TelegramNotifier {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        admin_key: impl Into<String>,
        chat_id: Option<String>,
    ) -> Self {
        TelegramNotifier {
            client,
            base_url: base_url.into(),
            admin_key: admin_key.into(),
            chat_id,
        }
    }

    /// True when the backend accepted the message.
    pub async fn send(&self, text: &str) -> bool {
        let body = SendRequest {
            text,
            chat_id: self.chat_id.as_deref(),
        };

        let result = self
            .client
            .post(format!("{}/api/admin/telegram/send", self.base_url))
            .header("X-CURREX-ADMIN-KEY", &self.admin_key)
            .json(&body)
            .send()
            .await;

        match result {
            Ok(response) => {
                debug!("Telegram relay returned {}", response.status());
                response.status().is_success()
            }
            Err(e) => {
                warn!("Telegram relay failed: {}", e);
                false
            }
        }
    }
}
