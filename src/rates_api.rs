use log::{debug, error, info};
use reqwest::{Client, Response, StatusCode};

use crate::admin_auth::AdminAuth;
use crate::backend_rate::{BackendExchangeRate, ParseRequest, render_rate_text};
use crate::error::{CurrexError, Result};
use crate::exchange_rate::{ExchangeRate, RateDraft};

const ADMIN_KEY_HEADER: &str = "x-currex-admin-key";

/// Client for the upstream rate endpoints.
#[derive(Clone)]
pub struct RatesApi {
    client: Client,
    base_url: String,
    admin_key: Option<String>,
}

impl RatesApi {
    pub fn new(client: Client, base_url: impl Into<String>, admin_key: Option<String>) -> Self {
        RatesApi {
            client,
            base_url: base_url.into(),
            admin_key,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Latest published rate; `None` when the backend has none yet.
    pub async fn fetch_latest(&self) -> Result<Option<ExchangeRate>> {
        let url = self.url("/fx/latest");
        debug!("Fetching latest rate from {}", url);

        let response = self.client.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            info!("Backend has no rates yet");
            return Ok(None);
        }
        let response = ensure_success(response).await?;

        let backend: BackendExchangeRate = response.json().await?;
        Ok(Some(backend.to_exchange_rate()))
    }

    /// Rate history as stored by the backend, newest first.
    pub async fn fetch_history(&self) -> Result<Vec<ExchangeRate>> {
        let url = self.url("/admin/fx");
        debug!("Fetching rate history from {}", url);

        let mut request = self.client.get(&url);
        if let Some(key) = &self.admin_key {
            request = request.header(ADMIN_KEY_HEADER, key);
        }
        let response = ensure_success(request.send().await?).await?;

        let backend: Vec<BackendExchangeRate> = response.json().await?;
        debug!("History response carried {} rates", backend.len());
        Ok(backend.iter().map(BackendExchangeRate::to_exchange_rate).collect())
    }

    /// Posts the draft, rendered as the daily message text, to the backend
    /// parser.
    pub async fn save_rate(&self, auth: &AdminAuth, draft: &RateDraft) -> Result<()> {
        let text = render_rate_text(draft);
        let body = ParseRequest {
            text: &text,
            base: "THB",
            quote: "MMK",
        };
        let admin_key = self.admin_key.clone();

        let response = auth
            .authenticated_request(&self.url("/admin/fx/parse"), |client, url| {
                let request = client.post(url).json(&body);
                match &admin_key {
                    Some(key) => request.header(ADMIN_KEY_HEADER, key),
                    None => request,
                }
            })
            .await?;

        if let Err(e) = ensure_success(response).await {
            error!("Backend rejected the rate: {}", e);
            return Err(e);
        }
        info!("Rate for {} saved to backend", draft.date);
        Ok(())
    }
}

async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(CurrexError::Upstream {
        status: status.as_u16(),
        body,
    })
}
