use std::sync::Arc;

use chrono::Utc;
use log::{info, warn};
use reqwest::Client;
use tokio::sync::RwLock;

use crate::admin_auth::AdminAuth;
use crate::backend_rate::render_rate_text;
use crate::config::Config;
use crate::error::Result;
use crate::exchange_rate::{ExchangeRate, RateDraft};
use crate::parser::RateParser;
use crate::rate_book::RateBook;
use crate::rates_api::RatesApi;
use crate::store::RateStore;
use crate::telegram::TelegramNotifier;
use crate::webchat::ChatClient;

/// Everything a request handler or background job needs.
#[derive(Clone)]
pub struct AppState {
    pub book: Arc<RwLock<RateBook>>,
    pub store: RateStore,
    pub rates_api: RatesApi,
    pub auth: Arc<AdminAuth>,
    pub parser: Arc<RateParser>,
    pub chat: ChatClient,
    pub telegram: Option<TelegramNotifier>,
}

impl AppState {
    /// Wires the upstream clients from `config` and restores the rate book
    /// and admin session from `store`.
    pub async fn build(config: &Config, store: RateStore) -> Result<Self> {
        let client = Client::new();

        let book = store.load_book().await?;
        let tokens = store.load_tokens().await?;

        let auth = AdminAuth::new(client.clone(), config.api_base_url.clone())
            .with_tokens(tokens)
            .with_store(store.clone());

        let telegram = config.admin_key.as_ref().map(|key| {
            TelegramNotifier::new(
                client.clone(),
                config.api_base_url.clone(),
                key.clone(),
                config.telegram_chat_id.clone(),
            )
        });

        Ok(AppState {
            book: Arc::new(RwLock::new(book)),
            rates_api: RatesApi::new(
                client.clone(),
                config.rates_api_url.clone(),
                config.admin_key.clone(),
            ),
            auth: Arc::new(auth),
            parser: Arc::new(RateParser::from_config(config, client.clone())),
            chat: ChatClient::new(client, config.api_base_url.clone()),
            telegram,
            store,
        })
    }

    /// Makes `draft` the current rate, persists the book, then pushes the
    /// rate to the backend and notifies Telegram. The two outbound steps
    /// only log their failures.
    pub async fn publish_rate(&self, draft: RateDraft) -> Result<ExchangeRate> {
        draft.validate()?;

        let rate = {
            let mut book = self.book.write().await;
            let rate = draft.clone().stamp(book.next_id(Utc::now()));
            let updated = book.apply_new_rate(rate.clone());
            self.store.save_book(&updated).await?;
            *book = updated;
            rate
        };
        info!("Published rate {} for {}", rate.id, rate.date);

        if let Err(e) = self.rates_api.save_rate(&self.auth, &draft).await {
            warn!("Rate {} kept locally, backend save failed: {}", rate.id, e);
        }

        if let Some(telegram) = &self.telegram {
            if !telegram.send(&render_rate_text(&draft)).await {
                warn!("Telegram notification for rate {} was not delivered", rate.id);
            }
        }

        Ok(rate)
    }
}
