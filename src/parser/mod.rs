//! Turning a pasted rate message into a [`RateDraft`].

pub mod gemini;
pub mod heuristic;

use chrono::Utc;
use log::info;
use reqwest::Client;

use crate::config::Config;
use crate::error::{CurrexError, Result};
use crate::exchange_rate::RateDraft;

pub use gemini::GeminiParser;

pub enum RateParser {
    Heuristic,
    Gemini(GeminiParser),
}

impl RateParser {
    /// Gemini when an API key is configured, the local heuristic otherwise.
    pub fn from_config(config: &Config, client: Client) -> Self {
        match &config.gemini_api_key {
            Some(key) => {
                info!("Rate messages are parsed with {}", config.gemini_model);
                RateParser::Gemini(GeminiParser::new(
                    client,
                    config.gemini_api_url.clone(),
                    config.gemini_model.clone(),
                    key.clone(),
                ))
            }
            None => {
                info!("No Gemini key configured, using the heuristic rate parser");
                RateParser::Heuristic
            }
        }
    }

    pub async fn parse(&self, text: &str) -> Result<RateDraft> {
        if text.trim().is_empty() {
            return Err(CurrexError::Parse("text cannot be empty".to_string()));
        }

        match self {
            RateParser::Heuristic => Ok(heuristic::parse(text, Utc::now().date_naive())),
            RateParser::Gemini(gemini) => gemini.parse(text).await,
        }
    }
}
