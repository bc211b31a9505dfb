use std::net::SocketAddr;
use std::time::Duration;

use crate::error::{CurrexError, Result};

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_DATABASE_URL: &str = "sqlite://currex.db?mode=rwc";
pub const DEFAULT_API_BASE_URL: &str = "https://api.shltechent.com";
pub const DEFAULT_RATES_API_URL: &str = "https://www.shltechent.com/api";
pub const DEFAULT_GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub database_url: String,
    /// Auth, telegram and webchat endpoints live here.
    pub api_base_url: String,
    pub rates_api_url: String,
    pub admin_key: Option<String>,
    pub telegram_chat_id: Option<String>,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_api_url: String,
    /// `None` disables background polling.
    pub poll_interval: Option<Duration>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let bind_addr = get("CURREX_BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| CurrexError::Config(format!("CURREX_BIND_ADDR: {}", e)))?;

        let poll_secs = match get("RATE_POLL_INTERVAL_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|e| CurrexError::Config(format!("RATE_POLL_INTERVAL_SECS: {}", e)))?,
            None => DEFAULT_POLL_INTERVAL_SECS,
        };

        Ok(Config {
            bind_addr,
            database_url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            api_base_url: trim_base(get("CURREX_API_BASE_URL"), DEFAULT_API_BASE_URL),
            rates_api_url: trim_base(get("CURREX_RATES_API_URL"), DEFAULT_RATES_API_URL),
            admin_key: get("CURREX_ADMIN_KEY"),
            telegram_chat_id: get("TELEGRAM_CHAT_ID"),
            gemini_api_key: get("GEMINI_API_KEY"),
            gemini_model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            gemini_api_url: trim_base(get("GEMINI_API_URL"), DEFAULT_GEMINI_API_URL),
            poll_interval: (poll_secs > 0).then(|| Duration::from_secs(poll_secs)),
        })
    }
}

fn trim_base(value: Option<String>, default: &str) -> String {
    value
        .unwrap_or_else(|| default.to_string())
        .trim_end_matches('/')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert_eq!(config.rates_api_url, DEFAULT_RATES_API_URL);
        assert!(config.admin_key.is_none());
        assert_eq!(config.poll_interval, Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_overrides_and_trailing_slash() {
        let config = config_from(&[
            ("CURREX_API_BASE_URL", "http://localhost:9000/"),
            ("CURREX_ADMIN_KEY", "secret"),
            ("RATE_POLL_INTERVAL_SECS", "0"),
        ])
        .unwrap();

        assert_eq!(config.api_base_url, "http://localhost:9000");
        assert_eq!(config.admin_key.as_deref(), Some("secret"));
        assert!(config.poll_interval.is_none());
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        let config = config_from(&[("GEMINI_API_KEY", "  "), ("GEMINI_MODEL", "")]).unwrap();
        assert!(config.gemini_api_key.is_none());
        assert_eq!(config.gemini_model, DEFAULT_GEMINI_MODEL);
    }

    #[test]
    fn test_rejects_bad_bind_addr() {
        let err = config_from(&[("CURREX_BIND_ADDR", "nowhere")]).unwrap_err();
        assert!(matches!(err, CurrexError::Config(_)));
    }
}
