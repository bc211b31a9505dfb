//! MMK/THB exchange rate service.
//!
//! Keeps the current rate table and its history, converts amounts through the
//! tiered calculator, accepts admin rate messages and mirrors the upstream
//! CURREX backend.

pub mod admin_auth;
pub mod app_state;
pub mod backend_rate;
pub mod calculator;
pub mod config;
pub mod error;
pub mod exchange_rate;
pub mod handlers;
pub mod parser;
pub mod rate_book;
pub mod rates_api;
pub mod refresher;
pub mod store;
pub mod telegram;
pub mod webchat;

pub use app_state::AppState;
pub use calculator::{Calculator, Conversion, Direction, convert, parse_amount};
pub use config::Config;
pub use error::{CurrexError, Result};
pub use exchange_rate::{BuyingRates, ExchangeRate, HistoryEntry, RateDraft, SellingRates};
pub use rate_book::RateBook;
pub use store::RateStore;
