//! Wire format of the upstream rate backend and the message text it parses.

use chrono::DateTime;
use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::exchange_rate::{BuyingRates, ExchangeRate, RateDraft, SellingRates};

pub const DEFAULT_PAYMENT_METHOD: &str = "Bank Transfer";
pub const DEFAULT_NOTE: &str = "ငွေဈေးအတက်ကျရှိပါသဖြင့် ငွေလွှဲခါနီးစျေးမေးပေးပါ";

lazy_static! {
    static ref RATE_DIGITS: Regex = Regex::new(r"[0-9]{3,4}").unwrap();
    static ref SIDE_WORD: Regex = Regex::new(r"(?i)selling|buying").unwrap();
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BackendExchangeRate {
    pub id: String,
    #[serde(default)]
    pub base: String,
    #[serde(default)]
    pub quote: String,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub buy_rate: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub sell_rate: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub buy_below1m_per100k: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub buy_above1m_per100k: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub sell_below1m_per100k: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub sell_above1m_per100k: Option<Decimal>,
    #[serde(default)]
    pub sell_special100to500: Option<String>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub date_text: Option<String>,
    #[serde(default)]
    pub source_text: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub parsed_at: String,
}

/// Body of the admin parse endpoint.
#[derive(Debug, Serialize)]
pub struct ParseRequest<'a> {
    pub text: &'a str,
    pub base: &'a str,
    pub quote: &'a str,
}

impl BackendExchangeRate {
    pub fn to_exchange_rate(&self) -> ExchangeRate {
        let id = if self.created_at.is_empty() {
            self.id.clone()
        } else {
            self.created_at.clone()
        };

        let date = non_empty(&self.date_text).unwrap_or_else(|| {
            DateTime::parse_from_rfc3339(&self.created_at)
                .map(|ts| ts.format("%d %b %Y").to_string())
                .unwrap_or_else(|_| self.created_at.clone())
        });

        let notes = source_notes(&self.source_text);

        ExchangeRate {
            id,
            date,
            payment_method: non_empty(&self.payment_method)
                .unwrap_or_else(|| DEFAULT_PAYMENT_METHOD.to_string()),
            selling_rates: SellingRates {
                below_1m_mmk: first_rate(&[self.sell_below1m_per100k, self.sell_rate]),
                above_1m_mmk: first_rate(&[self.sell_above1m_per100k, self.sell_rate]),
                special_100_500: non_empty(&self.sell_special100to500),
            },
            buying_rates: BuyingRates {
                base: first_rate(&[self.buy_below1m_per100k, self.buy_rate]),
                above_1m_mmk: first_rate(&[self.buy_above1m_per100k, self.buy_rate]),
            },
            notes: if notes.is_empty() {
                vec![DEFAULT_NOTE.to_string()]
            } else {
                notes
            },
        }
    }
}

/// First present, non-zero rate; zero otherwise.
fn first_rate(candidates: &[Option<Decimal>]) -> Decimal {
    candidates
        .iter()
        .flatten()
        .copied()
        .find(|rate| !rate.is_zero())
        .unwrap_or(Decimal::ZERO)
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.trim().is_empty()).cloned()
}

/// Free-text notes at the tail of a posted message: the last two lines, kept
/// only when they are long prose without rates in them.
fn source_notes(source: &str) -> Vec<String> {
    let lines: Vec<&str> = source
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    let tail = &lines[lines.len().saturating_sub(2)..];

    tail.iter()
        .filter(|line| {
            line.chars().count() > 20 && !RATE_DIGITS.is_match(line) && !SIDE_WORD.is_match(line)
        })
        .map(|line| line.to_string())
        .collect()
}

/// Renders a draft as the daily rate message the backend parser understands.
pub fn render_rate_text(draft: &RateDraft) -> String {
    let mut lines = vec![
        draft.date.clone(),
        String::new(),
        draft.payment_method.clone(),
        String::new(),
        "Selling (အရောင်း)".to_string(),
        format!("မြန်မာငွေ10သိန်းအထက် {}", draft.selling_rates.above_1m_mmk),
        String::new(),
        format!("မြန်မာငွေ10သိန်းအောက် {}", draft.selling_rates.below_1m_mmk),
    ];

    if let Some(special) = &draft.selling_rates.special_100_500 {
        lines.push(String::new());
        lines.push(format!("100-500အထက်-{}", special));
    }

    lines.push(String::new());
    lines.push(format!("Buying (အဝယ်) {}", draft.buying_rates.base));
    lines.push(String::new());
    lines.push(format!("10သိန်းအထက်{}", draft.buying_rates.above_1m_mmk));

    if !draft.notes.is_empty() {
        lines.push(String::new());
        lines.extend(draft.notes.iter().cloned());
    }

    lines.join("\n")
}
