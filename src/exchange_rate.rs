//! Rate table records.
//!
//! Every rate is quoted as THB per 100,000 MMK.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{CurrexError, Result};

/// Rates applied when a customer converts MMK into THB.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SellingRates {
    #[serde(rename = "below1M_MMK", with = "rust_decimal::serde::float")]
    pub below_1m_mmk: Decimal,
    #[serde(rename = "above1M_MMK", with = "rust_decimal::serde::float")]
    pub above_1m_mmk: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_100_500: Option<String>,
}

/// Rates applied when a customer converts THB into MMK.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuyingRates {
    #[serde(with = "rust_decimal::serde::float")]
    pub base: Decimal,
    #[serde(rename = "above1M_MMK", with = "rust_decimal::serde::float")]
    pub above_1m_mmk: Decimal,
}

/// A snapshot of exchange conditions. `id` is a timestamp and doubles as the
/// version key; a superseded snapshot is never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRate {
    pub id: String,
    pub date: String,
    pub payment_method: String,
    pub selling_rates: SellingRates,
    pub buying_rates: BuyingRates,
    #[serde(default)]
    pub notes: Vec<String>,
}

pub type HistoryEntry = ExchangeRate;

/// An exchange rate that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateDraft {
    pub date: String,
    pub payment_method: String,
    pub selling_rates: SellingRates,
    pub buying_rates: BuyingRates,
    #[serde(default)]
    pub notes: Vec<String>,
}

impl RateDraft {
    /// Rejects drafts the calculator could not divide by, before they ever
    /// become a current rate.
    pub fn validate(&self) -> Result<()> {
        if self.date.trim().is_empty() {
            return Err(CurrexError::InvalidRate("date is missing".to_string()));
        }
        if self.payment_method.trim().is_empty() {
            return Err(CurrexError::InvalidRate(
                "payment method is missing".to_string(),
            ));
        }

        let rates = [
            ("selling below 1M", self.selling_rates.below_1m_mmk),
            ("selling above 1M", self.selling_rates.above_1m_mmk),
            ("buying base", self.buying_rates.base),
            ("buying above 1M", self.buying_rates.above_1m_mmk),
        ];
        for (name, value) in rates {
            if value <= Decimal::ZERO {
                return Err(CurrexError::InvalidRate(format!(
                    "{} rate must be positive, got {}",
                    name, value
                )));
            }
        }

        Ok(())
    }

    pub fn stamp(self, id: String) -> ExchangeRate {
        ExchangeRate {
            id,
            date: self.date,
            payment_method: self.payment_method,
            selling_rates: self.selling_rates,
            buying_rates: self.buying_rates,
            notes: self.notes,
        }
    }
}

impl From<ExchangeRate> for RateDraft {
    fn from(rate: ExchangeRate) -> Self {
        RateDraft {
            date: rate.date,
            payment_method: rate.payment_method,
            selling_rates: rate.selling_rates,
            buying_rates: rate.buying_rates,
            notes: rate.notes,
        }
    }
}
