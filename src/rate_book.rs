use std::collections::HashSet;

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use crate::exchange_rate::{BuyingRates, ExchangeRate, HistoryEntry, SellingRates};

/// Current rate plus the superseded ones, newest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateBook {
    pub current: Option<ExchangeRate>,
    pub history: Vec<HistoryEntry>,
}

/// One point of the history chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPoint {
    pub label: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub sell_below_1m: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub buy_base: Decimal,
}

impl RateBook {
    pub fn new(current: Option<ExchangeRate>, history: Vec<HistoryEntry>) -> Self {
        RateBook { current, history }
    }

    /// Book holding only the bundled starting rate.
    pub fn seeded() -> Self {
        RateBook::new(Some(initial_rate()), Vec::new())
    }

    /// Makes `new` the current rate. The previous current rate, when present
    /// and carrying a different id, is pushed onto the front of history.
    pub fn apply_new_rate(&self, new: ExchangeRate) -> RateBook {
        let mut history = Vec::with_capacity(self.history.len() + 1);
        if let Some(current) = &self.current {
            if current.id != new.id {
                history.push(current.clone());
            }
        }
        history.extend(self.history.iter().cloned());

        RateBook {
            current: Some(new),
            history,
        }
    }

    /// Id for the next rate: the timestamp `now`, bumped past the current id
    /// if the clock has not moved beyond it.
    pub fn next_id(&self, now: DateTime<Utc>) -> String {
        let latest = self
            .current
            .as_ref()
            .and_then(|rate| DateTime::parse_from_rfc3339(&rate.id).ok())
            .map(|ts| ts.with_timezone(&Utc));

        let stamp = match latest {
            Some(latest) if now <= latest => latest + Duration::milliseconds(1),
            _ => now,
        };

        stamp.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// Current rate followed by history.
    pub fn all_entries(&self) -> Vec<HistoryEntry> {
        self.current
            .iter()
            .chain(self.history.iter())
            .cloned()
            .collect()
    }

    /// Chart series, oldest first.
    pub fn chart_points(&self) -> Vec<ChartPoint> {
        let mut points: Vec<ChartPoint> = self
            .all_entries()
            .iter()
            .map(|entry| ChartPoint {
                label: chart_label(entry),
                sell_below_1m: entry.selling_rates.below_1m_mmk,
                buy_base: entry.buying_rates.base,
            })
            .collect();
        points.reverse();
        points
    }

    /// Folds the view reported by the backend into the book. `history` may
    /// include the latest rate itself. Remote entries win over local ones
    /// with the same id; local entries the backend does not know (a rate
    /// whose upstream save failed, the seeded rate) are kept. The newest
    /// entry becomes current, so the current id never moves backwards.
    pub fn merge_remote(&self, latest: Option<ExchangeRate>, history: Vec<HistoryEntry>) -> RateBook {
        if latest.is_none() && history.is_empty() {
            return self.clone();
        }

        let mut seen = HashSet::new();
        let mut entries: Vec<HistoryEntry> = latest
            .into_iter()
            .chain(history)
            .chain(self.all_entries())
            .filter(|entry| seen.insert(entry.id.clone()))
            .collect();
        // stable, so equal keys keep remote-first order
        entries.sort_by(|a, b| id_order_key(b).cmp(&id_order_key(a)));

        let mut entries = entries.into_iter();
        RateBook {
            current: entries.next(),
            history: entries.collect(),
        }
    }
}

/// Timestamp ids order by time; anything else sorts below them.
fn id_order_key(entry: &HistoryEntry) -> (Option<DateTime<Utc>>, &str) {
    let stamp = DateTime::parse_from_rfc3339(&entry.id)
        .ok()
        .map(|ts| ts.with_timezone(&Utc));
    (stamp, entry.id.as_str())
}

fn chart_label(entry: &HistoryEntry) -> String {
    match DateTime::parse_from_rfc3339(&entry.id) {
        Ok(ts) => ts.format("%b %-d").to_string(),
        Err(_) => entry.date.clone(),
    }
}

fn initial_rate() -> ExchangeRate {
    ExchangeRate {
        id: "2025-10-16T12:00:00.000Z".to_string(),
        date: "16-Oct-2025".to_string(),
        payment_method: "Bank Transfer".to_string(),
        selling_rates: SellingRates {
            below_1m_mmk: dec!(797),
            above_1m_mmk: dec!(800),
            special_100_500: Some("802/803 for 100-500k+".to_string()),
        },
        buying_rates: BuyingRates {
            base: dec!(820),
            above_1m_mmk: dec!(817),
        },
        notes: vec![
            "ငွေဈေးအတက်ကျရှိပါသဖြင့် ငွေလွှဲခါနီးစျေးမေးပေးပါ (Please ask for the rate before transferring as prices fluctuate)".to_string(),
            "အိမ်းလွှဲများအတွက်Kpay/Wave/Bank အကောင့်အစုံ/မှတ်ပုံတင်ထုတ်/Wave passwordထုတ်အကုန်ရပါတယ် (For home transfers, all accounts like Kpay/Wave/Bank, ID card issuance, Wave password issuance are available)".to_string(),
        ],
    }
}
