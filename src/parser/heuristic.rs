//! Regex extraction of rates from the daily Burmese/English rate message.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;

use crate::exchange_rate::{BuyingRates, RateDraft, SellingRates};

lazy_static! {
    static ref DATE: Regex = Regex::new(
        // ASCII-only boundaries, so a date glued to Burmese text still matches
        r"(?i)(?:^|[^0-9A-Za-z_])([0-9]{1,2}[-\s](?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]*[-\s][0-9]{4})(?:[^0-9A-Za-z_]|$)"
    )
    .unwrap();
    static ref BANK_TRANSFER: Regex = Regex::new(r"(?i)bank\s*transfer").unwrap();
    static ref MOBILE_WALLET: Regex = Regex::new(r"(?i)kpay|wave").unwrap();
    static ref SELLING: Regex = Regex::new(r"(?i)selling").unwrap();
    static ref BUYING: Regex = Regex::new(r"(?i)buying").unwrap();
    // "802/803" quotes a range; the second figure is the one applied
    static ref RATE: Regex = Regex::new(r"([0-9]{3,4})(?:/([0-9]{3,4}))?").unwrap();
    // အောက် = below, အထက် = above
    static ref BELOW: Regex = Regex::new(r"(?s)အောက်.*?([0-9]{3,4}(?:/[0-9]{3,4})?)").unwrap();
    static ref ABOVE: Regex = Regex::new(r"(?s)အထက်.*?([0-9]{3,4}(?:/[0-9]{3,4})?)").unwrap();
    static ref SPECIAL: Regex =
        Regex::new(r"(?i)100\s*[-–—]\s*500[^\n]*?([0-9]{3,4})\s*[/\-]\s*([0-9]{3,4})").unwrap();
}

/// Parses `text` without any external service. Values that cannot be found
/// fall back to their sibling tier, then to zero; a missing date becomes
/// `today`.
pub fn parse(text: &str, today: NaiveDate) -> RateDraft {
    let date = DATE
        .captures(text)
        .map(|caps| caps[1].to_string())
        .unwrap_or_else(|| today.format("%Y-%m-%d").to_string());

    let payment_method = if BANK_TRANSFER.is_match(text) {
        "Bank Transfer"
    } else if MOBILE_WALLET.is_match(text) {
        "Mobile Wallet"
    } else {
        "Unknown"
    };

    let selling = selling_block(text);
    let buying = buying_block(text);

    let below_sell = tier_rate(&BELOW, selling);
    let above_sell = tier_rate(&ABOVE, selling);
    let base_buy = first_rate(buying);
    let above_buy = tier_rate(&ABOVE, buying);

    let special_100_500 = SPECIAL
        .captures(text)
        .map(|caps| format!("{}/{}", &caps[1], &caps[2]));

    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    let notes = lines[lines.len().saturating_sub(3)..]
        .iter()
        .map(|line| line.to_string())
        .collect();

    RateDraft {
        date,
        payment_method: payment_method.to_string(),
        selling_rates: SellingRates {
            below_1m_mmk: below_sell.unwrap_or(Decimal::ZERO),
            above_1m_mmk: above_sell.or(below_sell).unwrap_or(Decimal::ZERO),
            special_100_500,
        },
        buying_rates: BuyingRates {
            base: base_buy.unwrap_or(Decimal::ZERO),
            above_1m_mmk: above_buy.or(base_buy).unwrap_or(Decimal::ZERO),
        },
        notes,
    }
}

/// From "Selling" up to "Buying" (or the end).
fn selling_block(text: &str) -> &str {
    let Some(start) = SELLING.find(text) else {
        return "";
    };
    let rest = &text[start.start()..];
    match BUYING.find(rest) {
        Some(end) => &rest[..end.start()],
        None => rest,
    }
}

/// From "Buying" to the end.
fn buying_block(text: &str) -> &str {
    BUYING
        .find(text)
        .map(|start| &text[start.start()..])
        .unwrap_or("")
}

/// Rate following the tier marker in `block`, or the first rate in the
/// block if the marker is absent.
fn tier_rate(marker: &Regex, block: &str) -> Option<Decimal> {
    let source = marker
        .captures(block)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(block);
    first_rate(source)
}

fn first_rate(source: &str) -> Option<Decimal> {
    let caps = RATE.captures(source)?;
    let figure = caps.get(2).or_else(|| caps.get(1))?;
    figure
        .as_str()
        .parse::<u32>()
        .ok()
        .filter(|value| *value > 0)
        .map(Decimal::from)
}
