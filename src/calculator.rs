//! Tiered MMK/THB conversion.
//!
//! The engine is a pure function of a rate table, a direction and an amount.
//! It never fails: unparsable input is treated as zero, and a conversion that
//! cannot be computed (zero rate, overflow) yields the zero conversion.

use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::exchange_rate::ExchangeRate;

/// MMK amount at which the higher tier applies (inclusive).
pub const TIER_THRESHOLD_MMK: Decimal = dec!(1000000);

/// Rates are quoted per this many MMK.
pub const QUOTE_UNIT_MMK: Decimal = dec!(100000);

lazy_static! {
    static ref AMOUNT_INPUT: Regex = Regex::new(r"^[0-9]*\.?[0-9]*$").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    #[default]
    MmkToThb,
    ThbToMmk,
}

impl Direction {
    pub fn toggled(self) -> Direction {
        match self {
            Direction::MmkToThb => Direction::ThbToMmk,
            Direction::ThbToMmk => Direction::MmkToThb,
        }
    }

    /// Amount the input field is reset to when switching into this direction.
    pub fn default_amount(self) -> &'static str {
        match self {
            Direction::MmkToThb => "100000",
            Direction::ThbToMmk => "1000",
        }
    }

    pub fn from_currency(self) -> &'static str {
        match self {
            Direction::MmkToThb => "MMK",
            Direction::ThbToMmk => "THB",
        }
    }

    pub fn to_currency(self) -> &'static str {
        match self {
            Direction::MmkToThb => "THB",
            Direction::ThbToMmk => "MMK",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Conversion {
    pub from: Decimal,
    pub to: Decimal,
    /// Tier rate that was applied, in THB per 100,000 MMK.
    pub rate_used: Decimal,
}

impl Conversion {
    pub fn zero() -> Self {
        Conversion::default()
    }

    /// Converted amount with exactly two fractional digits.
    pub fn to_display(&self) -> String {
        format_amount(self.to, 2, true)
    }

    /// Input amount with at most two fractional digits.
    pub fn from_display(&self) -> String {
        format_amount(self.from, 2, false)
    }
}

/// Reads a typed amount the way the input field does: commas are ignored and
/// anything that is not digits with at most one decimal point counts as zero.
/// Well-formed input too large for a `Decimal` also reads as zero; callers
/// that must tell it apart check [`is_oversized`] first.
pub fn parse_amount(input: &str) -> Decimal {
    match read_amount(input) {
        Some(Ok(amount)) => amount,
        _ => Decimal::ZERO,
    }
}

/// True for digits-and-point input that does not fit a `Decimal`.
pub fn is_oversized(input: &str) -> bool {
    matches!(read_amount(input), Some(Err(_)))
}

fn read_amount(input: &str) -> Option<std::result::Result<Decimal, rust_decimal::Error>> {
    let cleaned = input.replace(',', "");
    if !AMOUNT_INPUT.is_match(&cleaned) {
        return None;
    }

    let trimmed = cleaned.trim_end_matches('.');
    let normalized = if trimmed.starts_with('.') {
        format!("0{}", trimmed)
    } else {
        trimmed.to_string()
    };
    if normalized.is_empty() {
        return None;
    }

    Some(Decimal::from_str(&normalized))
}

pub fn convert(rate: &ExchangeRate, direction: Direction, amount: Decimal) -> Conversion {
    if amount <= Decimal::ZERO {
        return Conversion::zero();
    }

    match direction {
        Direction::MmkToThb => {
            let selling = &rate.selling_rates;
            let rate_used = if amount >= TIER_THRESHOLD_MMK {
                selling.above_1m_mmk
            } else {
                selling.below_1m_mmk
            };
            let Some(to) = amount
                .checked_div(QUOTE_UNIT_MMK)
                .and_then(|units| units.checked_mul(rate_used))
            else {
                return Conversion::zero();
            };

            Conversion {
                from: amount,
                to,
                rate_used,
            }
        }
        Direction::ThbToMmk => {
            let buying = &rate.buying_rates;
            // The tier is picked from an estimate made with the base rate,
            // not from the tier rate that is finally applied.
            let estimated_mmk = thb_to_mmk(amount, buying.base).unwrap_or(Decimal::ZERO);
            let rate_used = if estimated_mmk >= TIER_THRESHOLD_MMK {
                buying.above_1m_mmk
            } else {
                buying.base
            };
            let Some(to) = thb_to_mmk(amount, rate_used) else {
                return Conversion::zero();
            };

            Conversion {
                from: amount,
                to,
                rate_used,
            }
        }
    }
}

fn thb_to_mmk(amount: Decimal, rate: Decimal) -> Option<Decimal> {
    amount
        .checked_div(rate)
        .and_then(|units| units.checked_mul(QUOTE_UNIT_MMK))
}

/// Formats with thousands separators, rounding half away from zero. When
/// `fixed` is set the fractional part is always `places` digits long,
/// otherwise trailing zeros are dropped.
pub fn format_amount(value: Decimal, places: u32, fixed: bool) -> String {
    let rounded = value.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero);
    let text = if fixed {
        format!("{:.*}", places as usize, rounded)
    } else {
        rounded.normalize().to_string()
    };

    let (sign, unsigned) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text.as_str()),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match frac_part {
        Some(frac) => format!("{}{}.{}", sign, grouped, frac),
        None => format!("{}{}", sign, grouped),
    }
}

/// State of one calculator widget: a direction and the raw typed amount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Calculator {
    direction: Direction,
    amount: String,
}

impl Default for Calculator {
    fn default() -> Self {
        let direction = Direction::default();
        Calculator {
            direction,
            amount: direction.default_amount().to_string(),
        }
    }
}

impl Calculator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn amount(&self) -> &str {
        &self.amount
    }

    /// Accepts digits with at most one decimal point (commas are stripped)
    /// that fit a `Decimal`. Returns false and keeps the previous amount
    /// otherwise.
    pub fn set_amount(&mut self, input: &str) -> bool {
        let cleaned = input.replace(',', "");
        if !AMOUNT_INPUT.is_match(&cleaned) || is_oversized(&cleaned) {
            return false;
        }
        self.amount = cleaned;
        true
    }

    pub fn result(&self, rate: &ExchangeRate) -> Conversion {
        convert(rate, self.direction, parse_amount(&self.amount))
    }

    /// Switches direction. An amount still at the old direction's default (or
    /// empty/zero) moves to the new direction's default; a typed amount stays.
    pub fn toggle(&mut self) {
        let previous = self.direction;
        self.direction = previous.toggled();

        let untouched = self.amount == previous.default_amount()
            || parse_amount(&self.amount).is_zero();
        if untouched {
            self.amount = self.direction.default_amount().to_string();
        }
    }
}
