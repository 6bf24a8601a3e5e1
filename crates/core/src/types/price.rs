//! Money helpers.
//!
//! Monetary values are plain `f64` throughout the cart so repeated additions
//! never compound rounding error. Rounding to two decimals happens only at the
//! presentation and serialization boundary, through [`to_fixed`], which uses
//! the exact binary value of the float (like a browser's `toFixed`) and rounds
//! half away from zero.

use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Currency used for carts that never stored one.
pub const DEFAULT_CURRENCY: &str = "USD";

/// Currency recorded on order history entries whose payload had none.
pub const HISTORY_FALLBACK_CURRENCY: &str = "NGN";

/// Round `value` to `digits` decimal places.
///
/// Returns `None` for non-finite values and magnitudes a `Decimal` can't hold.
#[must_use]
pub fn to_fixed(value: f64, digits: u32) -> Option<Decimal> {
    let exact = Decimal::from_f64_retain(value)?;
    let mut rounded = exact.round_dp_with_strategy(digits, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(digits);
    Some(rounded)
}

/// Round a monetary amount to cents for serialization.
///
/// Non-finite amounts become `0`.
#[must_use]
pub fn round_money(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    to_fixed(value, 2)
        .and_then(|d| d.to_f64())
        .unwrap_or(value)
}

/// Format an amount for the storefront (e.g., `"$19.99"`).
#[must_use]
pub fn format_price(value: f64) -> String {
    to_fixed(value, 2).map_or_else(|| "$0.00".to_string(), |d| format!("${d}"))
}

/// Symbol prefix for an ISO 4217 code as shown in the admin console.
///
/// Unknown codes render as the code followed by a space; an empty code has no
/// prefix at all.
#[must_use]
pub fn currency_symbol(currency: &str) -> String {
    let code = currency.trim().to_uppercase();
    match code.as_str() {
        "NGN" => "₦".to_string(),
        "USD" => "$".to_string(),
        "EUR" => "€".to_string(),
        "GBP" => "£".to_string(),
        "" => String::new(),
        other => format!("{other} "),
    }
}

/// Format an amount with a currency symbol and no fraction digits
/// (e.g., `"₦14,500"`).
#[must_use]
pub fn format_money_compact(value: f64, currency: &str) -> String {
    let symbol = currency_symbol(currency);
    let Some(whole) = to_fixed(value, 0) else {
        return format!("{symbol}—");
    };
    format!("{symbol}{}", group_thousands(&whole.to_string()))
}

/// Insert `,` separators into an integer string.
fn group_thousands(digits: &str) -> String {
    let (sign, digits) = digits
        .strip_prefix('-')
        .map_or(("", digits), |rest| ("-", rest));
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3 + 1);
    out.push_str(sign);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// How raw prices from the remote product API map to display units.
///
/// The API has never documented its currency unit. Listings observed so far
/// carry values like `9800` for a product sold at `98.00`, so the default
/// treats anything at or above a threshold as minor units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum PriceUnitPolicy {
    /// Divide by `divisor` when the raw price is `>= threshold`.
    Heuristic {
        /// Smallest raw value considered to be in minor units.
        threshold: f64,
        /// Minor units per major unit.
        divisor: f64,
    },
    /// Raw prices are already in major units.
    Major,
    /// Raw prices are always in minor units.
    Minor {
        /// Minor units per major unit.
        divisor: f64,
    },
}

impl Default for PriceUnitPolicy {
    fn default() -> Self {
        Self::Heuristic {
            threshold: 1000.0,
            divisor: 100.0,
        }
    }
}

impl PriceUnitPolicy {
    /// Convert a raw API price to the display price used by the cart.
    #[must_use]
    pub fn display_price(&self, raw: f64) -> f64 {
        match *self {
            Self::Heuristic { threshold, divisor } if raw >= threshold && divisor != 0.0 => {
                raw / divisor
            }
            Self::Minor { divisor } if divisor != 0.0 => raw / divisor,
            Self::Heuristic { .. } | Self::Major | Self::Minor { .. } => raw,
        }
    }
}

impl FromStr for PriceUnitPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "heuristic" | "" => Ok(Self::default()),
            "major" => Ok(Self::Major),
            "minor" => Ok(Self::Minor { divisor: 100.0 }),
            other => Err(format!("invalid price unit policy: {other}")),
        }
    }
}
