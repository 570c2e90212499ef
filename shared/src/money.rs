//! Checkout pricing with rust_decimal
//!
//! Amounts are computed as `Decimal`, rounded half-up to cents and converted
//! to `f64` only for storage and serialization.

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};

const DECIMAL_PLACES: u32 = 2;

/// Sales tax applied to the subtotal (7%)
pub const TAX_RATE: Decimal = Decimal::from_parts(7, 0, 0, false, 2);

/// Flat service fee per order (2.50)
pub const SERVICE_FEE: Decimal = Decimal::from_parts(250, 0, 0, false, 2);

/// Runner share of a delivered order total (15%)
pub const RUNNER_EARNINGS_RATE: Decimal = Decimal::from_parts(15, 0, 0, false, 2);

/// Tip percentages offered at checkout
pub const TIP_PRESETS: [u32; 3] = [15, 20, 25];

/// Tip percentage selected by default
pub const DEFAULT_TIP_PERCENT: u32 = 20;

/// Tip selection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum TipChoice {
    /// Percentage of the subtotal
    Percent(u32),
    /// Fixed dollar amount
    Custom(f64),
}

impl Default for TipChoice {
    fn default() -> Self {
        Self::Percent(DEFAULT_TIP_PERCENT)
    }
}

impl TipChoice {
    /// Percentage buttons shown at checkout, in display order
    pub fn presets() -> impl Iterator<Item = Self> {
        TIP_PRESETS.into_iter().map(Self::Percent)
    }

    /// Percentage stored on the order; custom tips store none
    pub fn percent(&self) -> Option<u32> {
        match self {
            Self::Percent(p) => Some(*p),
            Self::Custom(_) => None,
        }
    }

    /// Tip amount for the given subtotal
    pub fn amount(&self, subtotal: Decimal) -> Decimal {
        match self {
            Self::Percent(p) => round(subtotal * Decimal::from(*p) / Decimal::ONE_HUNDRED),
            Self::Custom(dollars) => round(to_decimal(dollars.max(0.0))),
        }
    }

    /// Display label, e.g. "Runner tip (20%)"
    pub fn label(&self) -> String {
        match self {
            Self::Percent(p) => format!("Runner tip ({}%)", p),
            Self::Custom(_) => "Runner tip (custom)".to_string(),
        }
    }
}

/// Order price breakdown in currency units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub subtotal: f64,
    pub tax: f64,
    pub service_fee: f64,
    pub tip_percent: Option<u32>,
    pub tip_amount: f64,
    pub total: f64,
}

impl PriceBreakdown {
    /// Compute the breakdown from `(unit_price, quantity)` lines
    pub fn compute<I>(lines: I, tip: TipChoice) -> Self
    where
        I: IntoIterator<Item = (f64, u32)>,
    {
        let subtotal: Decimal = lines
            .into_iter()
            .map(|(price, qty)| to_decimal(price) * Decimal::from(qty))
            .sum();
        let subtotal = round(subtotal);
        let tax = round(subtotal * TAX_RATE);
        let tip_amount = tip.amount(subtotal);
        let total = subtotal + tax + SERVICE_FEE + tip_amount;

        Self {
            subtotal: to_f64(subtotal),
            tax: to_f64(tax),
            service_fee: to_f64(SERVICE_FEE),
            tip_percent: tip.percent(),
            tip_amount: to_f64(tip_amount),
            total: to_f64(total),
        }
    }
}

/// Convert f64 to Decimal; non-finite input becomes zero
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_else(|| {
        tracing::error!(value = ?value, "Non-finite f64 in monetary calculation, defaulting to zero");
        Decimal::ZERO
    })
}

/// Round half-up to cents and convert to f64
pub fn to_f64(value: Decimal) -> f64 {
    round(value).to_f64().unwrap_or_default()
}

fn round(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Two-decimal display string without currency symbol
pub fn format_amount(value: f64) -> String {
    format!("{:.2}", to_decimal(value).round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero))
}

/// Runner earnings for a delivered order total
pub fn runner_earnings(total: f64) -> f64 {
    to_f64(to_decimal(total) * RUNNER_EARNINGS_RATE)
}

/// Clean free-form custom tip input.
///
/// Keeps digits and the first dot, allows at most two decimals. Returns the
/// cleaned text plus its numeric value (zero when empty or just ".").
pub fn parse_tip_input(raw: &str) -> (String, f64) {
    let mut cleaned = String::with_capacity(raw.len());
    let mut decimals: Option<usize> = None;
    for c in raw.chars() {
        match c {
            '0'..='9' => match decimals {
                Some(n) if n >= DECIMAL_PLACES as usize => {}
                Some(n) => {
                    cleaned.push(c);
                    decimals = Some(n + 1);
                }
                None => cleaned.push(c),
            },
            '.' if decimals.is_none() => {
                cleaned.push('.');
                decimals = Some(0);
            }
            _ => {}
        }
    }
    let value = cleaned.parse::<f64>().unwrap_or(0.0);
    (cleaned, value)
}
