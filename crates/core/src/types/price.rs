//! Prices, currencies and exchange-rate conversion.
//!
//! Catalog prices arrive from the backend in the store's base currency. The
//! shopper picks a display currency; conversion happens only at render time
//! and never feeds back into cart totals sent to checkout.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., dollars, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Format for display, e.g. `$129.00` or `¥14500`.
    #[must_use]
    pub fn display(&self) -> String {
        let dp = self.currency_code.decimal_places();
        let rounded = self
            .amount
            .round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
        format!(
            "{}{:.prec$}",
            self.currency_code.symbol(),
            rounded,
            prec = dp as usize
        )
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// Error returned for an unsupported currency code.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unsupported currency code: {0}")]
pub struct CurrencyParseError(pub String);

/// ISO 4217 currency codes the storefront can display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    USD,
    EUR,
    GBP,
    CAD,
    AUD,
    INR,
    AED,
    JPY,
}

impl CurrencyCode {
    /// Every supported code, in the order shown by the currency picker.
    pub const ALL: [Self; 8] = [
        Self::USD,
        Self::EUR,
        Self::GBP,
        Self::CAD,
        Self::AUD,
        Self::INR,
        Self::AED,
        Self::JPY,
    ];

    /// Display symbol.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::USD => "$",
            Self::CAD => "CA$",
            Self::AUD => "A$",
            Self::EUR => "€",
            Self::GBP => "£",
            Self::INR => "₹",
            Self::AED => "AED ",
            Self::JPY => "¥",
        }
    }

    /// ISO code string.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
            Self::CAD => "CAD",
            Self::AUD => "AUD",
            Self::INR => "INR",
            Self::AED => "AED",
            Self::JPY => "JPY",
        }
    }

    /// Minor-unit digits shown for this currency.
    #[must_use]
    pub const fn decimal_places(self) -> u32 {
        match self {
            Self::JPY => 0,
            _ => 2,
        }
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for CurrencyCode {
    type Err = CurrencyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|c| c.code() == upper)
            .ok_or(CurrencyParseError(upper))
    }
}

/// Exchange-rate table relative to a base currency.
///
/// Codes the storefront does not support are kept in the table but never
/// looked up; the rates endpoint returns far more currencies than we show.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRates {
    #[serde(default, alias = "base_code")]
    pub base: CurrencyCode,
    #[serde(default)]
    pub rates: HashMap<String, Decimal>,
}

impl ExchangeRates {
    /// A table that only knows the base currency.
    #[must_use]
    pub fn identity(base: CurrencyCode) -> Self {
        Self {
            base,
            rates: HashMap::new(),
        }
    }

    /// Rate from the base currency to `to`, if known.
    #[must_use]
    pub fn rate(&self, to: CurrencyCode) -> Option<Decimal> {
        if to == self.base {
            return Some(Decimal::ONE);
        }
        self.rates.get(to.code()).copied()
    }

    /// Convert a base-currency amount into `to`.
    #[must_use]
    pub fn convert(&self, amount: Decimal, to: CurrencyCode) -> Option<Price> {
        self.rate(to).map(|rate| Price::new(amount * rate, to))
    }

    /// Convert for display, falling back to the base currency when the
    /// target rate is missing.
    #[must_use]
    pub fn display(&self, amount: Decimal, to: CurrencyCode) -> String {
        self.convert(amount, to)
            .unwrap_or_else(|| Price::new(amount, self.base))
            .display()
    }
}
