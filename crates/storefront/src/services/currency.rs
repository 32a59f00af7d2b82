//! Display currency.
//!
//! Catalog prices are stored in the base currency of the exchange-rate
//! table. The shopper's choice is kept in the session; conversion happens
//! only when a price is formatted.

use eyewear_core::{CurrencyCode, ExchangeRates};
use rust_decimal::Decimal;
use tower_sessions::Session;

use crate::models::session_keys;
use crate::state::AppState;

/// Currency the shopper picked, or the configured default.
pub async fn selected(session: &Session, default: CurrencyCode) -> CurrencyCode {
    session
        .get::<CurrencyCode>(session_keys::CURRENCY)
        .await
        .ok()
        .flatten()
        .unwrap_or(default)
}

/// Remember the shopper's currency.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn select(
    session: &Session,
    currency: CurrencyCode,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENCY, currency).await
}

/// Price formatter for one request.
#[derive(Debug, Clone)]
pub struct Pricing {
    rates: ExchangeRates,
    currency: CurrencyCode,
}

impl Pricing {
    #[must_use]
    pub const fn new(rates: ExchangeRates, currency: CurrencyCode) -> Self {
        Self { rates, currency }
    }

    /// Load rates and the session currency. A failed rates fetch degrades to
    /// base-currency display.
    pub async fn load(state: &AppState, session: &Session) -> Self {
        let currency = selected(session, state.config().default_currency).await;
        let rates = state.api().exchange_rates().await.unwrap_or_else(|e| {
            tracing::warn!("Exchange rates unavailable, showing base prices: {e}");
            ExchangeRates::identity(CurrencyCode::default())
        });
        Self::new(rates, currency)
    }

    /// Currency prices are shown in.
    #[must_use]
    pub const fn currency(&self) -> CurrencyCode {
        self.currency
    }

    /// Format a base-currency amount in the selected currency.
    #[must_use]
    pub fn format(&self, amount: Decimal) -> String {
        self.rates.display(amount, self.currency)
    }
}

impl Default for Pricing {
    fn default() -> Self {
        Self::new(ExchangeRates::identity(CurrencyCode::default()), CurrencyCode::default())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    fn rates() -> ExchangeRates {
        ExchangeRates {
            base: CurrencyCode::USD,
            rates: HashMap::from([("EUR".to_string(), Decimal::new(5, 1))]),
        }
    }

    #[test]
    fn test_format_converts() {
        let pricing = Pricing::new(rates(), CurrencyCode::EUR);
        assert_eq!(pricing.format(Decimal::from(100)), "€50.00");
    }

    #[test]
    fn test_format_falls_back_to_base() {
        let pricing = Pricing::new(rates(), CurrencyCode::GBP);
        assert_eq!(pricing.format(Decimal::from(100)), "$100.00");
    }

    #[tokio::test]
    async fn test_selected_defaults_until_chosen() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        assert_eq!(selected(&session, CurrencyCode::CAD).await, CurrencyCode::CAD);

        select(&session, CurrencyCode::JPY).await.unwrap();
        assert_eq!(selected(&session, CurrencyCode::CAD).await, CurrencyCode::JPY);
    }
}
