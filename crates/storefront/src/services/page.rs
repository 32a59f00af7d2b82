//! Layout context shared by every full-page template.
//!
//! The header badge, greeting, currency picker, announcement bar and
//! marketing script tags are on every page. Handlers take a [`PageContext`]
//! extractor instead of fetching each piece themselves.

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};
use eyewear_core::CurrencyCode;
use rust_decimal::Decimal;
use tower_sessions::Session;

use crate::api::{Announcement, MarketingScript, ScriptPlacement};
use crate::middleware::{CspNonce, current_user};
use crate::services::{Pricing, announcements, cart};
use crate::state::AppState;

/// An entry in the currency picker.
#[derive(Debug, Clone)]
pub struct CurrencyOption {
    pub code: &'static str,
    pub symbol: &'static str,
    pub selected: bool,
}

/// Per-request layout data.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub nonce: String,
    /// Greeting name when logged in.
    pub user_name: Option<String>,
    pub cart_count: u32,
    pub pricing: Pricing,
    pub currencies: Vec<CurrencyOption>,
    pub announcements: Vec<Announcement>,
    pub head_scripts: Vec<MarketingScript>,
    pub body_scripts: Vec<MarketingScript>,
    pub current_path: String,
}

impl PageContext {
    /// Format a base-currency amount in the shopper's currency.
    #[must_use]
    pub fn price(&self, amount: Decimal) -> String {
        self.pricing.format(amount)
    }

    #[must_use]
    pub const fn is_logged_in(&self) -> bool {
        self.user_name.is_some()
    }

    /// ISO code of the display currency.
    #[must_use]
    pub const fn currency_code(&self) -> &'static str {
        self.pricing.currency().code()
    }
}

fn currency_options(selected: CurrencyCode) -> Vec<CurrencyOption> {
    CurrencyCode::ALL
        .iter()
        .map(|c| CurrencyOption {
            code: c.code(),
            symbol: c.symbol(),
            selected: *c == selected,
        })
        .collect()
}

fn split_scripts(scripts: &[MarketingScript]) -> (Vec<MarketingScript>, Vec<MarketingScript>) {
    let mut head = Vec::new();
    let mut body = Vec::new();
    for script in scripts {
        match script.placement {
            ScriptPlacement::Head => head.push(script.clone()),
            ScriptPlacement::Body => body.push(script.clone()),
            ScriptPlacement::Other => {
                tracing::debug!(script = %script.name, "Skipping script with unknown placement");
            }
        }
    }
    (head, body)
}

impl FromRequestParts<AppState> for PageContext {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let nonce = CspNonce::from_request_parts(parts, state).await?.0;
        let current_path = parts.uri.path().to_string();

        let Some(session) = parts.extensions.get::<Session>().cloned() else {
            tracing::warn!("Session missing from request extensions");
            return Ok(Self {
                nonce,
                current_path,
                ..Self::default()
            });
        };

        let (pricing, user, cart_count, banners, scripts) = tokio::join!(
            Pricing::load(state, &session),
            current_user(&session),
            cart::count(&session),
            announcements::visible(state, &session),
            state.api().scripts(),
        );

        let scripts = scripts.unwrap_or_else(|e| {
            tracing::warn!("Failed to fetch marketing scripts: {e}");
            std::sync::Arc::default()
        });
        let (head_scripts, body_scripts) = split_scripts(&scripts);

        Ok(Self {
            nonce,
            user_name: user.map(|u| u.first_name().to_string()),
            cart_count,
            currencies: currency_options(pricing.currency()),
            pricing,
            announcements: banners,
            head_scripts,
            body_scripts,
            current_path,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn script(placement: ScriptPlacement) -> MarketingScript {
        MarketingScript {
            id: "s".to_string(),
            name: "pixel".to_string(),
            enabled: true,
            placement,
            src: Some("https://cdn.example.com/p.js".to_string()),
            content: None,
        }
    }

    #[test]
    fn test_scripts_split_by_placement() {
        let scripts = [
            script(ScriptPlacement::Head),
            script(ScriptPlacement::Body),
            script(ScriptPlacement::Other),
        ];
        let (head, body) = split_scripts(&scripts);
        assert_eq!(head.len(), 1);
        assert_eq!(body.len(), 1);
    }

    #[test]
    fn test_currency_options_mark_selection() {
        let options = currency_options(CurrencyCode::EUR);
        assert_eq!(options.len(), CurrencyCode::ALL.len());
        assert_eq!(options.iter().filter(|o| o.selected).count(), 1);
        assert!(options.iter().any(|o| o.selected && o.code == "EUR"));
    }

    #[test]
    fn test_default_context_formats_in_base_currency() {
        let page = PageContext::default();
        assert!(!page.is_logged_in());
        assert_eq!(page.price(Decimal::new(12950, 2)), "$129.50");
        assert_eq!(page.currency_code(), "USD");
    }
}
