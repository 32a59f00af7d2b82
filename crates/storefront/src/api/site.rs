//! Site-wide content: marketing scripts, announcements, exchange rates and
//! the contact form.

use std::sync::Arc;

use eyewear_core::ExchangeRates;
use reqwest::Method;
use tracing::{debug, instrument};

use crate::api::cache::{CacheKey, CacheValue};
use crate::api::client::{execute, parse_json};
use crate::api::types::{Announcement, ContactMessage, MarketingScript, Page};
use crate::api::{ApiClient, ApiError};

impl ApiClient {
    /// Enabled marketing scripts.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn scripts(&self) -> Result<Arc<Vec<MarketingScript>>, ApiError> {
        if let Some(CacheValue::Scripts(scripts)) = self.cache().get(&CacheKey::Scripts).await {
            return Ok(scripts);
        }

        let page: Page<MarketingScript> = self.get_json("scripts", &[], None).await?;
        let scripts: Arc<Vec<MarketingScript>> =
            Arc::new(page.items.into_iter().filter(|s| s.enabled).collect());

        self.cache()
            .insert(CacheKey::Scripts, CacheValue::Scripts(Arc::clone(&scripts)))
            .await;
        Ok(scripts)
    }

    /// Active announcements.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn announcements(&self) -> Result<Arc<Vec<Announcement>>, ApiError> {
        if let Some(CacheValue::Announcements(items)) =
            self.cache().get(&CacheKey::Announcements).await
        {
            return Ok(items);
        }

        let page: Page<Announcement> = self.get_json("announcements", &[], None).await?;
        let items: Arc<Vec<Announcement>> =
            Arc::new(page.items.into_iter().filter(|a| a.active).collect());

        self.cache()
            .insert(
                CacheKey::Announcements,
                CacheValue::Announcements(Arc::clone(&items)),
            )
            .await;
        Ok(items)
    }

    /// Exchange rates from the configured third-party endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the rates endpoint fails or answers garbage.
    #[instrument(skip(self))]
    pub async fn exchange_rates(&self) -> Result<ExchangeRates, ApiError> {
        if let Some(rates) = self.rates_cache().get(&()).await {
            debug!("Cache hit for exchange rates");
            return Ok(rates);
        }

        let url = self.rates_url().clone();
        let body = execute(self.request_url(url), "exchange-rates").await?;
        let rates: ExchangeRates = parse_json(&body)?;

        self.rates_cache().insert((), rates.clone()).await;
        Ok(rates)
    }

    /// Forward a contact-form message.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the message.
    #[instrument(skip(self, message), fields(email = %message.email))]
    pub async fn send_contact(&self, message: &ContactMessage<'_>) -> Result<(), ApiError> {
        self.send_unit(Method::POST, "contact", Some(message), None)
            .await
    }
}
