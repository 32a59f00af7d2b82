//! HTTP plumbing shared by every backend call.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::api::ApiError;
use crate::api::cache::{CacheKey, CacheValue};
use crate::config::StorefrontConfig;
use eyewear_core::ExchangeRates;

/// Exchange rates change slowly; one fetch an hour is plenty.
const RATES_TTL: Duration = Duration::from_secs(60 * 60);

/// Longest backend body excerpt kept in logs and errors.
const BODY_EXCERPT: usize = 300;

/// Client for the eyewear REST backend.
///
/// Cheap to clone. Catalog reads are cached for the configured TTL.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    base: Url,
    rates_url: Url,
    cache: Cache<CacheKey, CacheValue>,
    rates: Cache<(), ExchangeRates>,
}

impl ApiClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &StorefrontConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.api_timeout)
            .user_agent(concat!("eyewear-storefront/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(config.cache_ttl)
            .build();

        let rates = Cache::builder()
            .max_capacity(1)
            .time_to_live(RATES_TTL)
            .build();

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                http,
                base: config.api_url.clone(),
                rates_url: config.exchange_rates_url.clone(),
                cache,
                rates,
            }),
        })
    }

    pub(super) fn cache(&self) -> &Cache<CacheKey, CacheValue> {
        &self.inner.cache
    }

    pub(super) fn rates_cache(&self) -> &Cache<(), ExchangeRates> {
        &self.inner.rates
    }

    pub(super) fn rates_url(&self) -> &Url {
        &self.inner.rates_url
    }

    /// Drop every cached catalog response.
    pub fn invalidate_cache(&self) {
        self.inner.cache.invalidate_all();
    }

    /// Build a request against a path relative to the API base.
    pub(super) fn request(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
    ) -> Result<RequestBuilder, ApiError> {
        let url = self.inner.base.join(path)?;
        let builder = self.inner.http.request(method, url);
        Ok(match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    /// Build a request against an absolute URL (third-party endpoints).
    pub(super) fn request_url(&self, url: Url) -> RequestBuilder {
        self.inner.http.get(url)
    }

    /// `GET` a JSON resource.
    pub(super) async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        token: Option<&str>,
    ) -> Result<T, ApiError> {
        let request = self.request(Method::GET, path, token)?.query(query);
        parse_json(&execute(request, path).await?)
    }

    /// Send a JSON body and parse the JSON response.
    pub(super) async fn send_json<B, T>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        token: Option<&str>,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.request(method, path, token)?.json(body);
        parse_json(&execute(request, path).await?)
    }

    /// Send a request whose response body is irrelevant.
    pub(super) async fn send_unit<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        token: Option<&str>,
    ) -> Result<(), ApiError>
    where
        B: Serialize + ?Sized,
    {
        let mut request = self.request(method, path, token)?;
        if let Some(body) = body {
            request = request.json(body);
        }
        execute(request, path).await.map(drop)
    }
}

/// Send a request and return the body of a successful response.
pub(super) async fn execute(request: RequestBuilder, what: &str) -> Result<String, ApiError> {
    let response = request.send().await?;
    let status = response.status();

    // Check for rate limiting
    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(1);
        return Err(ApiError::RateLimited(retry_after));
    }

    let body = response.text().await?;

    if status.is_success() {
        return Ok(body);
    }

    let message = extract_message(&body);
    match status {
        StatusCode::NOT_FOUND => Err(ApiError::NotFound(what.to_string())),
        StatusCode::UNAUTHORIZED => Err(ApiError::Unauthorized(message)),
        _ => {
            if status.is_server_error() {
                tracing::error!(
                    status = %status,
                    path = what,
                    body = %excerpt(&body),
                    "Backend returned server error"
                );
            }
            Err(ApiError::Status {
                status: status.as_u16(),
                message,
            })
        }
    }
}

pub(super) fn parse_json<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| {
        tracing::error!(
            error = %e,
            body = %excerpt(body),
            "Failed to parse backend response"
        );
        ApiError::Parse(e)
    })
}

/// Pull the human-readable message out of an error body.
///
/// The backend sends `{"message": ...}` or `{"error": ...}`; anything else
/// is passed through truncated.
fn extract_message(body: &str) -> String {
    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["message", "error", "msg"] {
            if let Some(serde_json::Value::String(message)) = map.get(key) {
                return message.clone();
            }
        }
    }
    excerpt(body)
}

fn excerpt(body: &str) -> String {
    body.trim().chars().take(BODY_EXCERPT).collect()
}
