//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//! - `EYEWEAR_API_URL` - Base URL of the catalog/orders REST backend
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `EXCHANGE_RATES_URL` - Exchange-rate endpoint (default: open.er-api.com, USD base)
//! - `API_TIMEOUT_SECS` - Backend request timeout (default: 10)
//! - `CACHE_TTL_SECS` - Catalog cache TTL (default: 300)
//! - `DEFAULT_CURRENCY` - Display currency for new sessions (default: USD)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate, 0.0 to 1.0 (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate, 0.0 to 1.0 (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use eyewear_core::CurrencyCode;
use thiserror::Error;
use url::Url;

const DEFAULT_EXCHANGE_RATES_URL: &str = "https://open.er-api.com/v6/latest/USD";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: Url,
    /// REST backend base URL
    pub api_url: Url,
    /// Exchange-rate endpoint
    pub exchange_rates_url: Url,
    /// Per-request timeout for backend calls
    pub api_timeout: Duration,
    /// TTL for cached catalog responses
    pub cache_ttl: Duration,
    /// Currency shown before the visitor picks one
    pub default_currency: CurrencyCode,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
    pub sentry_sample_rate: f32,
    pub sentry_traces_sample_rate: f32,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required keys are missing or invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let host = env.parsed("STOREFRONT_HOST", "127.0.0.1")?;
        let port = env.parsed("STOREFRONT_PORT", "3000")?;
        let base_url = parse_url("STOREFRONT_BASE_URL", &env.required("STOREFRONT_BASE_URL")?)?;
        let api_url = parse_api_url(&env.required("EYEWEAR_API_URL")?)?;
        let exchange_rates_url = parse_url(
            "EXCHANGE_RATES_URL",
            &env.or_default("EXCHANGE_RATES_URL", DEFAULT_EXCHANGE_RATES_URL),
        )?;
        let api_timeout = Duration::from_secs(env.parsed("API_TIMEOUT_SECS", "10")?);
        let cache_ttl = Duration::from_secs(env.parsed("CACHE_TTL_SECS", "300")?);
        let default_currency = env.parsed("DEFAULT_CURRENCY", "USD")?;

        let sentry_sample_rate =
            sample_rate("SENTRY_SAMPLE_RATE", env.parsed("SENTRY_SAMPLE_RATE", "1.0")?)?;
        let sentry_traces_sample_rate = sample_rate(
            "SENTRY_TRACES_SAMPLE_RATE",
            env.parsed("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        )?;

        Ok(Self {
            host,
            port,
            base_url,
            api_url,
            exchange_rates_url,
            api_timeout,
            cache_ttl,
            default_currency,
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the storefront is served over HTTPS (secure cookies).
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.scheme() == "https"
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Get a variable, treating blank values as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    fn parsed<T>(&self, key: &str, default: &str) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.or_default(key, default)
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }
}

fn parse_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(url)
}

/// The API base is joined with relative paths, so it must end with `/`.
fn parse_api_url(value: &str) -> Result<Url, ConfigError> {
    let mut url = parse_url("EYEWEAR_API_URL", value)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn sample_rate(key: &str, value: f32) -> Result<f32, ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("must be between 0.0 and 1.0 (got {value})"),
        ))
    }
}
