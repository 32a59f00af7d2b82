//! CLI subcommands.

pub mod check;
pub mod pd;
pub mod search;

use eyewear_storefront::api::ApiClient;
use eyewear_storefront::config::StorefrontConfig;

/// Build a backend client from the storefront's environment.
///
/// # Errors
///
/// Returns an error if configuration is missing or the client cannot be built.
pub fn client() -> Result<ApiClient, Box<dyn std::error::Error>> {
    let config = StorefrontConfig::from_env()?;
    tracing::debug!(api = %config.api_url, "Using backend");
    Ok(ApiClient::new(&config)?)
}
