//! Client for the eyewear REST backend.
//!
//! # Architecture
//!
//! - The backend is the source of truth for catalog, users, favourites and
//!   orders; the storefront keeps no local copy
//! - Plain JSON over `reqwest`, bearer token from the session on
//!   authenticated calls
//! - In-memory caching via `moka` for catalog reads (configurable TTL) and
//!   exchange rates (one hour)
//!
//! # Example
//!
//! ```rust,ignore
//! use eyewear_storefront::api::{ApiClient, ProductQuery};
//!
//! let client = ApiClient::new(&config)?;
//! let page = client.list_products(&ProductQuery::default()).await?;
//! let product = client.get_product(&page.items[0].id).await?;
//! ```

mod account;
mod cache;
mod catalog;
mod client;
mod site;
pub mod types;

pub use catalog::ProductQuery;
pub use client::ApiClient;
pub use types::*;

use thiserror::Error;

/// Errors that can occur when calling the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("Backend returned {status}: {message}")]
    Status { status: u16, message: String },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The bearer token was rejected.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Request URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl ApiError {
    /// Message safe to show the shopper for a rejected form submission.
    ///
    /// Validation failures carry the backend's own message (e.g. "Invalid
    /// email or password"); anything else gets a generic line.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Status { status, message } if (400..500).contains(status) => message.clone(),
            Self::Unauthorized(message) if !message.is_empty() => message.clone(),
            Self::Unauthorized(_) => "Please sign in again.".to_string(),
            Self::RateLimited(_) => "Too many attempts, please wait a moment.".to_string(),
            _ => "Something went wrong, please try again.".to_string(),
        }
    }

    /// Whether the backend rejected the request content (a 4xx other than
    /// 401/404/429, which have their own variants).
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::Status { status, .. } if *status >= 400 && *status < 500)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = ApiError::NotFound("product-123".to_string());
        assert_eq!(err.to_string(), "Not found: product-123");

        let err = ApiError::Status {
            status: 422,
            message: "Email already registered".to_string(),
        };
        assert_eq!(err.to_string(), "Backend returned 422: Email already registered");
    }

    #[test]
    fn test_user_message_passes_validation_errors_through() {
        let err = ApiError::Status {
            status: 400,
            message: "Email already registered".to_string(),
        };
        assert_eq!(err.user_message(), "Email already registered");
    }

    #[test]
    fn test_user_message_hides_server_errors() {
        let err = ApiError::Status {
            status: 500,
            message: "TypeError: cannot read property".to_string(),
        };
        assert_eq!(err.user_message(), "Something went wrong, please try again.");
    }

    #[test]
    fn test_rate_limited_error() {
        let err = ApiError::RateLimited(60);
        assert_eq!(err.to_string(), "Rate limited, retry after 60 seconds");
    }
}
