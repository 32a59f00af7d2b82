//! Session-related types.
//!
//! Types stored in the session for authentication and shopper state.

use chrono::{DateTime, Utc};
use eyewear_core::token;

use crate::api::SessionUser;

/// Session-stored logged-in user: the backend token plus the filtered
/// profile returned at login.
pub type CurrentUser = SessionUser;

impl SessionUser {
    /// Whether the backend token has passed its `exp` claim at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        token::is_expired(&self.token, now)
    }

    /// First name for the header greeting.
    #[must_use]
    pub fn first_name(&self) -> &str {
        self.user
            .name
            .split_whitespace()
            .next()
            .unwrap_or(self.user.email.as_str())
    }
}

/// Session keys for shopper state.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the cart line items.
    pub const CART: &str = "cart";

    /// Key for the selected display currency.
    pub const CURRENCY: &str = "currency";

    /// Key for announcement ids the shopper dismissed.
    pub const CLOSED_ANNOUNCEMENTS: &str = "closed_announcements";

    /// Key for the last PD measurement.
    pub const PD: &str = "pd";
}
