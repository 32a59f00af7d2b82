//! Cart persistence.
//!
//! The whole cart is rewritten to the session after every mutation; the
//! last write wins. A cart that no longer deserializes (e.g. after a schema
//! change) is discarded rather than breaking every page.

use eyewear_core::Cart;
use tower_sessions::Session;

use crate::models::session_keys;

/// Load the cart from the session.
pub async fn load(session: &Session) -> Cart {
    match session.get::<Cart>(session_keys::CART).await {
        Ok(cart) => cart.unwrap_or_default(),
        Err(e) => {
            tracing::warn!("Discarding unreadable cart: {e}");
            if let Err(e) = session.remove_value(session_keys::CART).await {
                tracing::warn!("Failed to remove unreadable cart: {e}");
            }
            Cart::new()
        }
    }
}

/// Persist the cart to the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn save(session: &Session, cart: &Cart) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CART, cart).await
}

/// Number of units in the cart, for the header badge.
pub async fn count(session: &Session) -> u32 {
    load(session).await.item_count()
}
