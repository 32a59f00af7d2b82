//! Favourites, synced with the backend on every change.

use eyewear_core::ProductId;
use eyewear_core::wishlist::{Wishlist, WishlistChange};
use tower_sessions::Session;

use crate::api::ApiError;
use crate::middleware::forget_on_unauthorized;
use crate::models::CurrentUser;
use crate::state::AppState;

/// Load the user's favourites. Failures degrade to an empty list.
pub async fn load(state: &AppState, session: &Session, user: &CurrentUser) -> Wishlist {
    match state.api().favourites(&user.token).await {
        Ok(products) => Wishlist::new(products),
        Err(e) => {
            tracing::warn!("Failed to fetch favourites: {e}");
            forget_on_unauthorized(session, &e).await;
            Wishlist::default()
        }
    }
}

/// Flip a product's membership. Returns whether it is now a favourite.
///
/// # Errors
///
/// Returns an error if any backend call fails. Membership is read fresh, so
/// an unreadable list never turns a removal into an add.
pub async fn toggle(
    state: &AppState,
    session: &Session,
    user: &CurrentUser,
    product_id: &ProductId,
) -> Result<bool, ApiError> {
    match flip(state, user, product_id).await {
        Ok(change) => {
            tracing::info!(product_id = %product_id, ?change, "Wishlist toggled");
            Ok(change == WishlistChange::Added)
        }
        Err(e) => {
            tracing::warn!(product_id = %product_id, "Wishlist toggle failed: {e}");
            forget_on_unauthorized(session, &e).await;
            Err(e)
        }
    }
}

async fn flip(
    state: &AppState,
    user: &CurrentUser,
    product_id: &ProductId,
) -> Result<WishlistChange, ApiError> {
    let wishlist = Wishlist::new(state.api().favourites(&user.token).await?);
    let change = wishlist.toggle_change(product_id);
    match change {
        WishlistChange::Added => state.api().add_favourite(&user.token, product_id).await?,
        WishlistChange::Removed => state.api().remove_favourite(&user.token, product_id).await?,
    }
    Ok(change)
}
