//! Wishlist route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::HeaderMap,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use eyewear_core::ProductId;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAuth;
use crate::routes::products::ProductCard;
use crate::services::{PageContext, wishlist};
use crate::state::AppState;

/// Toggle form data.
#[derive(Debug, Deserialize)]
pub struct ToggleForm {
    pub product_id: ProductId,
}

/// Wishlist page template.
#[derive(Template, WebTemplate)]
#[template(path = "wishlist/index.html")]
pub struct WishlistTemplate {
    pub page: PageContext,
    pub products: Vec<ProductCard>,
}

/// Heart button fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/wishlist_button.html")]
pub struct WishlistButtonTemplate {
    pub product_id: String,
    pub active: bool,
}

/// Display the wishlist.
#[instrument(skip(state, session, page, current))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    page: PageContext,
    RequireAuth(current): RequireAuth,
) -> impl IntoResponse {
    let wishlist = wishlist::load(&state, &session, &current).await;

    WishlistTemplate {
        products: ProductCard::many(wishlist.products(), &page),
        page,
    }
}

/// Add or remove a product (HTMX). Returns the updated heart button.
#[instrument(skip(state, session, current, headers))]
pub async fn toggle(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(current): RequireAuth,
    headers: HeaderMap,
    Form(form): Form<ToggleForm>,
) -> Result<Response> {
    let active = wishlist::toggle(&state, &session, &current, &form.product_id).await?;

    if !headers.contains_key("hx-request") {
        return Ok(Redirect::to("/wishlist").into_response());
    }

    Ok((
        AppendHeaders([("HX-Trigger", "wishlist-updated")]),
        WishlistButtonTemplate {
            product_id: form.product_id.to_string(),
            active,
        },
    )
        .into_response())
}
