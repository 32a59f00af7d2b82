//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! The cart itself lives in the session; line prices are taken from the
//! backend at add time, never from the form.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::HeaderMap,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use eyewear_core::cart::Customizations;
use eyewear_core::catalog::lens_option;
use eyewear_core::{AccessoryId, Cart, ItemKind, LineItem, LineKey, MAX_QUANTITY, ProductId};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::filters;
use crate::services::{PageContext, Pricing, cart};
use crate::state::AppState;

/// Form field prefix for customization values, e.g. `custom[color]=Tortoise`.
const CUSTOM_PREFIX: &str = "custom[";

/// Customization key carrying the pupillary distance of a lens line.
const PD_KEY: &str = "pd";

// =============================================================================
// View Models
// =============================================================================

/// Cart item display data for templates.
#[derive(Debug, Clone)]
pub struct CartItemView {
    /// Opaque line key for update/remove forms.
    pub key: String,
    pub id: String,
    pub kind: ItemKind,
    pub title: String,
    /// Customizations as "Colour: Tortoise" pairs.
    pub options: Vec<String>,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
    pub image: Option<String>,
}

impl CartItemView {
    /// Link back to the purchasable, if it has a page.
    #[must_use]
    pub fn href(&self) -> Option<String> {
        match self.kind {
            ItemKind::Product => Some(format!("/products/{}", self.id)),
            ItemKind::Accessory => Some(format!("/accessories/{}", self.id)),
            ItemKind::Lens => None,
        }
    }
}

/// Cart display data for templates.
#[derive(Debug, Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub item_count: u32,
}

impl CartView {
    #[must_use]
    pub fn new(cart: &Cart, pricing: &Pricing) -> Self {
        Self {
            items: cart
                .items()
                .iter()
                .map(|item| CartItemView {
                    key: item.key().to_token(),
                    id: item.id.clone(),
                    kind: item.kind,
                    title: item.title.clone(),
                    options: item
                        .customizations
                        .iter()
                        .map(|(k, v)| format!("{}: {}", label(k), value_text(v)))
                        .collect(),
                    quantity: item.quantity,
                    price: pricing.format(item.price),
                    line_price: pricing.format(item.line_total()),
                    image: item.image.clone(),
                })
                .collect(),
            subtotal: pricing.format(cart.total()),
            item_count: cart.item_count(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

fn label(key: &str) -> String {
    if key == PD_KEY {
        return "PD (mm)".to_string();
    }
    let mut chars = key.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect::<String>().replace('_', " ")
    })
}

fn value_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// =============================================================================
// Form Types
// =============================================================================

/// Add to cart form data.
///
/// Parsed from raw pairs because customization fields are open-ended.
#[derive(Debug)]
pub struct AddToCartForm {
    pub id: String,
    pub kind: ItemKind,
    pub quantity: u32,
    pub customizations: Customizations,
}

impl TryFrom<Vec<(String, String)>> for AddToCartForm {
    type Error = String;

    fn try_from(pairs: Vec<(String, String)>) -> std::result::Result<Self, Self::Error> {
        let mut id = None;
        let mut kind = ItemKind::Product;
        let mut quantity = 1;
        let mut customizations = Customizations::new();

        for (key, value) in pairs {
            match key.as_str() {
                "id" => id = Some(value.trim().to_string()),
                "kind" => kind = value.parse()?,
                "quantity" => {
                    quantity = value
                        .trim()
                        .parse::<u32>()
                        .map_err(|_| format!("invalid quantity: {value}"))?;
                }
                _ => {
                    let Some(name) = key
                        .strip_prefix(CUSTOM_PREFIX)
                        .and_then(|rest| rest.strip_suffix(']'))
                    else {
                        continue;
                    };
                    let value = value.trim();
                    if name == PD_KEY
                        && !value.is_empty()
                        && !value.parse::<f64>().is_ok_and(|mm| mm.is_finite() && mm > 0.0)
                    {
                        return Err(format!("invalid PD: {value}"));
                    }
                    if !name.is_empty() && !value.is_empty() {
                        customizations.insert(
                            name.to_string(),
                            serde_json::Value::String(value.to_string()),
                        );
                    }
                }
            }
        }

        let id = id.filter(|id| !id.is_empty()).ok_or("missing id")?;
        Ok(Self {
            id,
            kind,
            quantity: quantity.clamp(1, MAX_QUANTITY),
            customizations,
        })
    }
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub key: String,
    pub quantity: u32,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub key: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub page: PageContext,
    pub cart: CartView,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

// =============================================================================
// Helpers
// =============================================================================

fn is_htmx(headers: &HeaderMap) -> bool {
    headers.contains_key("hx-request")
}

/// Build the line for an add request from the backend's copy of the item.
async fn line_item(state: &AppState, form: AddToCartForm) -> Result<LineItem> {
    let (title, price, image, original) = match form.kind {
        ItemKind::Product => {
            let product = state.api().get_product(&ProductId::new(&form.id)).await?;
            if !product.in_stock() {
                return Err(AppError::BadRequest(format!("{} is out of stock", product.name)));
            }
            let original = serde_json::to_value(&product).ok();
            (
                product.name.clone(),
                product.effective_price(),
                product.primary_image().map(String::from),
                original,
            )
        }
        ItemKind::Accessory => {
            let accessory = state
                .api()
                .get_accessory(&AccessoryId::new(&form.id))
                .await?;
            let original = serde_json::to_value(&accessory).ok();
            (
                accessory.name.clone(),
                accessory.effective_price(),
                accessory.primary_image().map(String::from),
                original,
            )
        }
        ItemKind::Lens => {
            let lens = lens_option(&form.id)
                .ok_or_else(|| AppError::NotFound(format!("lens option {}", form.id)))?;
            (lens.name.to_string(), lens.price(), None, None)
        }
    };

    Ok(LineItem {
        id: form.id,
        kind: form.kind,
        title,
        price,
        image,
        quantity: form.quantity,
        customizations: form.customizations,
        original_item: original,
    })
}

/// Respond to a cart mutation: HTMX gets the items fragment, plain forms
/// go back to the cart page.
async fn cart_changed(
    state: &AppState,
    session: &Session,
    headers: &HeaderMap,
    cart: &Cart,
) -> Response {
    if !is_htmx(headers) {
        return Redirect::to("/cart").into_response();
    }
    let pricing = Pricing::load(state, session).await;
    (
        AppendHeaders([("HX-Trigger", "cart-updated")]),
        CartItemsTemplate {
            cart: CartView::new(cart, &pricing),
        },
    )
        .into_response()
}

// =============================================================================
// Handlers
// =============================================================================

/// Display cart page.
#[instrument(skip(session, page))]
pub async fn show(session: Session, page: PageContext) -> impl IntoResponse {
    let cart = cart::load(&session).await;

    CartShowTemplate {
        cart: CartView::new(&cart, &page.pricing),
        page,
    }
}

/// Add item to cart (HTMX).
///
/// A line with the same item, kind and customizations has its quantity
/// increased instead of being duplicated. Returns the badge fragment with an
/// HTMX trigger so other cart widgets refresh.
#[instrument(skip(state, session, headers, pairs))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response> {
    let form = AddToCartForm::try_from(pairs).map_err(AppError::BadRequest)?;
    tracing::debug!(id = %form.id, kind = %form.kind, quantity = form.quantity, "Adding to cart");

    let item = line_item(&state, form).await?;
    let mut cart = cart::load(&session).await;
    cart.add(item);
    cart::save(&session, &cart).await?;

    if !is_htmx(&headers) {
        return Ok(Redirect::to("/cart").into_response());
    }

    Ok((
        AppendHeaders([("HX-Trigger", "cart-updated")]),
        CartCountTemplate {
            count: cart.item_count(),
        },
    )
        .into_response())
}

/// Update cart item quantity (HTMX). A quantity of zero removes the line.
#[instrument(skip(state, session, headers))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<UpdateCartForm>,
) -> Result<Response> {
    let key = LineKey::from_token(&form.key)
        .ok_or_else(|| AppError::BadRequest("invalid cart line".to_string()))?;

    let mut cart = cart::load(&session).await;
    if !cart.update_quantity(&key, form.quantity) {
        tracing::debug!("Cart line not found for update");
    }
    cart::save(&session, &cart).await?;

    Ok(cart_changed(&state, &session, &headers, &cart).await)
}

/// Remove item from cart (HTMX).
#[instrument(skip(state, session, headers))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Response> {
    let key = LineKey::from_token(&form.key)
        .ok_or_else(|| AppError::BadRequest("invalid cart line".to_string()))?;

    let mut cart = cart::load(&session).await;
    cart.remove(&key);
    cart::save(&session, &cart).await?;

    Ok(cart_changed(&state, &session, &headers, &cart).await)
}

/// Empty the cart.
#[instrument(skip(state, session, headers))]
pub async fn clear(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
) -> Result<Response> {
    let mut cart = cart::load(&session).await;
    cart.clear();
    cart::save(&session, &cart).await?;

    Ok(cart_changed(&state, &session, &headers, &cart).await)
}

/// Get cart count badge (HTMX).
#[instrument(skip(session))]
pub async fn count(session: Session) -> impl IntoResponse {
    CartCountTemplate {
        count: cart::count(&session).await,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_add_form_collects_customizations() {
        let form = AddToCartForm::try_from(pairs(&[
            ("id", "p1"),
            ("kind", "product"),
            ("quantity", "2"),
            ("custom[color]", "Tortoise"),
            ("custom[size]", ""),
            ("csrf", "ignored"),
        ]))
        .unwrap();

        assert_eq!(form.id, "p1");
        assert_eq!(form.kind, ItemKind::Product);
        assert_eq!(form.quantity, 2);
        assert_eq!(form.customizations.len(), 1);
        assert_eq!(form.customizations["color"], "Tortoise");
    }

    #[test]
    fn test_add_form_defaults_and_clamps() {
        let form = AddToCartForm::try_from(pairs(&[("id", "a1"), ("quantity", "0")])).unwrap();
        assert_eq!(form.kind, ItemKind::Product);
        assert_eq!(form.quantity, 1);

        let form = AddToCartForm::try_from(pairs(&[("id", "a1"), ("quantity", "500")])).unwrap();
        assert_eq!(form.quantity, MAX_QUANTITY);
    }

    #[test]
    fn test_add_form_rejects_bad_input() {
        assert!(AddToCartForm::try_from(pairs(&[("kind", "product")])).is_err());
        assert!(AddToCartForm::try_from(pairs(&[("id", "p1"), ("kind", "gift")])).is_err());
        assert!(AddToCartForm::try_from(pairs(&[("id", "p1"), ("quantity", "x")])).is_err());
    }

    #[test]
    fn test_add_form_checks_pd() {
        let form = AddToCartForm::try_from(pairs(&[
            ("id", "l1"),
            ("kind", "lens"),
            ("custom[pd]", "63.5"),
        ]))
        .unwrap();
        assert_eq!(form.customizations["pd"], "63.5");

        let form = AddToCartForm::try_from(pairs(&[("id", "l1"), ("custom[pd]", "")])).unwrap();
        assert!(form.customizations.is_empty());

        for bad in ["abc", "-4", "NaN", "inf"] {
            let err = AddToCartForm::try_from(pairs(&[("id", "l1"), ("custom[pd]", bad)]));
            assert!(err.is_err(), "{bad} accepted");
        }
    }

    #[test]
    fn test_pd_option_label() {
        assert_eq!(label("pd"), "PD (mm)");
        assert_eq!(label("frame"), "Frame");
    }

    #[test]
    fn test_cart_view_formats_lines() {
        let mut cart = Cart::new();
        let mut customizations = Customizations::new();
        customizations.insert("lens_type".to_string(), serde_json::json!("Blue light"));
        cart.add(LineItem {
            id: "p1".to_string(),
            kind: ItemKind::Product,
            title: "Round".to_string(),
            price: rust_decimal::Decimal::new(4950, 2),
            image: None,
            quantity: 2,
            customizations,
            original_item: None,
        });

        let view = CartView::new(&cart, &Pricing::default());
        assert_eq!(view.item_count, 2);
        assert_eq!(view.subtotal, "$99.00");
        assert_eq!(view.items[0].options, vec!["Lens type: Blue light".to_string()]);
        assert_eq!(view.items[0].href().as_deref(), Some("/products/p1"));
        assert!(LineKey::from_token(&view.items[0].key).is_some());
    }
}
