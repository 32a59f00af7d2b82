//! Checkout route handlers.
//!
//! Payment happens on the provider's hosted page. The storefront sends the
//! session cart to the backend, which creates the payment session and returns
//! its URL; the provider later redirects back to `/checkout/success` with the
//! session id, which is verified before the cart is emptied.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use eyewear_core::{Cart, CurrencyCode};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::api::{ApiError, CheckoutItem, CheckoutRequest, ShippingAddress};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::{RequireAuth, forget_on_unauthorized};
use crate::routes::cart::CartView;
use crate::services::{PageContext, cart};
use crate::state::AppState;

/// Placeholder the payment provider substitutes with the session id.
const SESSION_ID_PLACEHOLDER: &str = "{CHECKOUT_SESSION_ID}";

// =============================================================================
// Form / Query Types
// =============================================================================

/// Shipping form data.
#[derive(Debug, Default, Deserialize)]
pub struct CheckoutForm {
    pub full_name: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    #[serde(default)]
    pub phone: Option<String>,
}

impl CheckoutForm {
    /// Trimmed address, or the first missing field's label.
    fn into_address(self) -> std::result::Result<ShippingAddress, &'static str> {
        let required = |value: String, label: &'static str| {
            let value = value.trim().to_string();
            if value.is_empty() { Err(label) } else { Ok(value) }
        };

        Ok(ShippingAddress {
            full_name: required(self.full_name, "full name")?,
            address: required(self.address, "address")?,
            city: required(self.city, "city")?,
            postal_code: required(self.postal_code, "postal code")?,
            country: required(self.country, "country")?,
            phone: self
                .phone
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty()),
        })
    }
}

/// Query parameters for the checkout page.
#[derive(Debug, Deserialize)]
pub struct CheckoutQuery {
    pub error: Option<String>,
}

/// Query parameters on the provider's redirect back.
#[derive(Debug, Deserialize)]
pub struct SuccessQuery {
    pub session_id: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub page: PageContext,
    pub cart: CartView,
    pub full_name: String,
    pub phone: String,
    pub error: Option<String>,
}

/// Payment result page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/result.html")]
pub struct CheckoutResultTemplate {
    pub page: PageContext,
    pub success: bool,
    pub order_id: Option<String>,
}

// =============================================================================
// Helpers
// =============================================================================

fn checkout_items(cart: &Cart) -> Vec<CheckoutItem> {
    cart.items()
        .iter()
        .map(|item| CheckoutItem {
            id: item.id.clone(),
            kind: item.kind,
            title: item.title.clone(),
            price: item.price,
            quantity: item.quantity,
            image: item.image.clone(),
            customizations: serde_json::to_value(&item.customizations)
                .unwrap_or(serde_json::Value::Null),
        })
        .collect()
}

fn return_url(state: &AppState, path: &str) -> Result<String> {
    state
        .config()
        .base_url
        .join(path)
        .map(String::from)
        .map_err(|e| AppError::Internal(format!("invalid return URL: {e}")))
}

fn checkout_error(message: &str) -> Response {
    Redirect::to(&format!("/checkout?error={}", urlencoding::encode(message))).into_response()
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the checkout form.
#[instrument(skip(session, page, current))]
pub async fn show(
    session: Session,
    page: PageContext,
    RequireAuth(current): RequireAuth,
    Query(query): Query<CheckoutQuery>,
) -> Response {
    let cart = cart::load(&session).await;
    if cart.is_empty() {
        return Redirect::to("/cart").into_response();
    }

    CheckoutTemplate {
        cart: CartView::new(&cart, &page.pricing),
        full_name: current.user.name.clone(),
        phone: current.user.phone.clone().unwrap_or_default(),
        error: query.error,
        page,
    }
    .into_response()
}

/// Create a payment session and send the shopper to it.
#[instrument(skip(state, session, current, form))]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(current): RequireAuth,
    Form(form): Form<CheckoutForm>,
) -> Result<Response> {
    let cart = cart::load(&session).await;
    if cart.is_empty() {
        return Ok(Redirect::to("/cart").into_response());
    }

    let shipping_address = match form.into_address() {
        Ok(address) => address,
        Err(field) => return Ok(checkout_error(&format!("Please enter your {field}."))),
    };

    let request = CheckoutRequest {
        items: checkout_items(&cart),
        shipping_address,
        // Line prices are in the catalog's base currency.
        currency: CurrencyCode::default().code().to_lowercase(),
        success_url: format!(
            "{}?session_id={SESSION_ID_PLACEHOLDER}",
            return_url(&state, "/checkout/success")?
        ),
        cancel_url: return_url(&state, "/checkout/cancel")?,
    };

    match state
        .api()
        .create_checkout_session(&current.token, &request)
        .await
    {
        Ok(checkout) => {
            add_breadcrumb("checkout", "Redirecting to payment", None);
            tracing::info!(
                user_id = %current.user.id,
                items = cart.item_count(),
                "Checkout session created"
            );
            Ok(Redirect::to(&checkout.url).into_response())
        }
        Err(e @ ApiError::Unauthorized(_)) => {
            forget_on_unauthorized(&session, &e).await;
            Err(e.into())
        }
        Err(e) if e.is_client_error() => {
            tracing::warn!("Checkout rejected: {e}");
            Ok(checkout_error(&e.user_message()))
        }
        Err(e) => {
            tracing::error!("Failed to create checkout session: {e}");
            Ok(checkout_error(
                "We couldn't start the payment. Please try again.",
            ))
        }
    }
}

/// Verify the payment session and empty the cart on success.
#[instrument(skip(state, session, page, current))]
pub async fn success(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(current): RequireAuth,
    Query(query): Query<SuccessQuery>,
    page: PageContext,
) -> Result<Response> {
    let Some(session_id) = query.session_id.filter(|id| !id.trim().is_empty()) else {
        return Ok(Redirect::to("/cart").into_response());
    };

    let verification = match state
        .api()
        .verify_checkout_session(&current.token, &session_id)
        .await
    {
        Ok(v) => v,
        Err(e @ ApiError::Unauthorized(_)) => {
            forget_on_unauthorized(&session, &e).await;
            return Err(e.into());
        }
        Err(e) => {
            tracing::warn!("Failed to verify checkout session: {e}");
            return Ok(CheckoutResultTemplate {
                page,
                success: false,
                order_id: None,
            }
            .into_response());
        }
    };

    let mut page = page;
    if verification.verified {
        let mut cart = cart::load(&session).await;
        cart.clear();
        cart::save(&session, &cart).await?;
        page.cart_count = 0;
        tracing::info!(user_id = %current.user.id, "Payment verified, cart cleared");
    } else {
        tracing::warn!(user_id = %current.user.id, "Payment session not verified");
    }

    Ok(CheckoutResultTemplate {
        success: verification.verified,
        order_id: verification
            .order
            .and_then(|o| o.id().map(ToString::to_string)),
        page,
    }
    .into_response())
}

/// The shopper abandoned payment; the cart is kept.
pub async fn cancel(page: PageContext) -> impl IntoResponse {
    CheckoutResultTemplate {
        page,
        success: false,
        order_id: None,
    }
}
