//! Account route handlers.
//!
//! These routes require authentication.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use eyewear_core::{Email, OrderId};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::api::{ApiError, Order, PasswordChange, ProfileUpdate};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{RequireAuth, forget_on_unauthorized};
use crate::models::{CurrentUser, session_keys};
use crate::services::PageContext;
use crate::state::AppState;

/// Minimum length for a new password.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Orders shown on the account overview.
const RECENT_ORDERS: usize = 3;

// =============================================================================
// View Models
// =============================================================================

/// Order summary row.
#[derive(Debug, Clone)]
pub struct OrderView {
    pub id: String,
    pub date: String,
    pub status: &'static str,
    pub payment: &'static str,
    pub open: bool,
    pub item_count: u32,
    pub total: String,
}

impl OrderView {
    #[must_use]
    pub fn new(order: &Order, page: &PageContext) -> Self {
        Self {
            id: order.id.to_string(),
            date: order
                .created_at
                .map_or_else(String::new, |d| d.format("%b %-d, %Y").to_string()),
            status: order.status.label(),
            payment: order.payment_status.label(),
            open: order.status.is_open(),
            item_count: order.items.iter().map(|i| i.quantity).sum(),
            total: page.price(order.total_price),
        }
    }
}

/// Order line row.
#[derive(Debug, Clone)]
pub struct OrderLineView {
    pub name: String,
    pub quantity: u32,
    pub price: String,
    pub line_total: String,
    pub image: Option<String>,
}

// =============================================================================
// Form / Query Types
// =============================================================================

/// Query parameters for notices after a form post.
#[derive(Debug, Deserialize)]
pub struct NoticeQuery {
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Profile form data.
#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Password change form data.
#[derive(Debug, Deserialize)]
pub struct PasswordForm {
    pub current_password: SecretString,
    pub new_password: SecretString,
    pub confirm_password: SecretString,
}

impl PasswordForm {
    /// Local checks before the backend sees the request.
    fn validate(&self) -> std::result::Result<(), &'static str> {
        let new = self.new_password.expose_secret();
        if new.chars().count() < MIN_PASSWORD_LENGTH {
            return Err("New password must be at least 8 characters.");
        }
        if new != self.confirm_password.expose_secret() {
            return Err("New passwords do not match.");
        }
        if new == self.current_password.expose_secret() {
            return Err("New password must differ from the current one.");
        }
        Ok(())
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Account overview page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/index.html")]
pub struct AccountIndexTemplate {
    pub page: PageContext,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: &'static str,
    pub recent_orders: Vec<OrderView>,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Order history page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/orders.html")]
pub struct OrdersTemplate {
    pub page: PageContext,
    pub orders: Vec<OrderView>,
}

/// Order detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/order.html")]
pub struct OrderDetailTemplate {
    pub page: PageContext,
    pub order: OrderView,
    pub lines: Vec<OrderLineView>,
    pub shipping: Vec<String>,
}

// =============================================================================
// Helpers
// =============================================================================

fn back_with(kind: &str, message: &str) -> Response {
    Redirect::to(&format!("/account?{kind}={}", urlencoding::encode(message))).into_response()
}

/// Map a failed account call to a response: a rejected token logs out,
/// validation failures go back to the form.
async fn account_failure(session: &Session, err: ApiError) -> Result<Response> {
    match err {
        e @ ApiError::Unauthorized(_) => {
            forget_on_unauthorized(session, &e).await;
            Err(e.into())
        }
        e if e.is_client_error() => Ok(back_with("error", &e.user_message())),
        e => Err(e.into()),
    }
}

async fn fetch_orders(
    state: &AppState,
    session: &Session,
    current: &CurrentUser,
) -> Result<Vec<Order>> {
    match state.api().my_orders(&current.token).await {
        Ok(orders) => Ok(orders),
        Err(e @ ApiError::Unauthorized(_)) => {
            forget_on_unauthorized(session, &e).await;
            Err(e.into())
        }
        Err(e) => {
            tracing::warn!("Failed to fetch orders: {e}");
            Ok(Vec::new())
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Display account overview page.
#[instrument(skip(state, session, page, current))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    page: PageContext,
    RequireAuth(current): RequireAuth,
    Query(query): Query<NoticeQuery>,
) -> Result<impl IntoResponse> {
    let orders = fetch_orders(&state, &session, &current).await?;
    let recent_orders = orders
        .iter()
        .take(RECENT_ORDERS)
        .map(|o| OrderView::new(o, &page))
        .collect();

    let user = current.user;
    Ok(AccountIndexTemplate {
        name: user.name,
        email: user.email,
        phone: user.phone.unwrap_or_default(),
        role: user.role.label(),
        recent_orders,
        error: query.error,
        success: query.success,
        page,
    })
}

/// Update name, email and phone.
#[instrument(skip(state, session, current, form))]
pub async fn update_profile(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(current): RequireAuth,
    Form(form): Form<ProfileForm>,
) -> Result<Response> {
    let name = form.name.trim();
    if name.is_empty() {
        return Ok(back_with("error", "Name is required."));
    }
    let email = match Email::parse(&form.email) {
        Ok(email) => email,
        Err(e) => return Ok(back_with("error", &format!("Invalid email: {e}."))),
    };
    let phone = form.phone.as_deref().map(str::trim).filter(|p| !p.is_empty());

    let update = ProfileUpdate {
        name,
        email: email.as_str(),
        phone,
    };

    match state.api().update_profile(&current.token, &update).await {
        Ok(profile) => {
            let updated = CurrentUser {
                token: current.token,
                user: profile,
            };
            session.insert(session_keys::CURRENT_USER, &updated).await?;
            tracing::info!(user_id = %updated.user.id, "Profile updated");
            Ok(back_with("success", "Profile updated."))
        }
        Err(e) => account_failure(&session, e).await,
    }
}

/// Change the account password.
#[instrument(skip(state, session, current, form))]
pub async fn change_password(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(current): RequireAuth,
    Form(form): Form<PasswordForm>,
) -> Result<Response> {
    if let Err(message) = form.validate() {
        return Ok(back_with("error", message));
    }

    let change = PasswordChange {
        current_password: form.current_password.expose_secret(),
        new_password: form.new_password.expose_secret(),
    };

    match state.api().change_password(&current.token, &change).await {
        Ok(()) => {
            tracing::info!(user_id = %current.user.id, "Password changed");
            Ok(back_with("success", "Password changed."))
        }
        Err(e) => account_failure(&session, e).await,
    }
}

/// Display order history page.
#[instrument(skip(state, session, page, current))]
pub async fn orders(
    State(state): State<AppState>,
    session: Session,
    page: PageContext,
    RequireAuth(current): RequireAuth,
) -> Result<impl IntoResponse> {
    let orders = fetch_orders(&state, &session, &current).await?;

    Ok(OrdersTemplate {
        orders: orders.iter().map(|o| OrderView::new(o, &page)).collect(),
        page,
    })
}

/// Display a single order.
#[instrument(skip(state, session, page, current))]
pub async fn order_detail(
    State(state): State<AppState>,
    session: Session,
    page: PageContext,
    RequireAuth(current): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<impl IntoResponse> {
    let order = match state.api().get_order(&current.token, &id).await {
        Ok(order) => order,
        Err(e @ ApiError::Unauthorized(_)) => {
            forget_on_unauthorized(&session, &e).await;
            return Err(e.into());
        }
        Err(ApiError::NotFound(_)) => return Err(AppError::NotFound(format!("order {id}"))),
        Err(e) => return Err(e.into()),
    };

    let lines = order
        .items
        .iter()
        .map(|item| OrderLineView {
            name: item.name.clone(),
            quantity: item.quantity,
            price: page.price(item.price),
            line_total: page.price(item.line_total()),
            image: item.image.clone(),
        })
        .collect();

    let shipping = order
        .shipping_address
        .as_ref()
        .map(|a| {
            [
                Some(a.full_name.clone()),
                Some(a.address.clone()),
                Some(format!("{} {}", a.postal_code, a.city).trim().to_string()),
                Some(a.country.clone()),
                a.phone.clone(),
            ]
            .into_iter()
            .flatten()
            .filter(|line| !line.is_empty())
            .collect()
        })
        .unwrap_or_default();

    Ok(OrderDetailTemplate {
        order: OrderView::new(&order, &page),
        lines,
        shipping,
        page,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn password_form(current: &str, new: &str, confirm: &str) -> PasswordForm {
        PasswordForm {
            current_password: SecretString::from(current.to_string()),
            new_password: SecretString::from(new.to_string()),
            confirm_password: SecretString::from(confirm.to_string()),
        }
    }

    #[test]
    fn test_password_validation() {
        assert!(password_form("old-secret", "new-secret-1", "new-secret-1").validate().is_ok());
        assert!(password_form("old-secret", "short", "short").validate().is_err());
        assert!(password_form("old-secret", "new-secret-1", "new-secret-2").validate().is_err());
        assert!(password_form("same-secret", "same-secret", "same-secret").validate().is_err());
    }

    #[test]
    fn test_order_view_summarizes() {
        let order: Order = serde_json::from_value(serde_json::json!({
            "_id": "o1",
            "orderItems": [{"name": "Round", "qty": 2, "price": 50}],
            "totalPrice": 100,
            "status": "shipped",
            "createdAt": "2026-03-04T10:00:00Z",
        }))
        .unwrap();

        let view = OrderView::new(&order, &PageContext::default());
        assert_eq!(view.item_count, 2);
        assert_eq!(view.total, "$100.00");
        assert_eq!(view.status, "Shipped");
        assert_eq!(view.date, "Mar 4, 2026");
        assert!(view.open);
    }
}
