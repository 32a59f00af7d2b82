//! Wire types for the REST backend.
//!
//! The backend grew its responses organically, so these types are lenient:
//! lists arrive either bare or wrapped under one of several keys, ids arrive
//! as `_id`, `id` or both, and several fields have more than one spelling.
//! Types whose documents can carry two spellings at once deserialize through
//! a private raw struct declaring each spelling separately.

use chrono::{DateTime, Utc};
use eyewear_core::{ItemKind, OrderId, OrderStatus, PaymentStatus, UserId, UserRole};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

// =============================================================================
// List Envelopes
// =============================================================================

/// One page of a list response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based page number.
    pub page: u32,
    pub total_pages: u32,
}

impl<T> Page<T> {
    /// A single page holding everything.
    #[must_use]
    pub fn single(items: Vec<T>) -> Self {
        Self {
            items,
            page: 1,
            total_pages: 1,
        }
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    #[must_use]
    pub const fn has_prev(&self) -> bool {
        self.page > 1
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self::single(Vec::new())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Envelope<T> {
    Bare(Vec<T>),
    Wrapped(Wrapped<T>),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Wrapped<T> {
    #[serde(
        alias = "products",
        alias = "accessories",
        alias = "data",
        alias = "reviews",
        alias = "orders",
        alias = "favourites",
        alias = "favorites",
        alias = "categories",
        alias = "scripts",
        alias = "announcements"
    )]
    items: Vec<T>,
    #[serde(default, alias = "currentPage")]
    page: Option<u32>,
    #[serde(default, alias = "pages")]
    total_pages: Option<u32>,
}

/// One unreadable entry is skipped (and logged) rather than failing the
/// whole list.
impl<'de, T> Deserialize<'de> for Page<T>
where
    T: DeserializeOwned,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let envelope = Envelope::<serde_json::Value>::deserialize(deserializer)?;
        let (raw, page, total_pages) = match envelope {
            Envelope::Bare(items) => (items, 1, 1),
            Envelope::Wrapped(w) => {
                let page = w.page.unwrap_or(1).max(1);
                (w.items, page, w.total_pages.unwrap_or(page).max(page))
            }
        };

        let items = raw
            .into_iter()
            .enumerate()
            .filter_map(|(index, value)| match serde_json::from_value(value) {
                Ok(item) => Some(item),
                Err(e) => {
                    tracing::warn!(index, error = %e, "Skipping unreadable list entry");
                    None
                }
            })
            .collect();

        Ok(Self {
            items,
            page,
            total_pages,
        })
    }
}

// =============================================================================
// Users
// =============================================================================

/// The user profile the storefront keeps.
///
/// Backend-only fields (password hash, reset tokens, timestamps) are not
/// declared and therefore dropped at deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawUserProfile")]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: UserRole,
}

#[derive(Deserialize)]
struct RawUserProfile {
    #[serde(rename = "_id")]
    mongo_id: Option<UserId>,
    id: Option<UserId>,
    name: Option<String>,
    email: String,
    phone: Option<String>,
    #[serde(default)]
    role: UserRole,
}

impl TryFrom<RawUserProfile> for UserProfile {
    type Error = &'static str;

    fn try_from(raw: RawUserProfile) -> Result<Self, Self::Error> {
        Ok(Self {
            id: raw.id.or(raw.mongo_id).ok_or("user has no id")?,
            name: raw.name.unwrap_or_default(),
            email: raw.email,
            phone: raw.phone,
            role: raw.role,
        })
    }
}

/// Logged-in state held in the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub token: String,
    pub user: UserProfile,
}

impl<'de> Deserialize<'de> for AuthResponse {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            token: String,
            #[serde(default)]
            user: Option<UserProfile>,
            #[serde(flatten)]
            rest: serde_json::Map<String, serde_json::Value>,
        }

        let raw = Raw::deserialize(deserializer)?;
        let user = match raw.user {
            Some(user) => user,
            None => serde_json::from_value(serde_json::Value::Object(raw.rest))
                .map_err(serde::de::Error::custom)?,
        };
        Ok(Self(SessionUser {
            token: raw.token,
            user,
        }))
    }
}

/// Login/register response: `{token, user: {...}}` or the profile flattened
/// next to `token`.
#[derive(Debug, Clone)]
pub struct AuthResponse(pub SessionUser);

/// Login form payload.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Registration payload.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<&'a str>,
}

/// Profile update payload.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileUpdate<'a> {
    pub name: &'a str,
    pub email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<&'a str>,
}

/// Password change payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChange<'a> {
    pub current_password: &'a str,
    pub new_password: &'a str,
}

// =============================================================================
// Orders & Checkout
// =============================================================================

/// Shipping address captured at checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    #[serde(default, alias = "name")]
    pub full_name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub phone: Option<String>,
}

/// A line of a placed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    #[serde(default, alias = "title")]
    pub name: String,
    #[serde(default = "one", alias = "qty")]
    pub quantity: u32,
    #[serde(default)]
    pub price: Decimal,
    #[serde(default)]
    pub image: Option<String>,
}

const fn one() -> u32 {
    1
}

impl OrderItem {
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// An order as listed in the account area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawOrder")]
pub struct Order {
    pub id: OrderId,
    pub items: Vec<OrderItem>,
    pub total_price: Decimal,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub shipping_address: Option<ShippingAddress>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawOrder {
    #[serde(rename = "_id")]
    mongo_id: Option<OrderId>,
    id: Option<OrderId>,
    items: Option<Vec<OrderItem>>,
    order_items: Option<Vec<OrderItem>>,
    total_price: Option<Decimal>,
    total: Option<Decimal>,
    total_amount: Option<Decimal>,
    status: Option<OrderStatus>,
    order_status: Option<OrderStatus>,
    #[serde(default)]
    payment_status: PaymentStatus,
    shipping_address: Option<ShippingAddress>,
    created_at: Option<DateTime<Utc>>,
}

impl TryFrom<RawOrder> for Order {
    type Error = &'static str;

    fn try_from(raw: RawOrder) -> Result<Self, Self::Error> {
        Ok(Self {
            id: raw.id.or(raw.mongo_id).ok_or("order has no id")?,
            items: raw.items.or(raw.order_items).unwrap_or_default(),
            total_price: raw
                .total_price
                .or(raw.total)
                .or(raw.total_amount)
                .unwrap_or_default(),
            status: raw.status.or(raw.order_status).unwrap_or_default(),
            payment_status: raw.payment_status,
            shipping_address: raw.shipping_address,
            created_at: raw.created_at,
        })
    }
}

/// A cart line sent to the checkout-session endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutItem {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    pub title: String,
    pub price: Decimal,
    pub quantity: u32,
    pub image: Option<String>,
    pub customizations: serde_json::Value,
}

/// Payload for `POST /orders/create-checkout-session`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub items: Vec<CheckoutItem>,
    pub shipping_address: ShippingAddress,
    pub currency: String,
    pub success_url: String,
    pub cancel_url: String,
}

/// Hosted payment session created by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSession {
    #[serde(alias = "sessionUrl", alias = "checkoutUrl")]
    pub url: String,
    #[serde(default, alias = "sessionId")]
    pub id: Option<String>,
}

/// Result of verifying a payment session after the redirect back.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutVerification {
    #[serde(default, alias = "success", alias = "paid")]
    pub verified: bool,
    #[serde(default, alias = "orderId")]
    pub order: Option<VerifiedOrder>,
}

/// The order a verified session produced; sent either as an id or an object.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum VerifiedOrder {
    Id(OrderId),
    Object {
        #[serde(rename = "_id")]
        mongo_id: Option<OrderId>,
        id: Option<OrderId>,
    },
}

impl VerifiedOrder {
    /// `None` for an order object that carries no id at all.
    #[must_use]
    pub const fn id(&self) -> Option<&OrderId> {
        match self {
            Self::Id(id) => Some(id),
            Self::Object { id: Some(id), .. } | Self::Object { mongo_id: Some(id), .. } => Some(id),
            Self::Object { .. } => None,
        }
    }
}

// =============================================================================
// Reviews, favourites, contact
// =============================================================================

/// Payload for `POST /reviews`.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewInput<'a> {
    #[serde(rename = "productId")]
    pub product_id: &'a str,
    pub rating: u8,
    pub comment: &'a str,
}

/// Payload for `POST /favourites`.
#[derive(Debug, Clone, Serialize)]
pub struct FavouriteInput<'a> {
    #[serde(rename = "productId")]
    pub product_id: &'a str,
}

/// Favourites arrive either as bare products or as `{product: {...}}` rows.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FavouriteEntry {
    Wrapped { product: eyewear_core::Product },
    Product(eyewear_core::Product),
}

impl FavouriteEntry {
    #[must_use]
    pub fn into_product(self) -> eyewear_core::Product {
        match self {
            Self::Wrapped { product } | Self::Product(product) => product,
        }
    }
}

/// Payload for `POST /contact`.
#[derive(Debug, Clone, Serialize)]
pub struct ContactMessage<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub subject: &'a str,
    pub message: &'a str,
}

// =============================================================================
// Site content
// =============================================================================

/// Where a marketing script is injected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptPlacement {
    #[default]
    Head,
    Body,
    #[serde(other)]
    Other,
}

/// A feature-flagged third-party script managed from the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawMarketingScript")]
pub struct MarketingScript {
    pub id: String,
    pub name: String,
    pub enabled: bool,
    pub placement: ScriptPlacement,
    /// External script URL.
    pub src: Option<String>,
    /// Inline script body.
    pub content: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMarketingScript {
    #[serde(rename = "_id")]
    mongo_id: Option<String>,
    id: Option<String>,
    name: Option<String>,
    enabled: Option<bool>,
    is_enabled: Option<bool>,
    is_active: Option<bool>,
    active: Option<bool>,
    placement: Option<ScriptPlacement>,
    location: Option<ScriptPlacement>,
    position: Option<ScriptPlacement>,
    src: Option<String>,
    url: Option<String>,
    content: Option<String>,
    code: Option<String>,
    script: Option<String>,
}

impl From<RawMarketingScript> for MarketingScript {
    fn from(raw: RawMarketingScript) -> Self {
        Self {
            id: raw.id.or(raw.mongo_id).unwrap_or_default(),
            name: raw.name.unwrap_or_default(),
            enabled: raw
                .enabled
                .or(raw.is_enabled)
                .or(raw.is_active)
                .or(raw.active)
                .unwrap_or_default(),
            placement: raw
                .placement
                .or(raw.location)
                .or(raw.position)
                .unwrap_or_default(),
            src: raw.src.or(raw.url),
            content: raw.content.or(raw.code).or(raw.script),
        }
    }
}

/// A dismissible site banner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawAnnouncement")]
pub struct Announcement {
    pub id: String,
    pub message: String,
    pub link: Option<String>,
    pub active: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAnnouncement {
    #[serde(rename = "_id")]
    mongo_id: Option<String>,
    id: Option<String>,
    message: Option<String>,
    text: Option<String>,
    title: Option<String>,
    link: Option<String>,
    active: Option<bool>,
    is_active: Option<bool>,
}

impl TryFrom<RawAnnouncement> for Announcement {
    type Error = &'static str;

    fn try_from(raw: RawAnnouncement) -> Result<Self, Self::Error> {
        Ok(Self {
            id: raw.id.or(raw.mongo_id).ok_or("announcement has no id")?,
            message: raw
                .message
                .or(raw.text)
                .or(raw.title)
                .ok_or("announcement has no message")?,
            link: raw.link,
            // Banners are shown unless switched off
            active: raw.active.or(raw.is_active).unwrap_or(true),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_page_accepts_bare_array() {
        let page: Page<serde_json::Value> = serde_json::from_value(json!([1, 2])).unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!((page.page, page.total_pages), (1, 1));
        assert!(!page.has_next());
    }

    #[test]
    fn test_page_accepts_wrapped_lists() {
        let page: Page<serde_json::Value> =
            serde_json::from_value(json!({"products": [1], "page": 2, "totalPages": 5})).unwrap();
        assert_eq!(page.items.len(), 1);
        assert!(page.has_next());
        assert!(page.has_prev());

        let page: Page<serde_json::Value> =
            serde_json::from_value(json!({"data": [1, 2, 3]})).unwrap();
        assert_eq!(page.items.len(), 3);
        assert_eq!(page.total_pages, 1);
    }

    #[test]
    fn test_page_skips_unreadable_entries() {
        let page: Page<eyewear_core::Product> = serde_json::from_value(json!({
            "products": [
                {"_id": "p1", "id": "p1", "name": "Aviator", "price": 120},
                {"name": "No id or price"},
                {"_id": "p2", "name": "Round", "price": 80, "image": "a.jpg", "images": ["b.jpg"]}
            ],
            "totalPages": 2
        }))
        .unwrap();
        let ids: Vec<_> = page.items.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["p1", "p2"]);
        assert_eq!(page.total_pages, 2);
    }

    #[test]
    fn test_documents_with_both_id_keys() {
        let user: UserProfile =
            serde_json::from_value(json!({"_id": "u1", "id": "u1", "email": "ana@example.com"})).unwrap();
        assert_eq!(user.id.as_str(), "u1");
        assert_eq!(user.name, "");

        let order: Order = serde_json::from_value(json!({
            "_id": "o1", "id": "o1", "items": [], "orderItems": [{"name": "Round", "price": 80}],
            "totalPrice": 80, "total": 80
        }))
        .unwrap();
        assert_eq!(order.id.as_str(), "o1");
        assert_eq!(order.total_price, Decimal::from(80));

        let banner: Announcement = serde_json::from_value(
            json!({"_id": "a1", "id": "a1", "message": "Free shipping", "text": "Free shipping"}),
        )
        .unwrap();
        assert_eq!(banner.id, "a1");
        assert!(banner.active);

        let script: MarketingScript = serde_json::from_value(
            json!({"_id": "s1", "id": "s1", "enabled": false, "isActive": true, "location": "body"}),
        )
        .unwrap();
        assert!(!script.enabled);
        assert_eq!(script.placement, ScriptPlacement::Body);
    }

    #[test]
    fn test_session_user_survives_its_own_serialization() {
        let AuthResponse(session) = serde_json::from_value(json!({
            "token": "t",
            "user": {"_id": "u1", "id": "u1", "name": "Ana", "email": "ana@example.com"}
        }))
        .unwrap();
        let stored = serde_json::to_value(&session).unwrap();
        let restored: SessionUser = serde_json::from_value(stored).unwrap();
        assert_eq!(restored, session);
    }

    #[test]
    fn test_auth_response_nested_user() {
        let AuthResponse(session) = serde_json::from_value(json!({
            "token": "t",
            "user": {"_id": "u1", "name": "Ana", "email": "ana@example.com", "password": "hash"}
        }))
        .unwrap();
        assert_eq!(session.token, "t");
        assert_eq!(session.user.id.as_str(), "u1");
        assert_eq!(session.user.role, UserRole::User);
    }

    #[test]
    fn test_auth_response_flat_user() {
        let AuthResponse(session) = serde_json::from_value(json!({
            "token": "t", "_id": "u2", "name": "Ben", "email": "ben@example.com", "role": "admin"
        }))
        .unwrap();
        assert_eq!(session.user.name, "Ben");
        assert_eq!(session.user.role, UserRole::Admin);
    }

    #[test]
    fn test_order_aliases() {
        let order: Order = serde_json::from_value(json!({
            "_id": "o1",
            "orderItems": [{"title": "Aviator", "qty": 2, "price": 50}],
            "totalAmount": 100,
            "orderStatus": "shipped",
            "paymentStatus": "paid"
        }))
        .unwrap();
        assert_eq!(order.items[0].name, "Aviator");
        assert_eq!(order.items[0].line_total(), Decimal::from(100));
        assert_eq!(order.status, OrderStatus::Shipped);
        assert_eq!(order.payment_status, PaymentStatus::Paid);
    }

    #[test]
    fn test_verification_order_shapes() {
        let v: CheckoutVerification =
            serde_json::from_value(json!({"success": true, "order": {"_id": "o9"}})).unwrap();
        assert!(v.verified);
        assert_eq!(v.order.unwrap().id().unwrap().as_str(), "o9");

        let v: CheckoutVerification =
            serde_json::from_value(json!({"paid": false, "orderId": "o3"})).unwrap();
        assert!(!v.verified);
        assert_eq!(v.order.unwrap().id().unwrap().as_str(), "o3");
    }

    #[test]
    fn test_favourite_entry_shapes() {
        let wrapped: FavouriteEntry = serde_json::from_value(json!({
            "product": {"_id": "p1", "name": "Round", "price": 10}
        }))
        .unwrap();
        assert_eq!(wrapped.into_product().id.as_str(), "p1");

        let bare: FavouriteEntry =
            serde_json::from_value(json!({"_id": "p2", "name": "Cat eye", "price": 10})).unwrap();
        assert_eq!(bare.into_product().id.as_str(), "p2");
    }

    #[test]
    fn test_script_defaults() {
        let script: MarketingScript =
            serde_json::from_value(json!({"_id": "s1", "name": "GA", "isEnabled": true, "src": "https://x"}))
                .unwrap();
        assert!(script.enabled);
        assert_eq!(script.placement, ScriptPlacement::Head);
    }
}
