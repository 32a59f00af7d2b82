//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                            - Home page
//! GET  /health, /health/ready       - Health checks (see `app`)
//!
//! # Catalog
//! GET  /products                    - Product listing (page, category, sort)
//! GET  /products/{id}               - Product detail with reviews and related
//! POST /products/{id}/reviews       - Submit a review (auth)
//! GET  /accessories                 - Accessory listing
//! GET  /accessories/{id}            - Accessory detail
//! GET  /categories/{slug}           - Category listing
//!
//! # Search
//! GET  /search                      - Search page with filters and sort
//! GET  /search/suggest              - Suggestions dropdown (HTMX fragment)
//!
//! # Cart (HTMX fragments)
//! GET  /cart                        - Cart page
//! POST /cart/add                    - Add to cart (returns badge, triggers cart-updated)
//! POST /cart/update                 - Update quantity (returns cart_items fragment)
//! POST /cart/remove                 - Remove line (returns cart_items fragment)
//! POST /cart/clear                  - Empty the cart
//! GET  /cart/count                  - Cart count badge (fragment)
//!
//! # Wishlist (auth)
//! GET  /wishlist                    - Favourites
//! POST /wishlist/toggle             - Add/remove (returns heart button fragment)
//!
//! # Checkout (auth)
//! GET  /checkout                    - Shipping form
//! POST /checkout                    - Create payment session, 303 to provider
//! GET  /checkout/success            - Verify payment, empty cart
//! GET  /checkout/cancel             - Payment abandoned
//!
//! # Account (auth)
//! GET  /account                     - Profile and recent orders
//! POST /account/profile             - Update profile
//! POST /account/password            - Change password
//! GET  /account/orders              - Order history
//! GET  /account/orders/{id}         - Order detail
//!
//! # Auth
//! GET  /auth/login                  - Login page
//! POST /auth/login                  - Login action (rate limited)
//! GET  /auth/register               - Register page
//! POST /auth/register               - Register action (rate limited)
//! POST /auth/logout                 - Logout action
//!
//! # Site
//! GET  /contact                     - Contact page
//! POST /contact                     - Send message (rate limited)
//! POST /currency                    - Select display currency
//! POST /announcements/{id}/dismiss  - Hide a banner
//!
//! # Try-on and PD
//! GET  /try-on/{id}                 - Virtual try-on page
//! GET  /pd                          - PD measurement page
//! POST /api/pd                      - Landmarks JSON to PD JSON (rate limited)
//! ```

pub mod accessories;
pub mod account;
pub mod auth;
pub mod cart;
pub mod categories;
pub mod checkout;
pub mod contact;
pub mod home;
pub mod pd;
pub mod preferences;
pub mod products;
pub mod search;
pub mod wishlist;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::{api_rate_limiter, form_rate_limiter};
use crate::state::AppState;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
        .route("/{id}/reviews", post(products::submit_review))
}

/// Create the accessory routes router.
pub fn accessory_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(accessories::index))
        .route("/{id}", get(accessories::show))
}

/// Create the search routes router.
pub fn search_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(search::index))
        .route("/suggest", get(search::suggest))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/count", get(cart::count))
}

/// Create the wishlist routes router.
pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(wishlist::index))
        .route("/toggle", post(wishlist::toggle))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::show).post(checkout::create))
        .route("/success", get(checkout::success))
        .route("/cancel", get(checkout::cancel))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(account::index))
        .route("/profile", post(account::update_profile))
        .route("/password", post(account::change_password))
        .route("/orders", get(account::orders))
        .route("/orders/{id}", get(account::order_detail))
}

/// Create the auth routes router.
///
/// Credential posts share one strict limiter; the pages themselves are not
/// limited.
pub fn auth_routes() -> Router<AppState> {
    let limiter = form_rate_limiter();

    Router::new()
        .route(
            "/login",
            get(auth::login_page).merge(post(auth::login).layer(limiter.clone())),
        )
        .route(
            "/register",
            get(auth::register_page).merge(post(auth::register).layer(limiter)),
        )
        .route("/logout", post(auth::logout))
}

/// Create the JSON API routes router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/pd", post(pd::measure))
        .layer(api_rate_limiter())
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Home page
        .route("/", get(home::home))
        // Catalog
        .nest("/products", product_routes())
        .nest("/accessories", accessory_routes())
        .route("/categories/{slug}", get(categories::show))
        .nest("/search", search_routes())
        // Shopping
        .nest("/cart", cart_routes())
        .nest("/wishlist", wishlist_routes())
        .nest("/checkout", checkout_routes())
        // Account and auth
        .nest("/account", account_routes())
        .nest("/auth", auth_routes())
        // Site
        .route(
            "/contact",
            get(contact::page).merge(post(contact::submit).layer(form_rate_limiter())),
        )
        .route("/currency", post(preferences::select_currency))
        .route(
            "/announcements/{id}/dismiss",
            post(preferences::dismiss_announcement),
        )
        // Try-on and PD
        .route("/try-on/{id}", get(products::try_on))
        .route("/pd", get(pd::page))
        .nest("/api", api_routes())
}
