//! Session-backed shopper services.
//!
//! # Services
//!
//! - `cart` - Cart persistence in the session
//! - `currency` - Selected currency and exchange-rate formatting
//! - `announcements` - Site banners minus the ones the shopper dismissed
//! - `wishlist` - Favourites synced with the backend
//! - `page` - Per-request layout context shared by every page template

pub mod announcements;
pub mod cart;
pub mod currency;
pub mod page;
pub mod wishlist;

pub use currency::Pricing;
pub use page::PageContext;
