//! Eyewear Core - Shared domain types and client-state logic.
//!
//! This crate holds everything the storefront keeps as "client state" plus the
//! small amount of numeric logic the site owns:
//! - [`cart`] - Line items keyed by product, kind and customizations
//! - [`search`] - Text and attribute filtering over the fetched catalog
//! - [`wishlist`] - Favourite product references
//! - [`reviews`] - Rating aggregation for product pages
//! - [`token`] - Client-side JWT expiry check
//! - [`pd`] - Pupillary distance from iris landmarks
//! - [`types`] - Newtype IDs, emails, prices and currencies, order status
//!
//! # Architecture
//!
//! No I/O, no HTTP clients, no sessions. The storefront crate owns fetching
//! and persistence; this crate only transforms values, which keeps every
//! invariant testable in isolation.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod pd;
pub mod reviews;
pub mod search;
pub mod token;
pub mod types;
pub mod wishlist;

pub use cart::{Cart, ItemKind, LineItem, LineKey, MAX_QUANTITY};
pub use catalog::{Accessory, Category, LensOption, Product};
pub use search::{SearchCriteria, SearchSort};
pub use types::*;
