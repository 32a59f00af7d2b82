//! Cache types for catalog responses.

use std::sync::Arc;

use eyewear_core::{Accessory, AccessoryId, Category, Product, ProductId};

use crate::api::types::{Announcement, MarketingScript, Page};

/// Cache key for catalog and site-content reads.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Product(ProductId),
    Products {
        page: u32,
        limit: u32,
        category: Option<String>,
        sort: Option<String>,
    },
    /// Every product, for search and related-product lookups.
    Catalog,
    Accessory(AccessoryId),
    Accessories { page: u32, limit: u32 },
    Categories,
    Scripts,
    Announcements,
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Products(Arc<Page<Product>>),
    Catalog(Arc<Vec<Product>>),
    Accessory(Box<Accessory>),
    Accessories(Arc<Page<Accessory>>),
    Categories(Arc<Vec<Category>>),
    Scripts(Arc<Vec<MarketingScript>>),
    Announcements(Arc<Vec<Announcement>>),
}
