//! Wishlist (favourites) bookkeeping.
//!
//! The remote favourites API is the source of truth; this type is the
//! per-request view of it used to decide which call a toggle needs.

use crate::catalog::Product;
use crate::types::ProductId;

/// What a toggle should do remotely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WishlistChange {
    Added,
    Removed,
}

/// Favourite products, in the order the backend returned them.
#[derive(Debug, Clone, Default)]
pub struct Wishlist {
    products: Vec<Product>,
}

impl Wishlist {
    #[must_use]
    pub const fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: &ProductId) -> bool {
        self.products.iter().any(|p| p.id == *id)
    }

    /// The remote change a toggle of `id` requires.
    #[must_use]
    pub fn toggle_change(&self, id: &ProductId) -> WishlistChange {
        if self.contains(id) {
            WishlistChange::Removed
        } else {
            WishlistChange::Added
        }
    }

    /// Apply a toggle locally after the remote call succeeded.
    pub fn apply(&mut self, change: WishlistChange, product: Product) {
        match change {
            WishlistChange::Added => {
                if !self.contains(&product.id) {
                    self.products.push(product);
                }
            }
            WishlistChange::Removed => self.products.retain(|p| p.id != product.id),
        }
    }
}
