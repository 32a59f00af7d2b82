//! Cart state keeper.
//!
//! An ordered list of line items. A line is identified by the purchasable
//! id, its kind, and the canonical JSON of its customizations: the same
//! frame in two colours is two lines, the same frame in the same colour is
//! one line with a larger quantity.
//!
//! Totals are never stored. [`Cart::total`] recomputes the sum on every
//! call, so it cannot drift from the lines after a mutation.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Largest quantity a single line can hold.
pub const MAX_QUANTITY: u32 = 99;

/// What a line item refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Product,
    Accessory,
    Lens,
}

impl ItemKind {
    /// Lowercase wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Product => "product",
            Self::Accessory => "accessory",
            Self::Lens => "lens",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "product" => Ok(Self::Product),
            "accessory" => Ok(Self::Accessory),
            "lens" => Ok(Self::Lens),
            other => Err(format!("unknown item kind: {other}")),
        }
    }
}

/// User-selected variant attributes (colour, lens type, prescription...).
///
/// A `BTreeMap` so the serialized form is key-ordered and therefore usable
/// as part of the line identity.
pub type Customizations = BTreeMap<String, serde_json::Value>;

/// Identity of a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LineKey {
    pub id: String,
    pub kind: ItemKind,
    customizations: String,
}

impl LineKey {
    /// Build a key from its parts.
    #[must_use]
    pub fn new(id: impl Into<String>, kind: ItemKind, customizations: &Customizations) -> Self {
        Self {
            id: id.into(),
            kind,
            customizations: canonical_json(customizations),
        }
    }

    /// Opaque token for round-tripping the key through an HTML form.
    #[must_use]
    pub fn to_token(&self) -> String {
        format!("{}|{}|{}", self.kind, self.id, self.customizations)
    }

    /// Parse a token produced by [`LineKey::to_token`].
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        let mut parts = token.splitn(3, '|');
        let kind = parts.next()?.parse().ok()?;
        let id = parts.next()?;
        let customizations = parts.next()?;
        if id.is_empty() {
            return None;
        }
        // Re-canonicalize so a hand-edited token still matches.
        let parsed: Customizations = serde_json::from_str(customizations).ok()?;
        Some(Self::new(id, kind, &parsed))
    }
}

fn canonical_json(customizations: &Customizations) -> String {
    serde_json::to_string(customizations).unwrap_or_else(|_| "{}".to_string())
}

/// A single cart row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    pub title: String,
    pub price: Decimal,
    #[serde(default)]
    pub image: Option<String>,
    pub quantity: u32,
    #[serde(default)]
    pub customizations: Customizations,
    /// Snapshot of the catalog entry at the time it was added.
    #[serde(default)]
    pub original_item: Option<serde_json::Value>,
}

impl LineItem {
    /// Identity of this line.
    #[must_use]
    pub fn key(&self) -> LineKey {
        LineKey::new(self.id.clone(), self.kind, &self.customizations)
    }

    /// `price × quantity`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// The shopper's cart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    #[serde(default)]
    items: Vec<LineItem>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add an item, merging into an existing line with the same key.
    ///
    /// A zero quantity counts as one; the add button never means "nothing".
    /// The merged quantity is capped at [`MAX_QUANTITY`].
    pub fn add(&mut self, mut item: LineItem) {
        item.quantity = item.quantity.clamp(1, MAX_QUANTITY);
        let key = item.key();
        match self.items.iter_mut().find(|line| line.key() == key) {
            Some(line) => {
                line.quantity = line.quantity.saturating_add(item.quantity).min(MAX_QUANTITY);
            }
            None => self.items.push(item),
        }
    }

    /// Remove the line with `key`. Returns whether a line was removed.
    pub fn remove(&mut self, key: &LineKey) -> bool {
        let before = self.items.len();
        self.items.retain(|line| line.key() != *key);
        self.items.len() != before
    }

    /// Set the quantity of the line with `key`; zero removes the line.
    /// Returns whether a line matched.
    pub fn update_quantity(&mut self, key: &LineKey, quantity: u32) -> bool {
        if quantity == 0 {
            return self.remove(key);
        }
        let quantity = quantity.min(MAX_QUANTITY);
        let mut matched = false;
        for line in self.items.iter_mut().filter(|line| line.key() == *key) {
            line.quantity = quantity;
            matched = true;
        }
        matched
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Sum of `price × quantity` over all lines.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.items.iter().map(LineItem::line_total).sum()
    }

    /// Sum of quantities, shown on the cart badge.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |acc, line| acc.saturating_add(line.quantity))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn frame(id: &str, price: i64, quantity: u32, color: Option<&str>) -> LineItem {
        let mut customizations = Customizations::new();
        if let Some(color) = color {
            customizations.insert("color".to_string(), serde_json::json!(color));
        }
        LineItem {
            id: id.to_string(),
            kind: ItemKind::Product,
            title: format!("Frame {id}"),
            price: Decimal::new(price, 0),
            image: None,
            quantity,
            customizations,
            original_item: None,
        }
    }

    fn assert_total_consistent(cart: &Cart) {
        let expected: Decimal = cart
            .items()
            .iter()
            .map(|l| l.price * Decimal::from(l.quantity))
            .sum();
        assert_eq!(cart.total(), expected);
    }

    #[test]
    fn test_add_same_key_merges_quantity() {
        let mut cart = Cart::new();
        cart.add(frame("p1", 100, 1, Some("black")));
        cart.add(frame("p1", 100, 2, Some("black")));

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, 3);
        assert_total_consistent(&cart);
    }

    #[test]
    fn test_different_customizations_are_separate_lines() {
        let mut cart = Cart::new();
        cart.add(frame("p1", 100, 1, Some("black")));
        cart.add(frame("p1", 100, 1, Some("tortoise")));
        cart.add(frame("p1", 100, 1, None));

        assert_eq!(cart.items().len(), 3);
        assert_eq!(cart.item_count(), 3);
    }

    #[test]
    fn test_same_id_different_kind_are_separate_lines() {
        let mut cart = Cart::new();
        cart.add(frame("x1", 10, 1, None));
        let mut lens = frame("x1", 10, 1, None);
        lens.kind = ItemKind::Lens;
        cart.add(lens);

        assert_eq!(cart.items().len(), 2);
    }

    #[test]
    fn test_customization_order_does_not_matter() {
        let mut a = Customizations::new();
        a.insert("color".into(), serde_json::json!("red"));
        a.insert("lens".into(), serde_json::json!("blue-light"));
        let mut b = Customizations::new();
        b.insert("lens".into(), serde_json::json!("blue-light"));
        b.insert("color".into(), serde_json::json!("red"));

        assert_eq!(
            LineKey::new("p1", ItemKind::Product, &a),
            LineKey::new("p1", ItemKind::Product, &b)
        );
    }

    #[test]
    fn test_update_quantity_zero_removes_line() {
        let mut cart = Cart::new();
        cart.add(frame("p1", 100, 2, None));
        cart.add(frame("p2", 50, 1, None));
        let key = cart.items()[0].key();

        assert!(cart.update_quantity(&key, 0));
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].id, "p2");
        assert_total_consistent(&cart);
    }

    #[test]
    fn test_update_quantity_sets_value() {
        let mut cart = Cart::new();
        cart.add(frame("p1", 100, 2, None));
        let key = cart.items()[0].key();

        assert!(cart.update_quantity(&key, 5));
        assert_eq!(cart.total(), Decimal::new(500, 0));
        let missing = LineKey::new("nope", ItemKind::Product, &Customizations::new());
        assert!(!cart.update_quantity(&missing, 3));
    }

    #[test]
    fn test_total_tracks_every_mutation() {
        let mut cart = Cart::new();
        let mut half = frame("p3", 0, 3, None);
        half.price = Decimal::new(1999, 2);
        cart.add(half);
        assert_total_consistent(&cart);
        cart.add(frame("p1", 120, 1, Some("gold")));
        assert_total_consistent(&cart);
        let key = cart.items()[1].key();
        assert!(cart.update_quantity(&key, 4));
        assert_total_consistent(&cart);
        let first = cart.items()[0].key();
        assert!(cart.remove(&first));
        assert_total_consistent(&cart);
        assert_eq!(cart.total(), Decimal::new(480, 0));
        cart.clear();
        assert_eq!(cart.total(), Decimal::ZERO);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_zero_quantity_add_counts_as_one() {
        let mut cart = Cart::new();
        cart.add(frame("p1", 10, 0, None));
        assert_eq!(cart.item_count(), 1);
    }

    #[test]
    fn test_quantity_is_capped() {
        let mut cart = Cart::new();
        cart.add(frame("p1", 10, 60, None));
        cart.add(frame("p1", 10, 60, None));
        assert_eq!(cart.items()[0].quantity, MAX_QUANTITY);

        cart.add(frame("p2", 10, 500, None));
        assert_eq!(cart.items()[1].quantity, MAX_QUANTITY);

        let key = cart.items()[1].key();
        assert!(cart.update_quantity(&key, 1000));
        assert_eq!(cart.items()[1].quantity, MAX_QUANTITY);
        assert_eq!(cart.item_count(), 2 * MAX_QUANTITY);
    }

    #[test]
    fn test_key_token_round_trip() {
        let item = frame("p1", 100, 1, Some("black"));
        let key = item.key();
        let token = key.to_token();
        assert_eq!(LineKey::from_token(&token), Some(key));
        assert_eq!(LineKey::from_token("garbage"), None);
        assert_eq!(LineKey::from_token("product||{}"), None);
    }

    #[test]
    fn test_cart_serializes_with_wire_names() {
        let mut cart = Cart::new();
        cart.add(frame("p1", 100, 1, None));
        let json = serde_json::to_value(&cart).unwrap();
        assert_eq!(json["items"][0]["type"], "product");
        assert!(json["items"][0].get("originalItem").is_some());

        let back: Cart = serde_json::from_value(json).unwrap();
        assert_eq!(back, cart);
    }
}
