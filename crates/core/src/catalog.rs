//! Catalog entities as the backend serves them.
//!
//! The backend is not consistent about field names (`_id` vs `id`, `title`
//! vs `name`, a single `image` vs an `images` array, a populated category
//! object vs a bare category string), and some documents carry two spellings
//! of the same field at once. Each entity deserializes through a private raw
//! struct that declares every spelling as its own field, so nothing
//! downstream has to care.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use crate::types::{AccessoryId, CategoryId, ProductId};

/// A category reference embedded in a product.
///
/// Either the populated category document or just its name/id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged, from = "RawCategoryRef")]
pub enum CategoryRef {
    Populated { id: Option<CategoryId>, name: String },
    Name(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCategoryRef {
    Populated {
        #[serde(rename = "_id")]
        mongo_id: Option<CategoryId>,
        id: Option<CategoryId>,
        name: String,
    },
    Name(String),
}

impl From<RawCategoryRef> for CategoryRef {
    fn from(raw: RawCategoryRef) -> Self {
        match raw {
            RawCategoryRef::Populated { mongo_id, id, name } => Self::Populated {
                id: id.or(mongo_id),
                name,
            },
            RawCategoryRef::Name(name) => Self::Name(name),
        }
    }
}

impl CategoryRef {
    /// The category name used for display and filtering.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Populated { name, .. } | Self::Name(name) => name,
        }
    }
}

/// A frame (glasses or sunglasses) in the catalog.
///
/// Deserialized through [`RawProduct`], so a document may carry several
/// spellings of the same field at once (`_id` next to `id`, `image` next to
/// `images`) without being rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawProduct")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub sale_price: Option<Decimal>,
    pub category: Option<CategoryRef>,
    pub brand: Option<String>,
    pub gender: Option<String>,
    pub frame_shape: Option<String>,
    pub frame_material: Option<String>,
    pub colors: Vec<String>,
    pub images: Vec<String>,
    pub stock: Option<u32>,
    pub rating: Option<f64>,
    pub num_reviews: u32,
    pub model_url: Option<String>,
    pub is_featured: bool,
    pub created_at: Option<DateTime<Utc>>,
}

/// Every spelling of a product field the backend has been seen to send.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawProduct {
    #[serde(rename = "_id")]
    mongo_id: Option<ProductId>,
    id: Option<ProductId>,
    name: Option<String>,
    title: Option<String>,
    description: Option<String>,
    price: Decimal,
    sale_price: Option<Decimal>,
    discount_price: Option<Decimal>,
    category: Option<CategoryRef>,
    brand: Option<String>,
    gender: Option<String>,
    frame_shape: Option<String>,
    shape: Option<String>,
    frame_material: Option<String>,
    material: Option<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    colors: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    color: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    images: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    image: Vec<String>,
    stock: Option<u32>,
    count_in_stock: Option<u32>,
    rating: Option<f64>,
    num_reviews: Option<u32>,
    model_url: Option<String>,
    glb_file: Option<String>,
    model3d: Option<String>,
    is_featured: Option<bool>,
    featured: Option<bool>,
    created_at: Option<DateTime<Utc>>,
}

impl TryFrom<RawProduct> for Product {
    type Error = &'static str;

    fn try_from(raw: RawProduct) -> Result<Self, Self::Error> {
        Ok(Self {
            id: raw.id.or(raw.mongo_id).ok_or("product has no id")?,
            name: raw.name.or(raw.title).ok_or("product has no name")?,
            description: raw.description.unwrap_or_default(),
            price: raw.price,
            sale_price: raw.sale_price.or(raw.discount_price),
            category: raw.category,
            brand: raw.brand,
            gender: raw.gender,
            frame_shape: raw.frame_shape.or(raw.shape),
            frame_material: raw.frame_material.or(raw.material),
            colors: non_empty_or(raw.colors, raw.color),
            images: non_empty_or(raw.images, raw.image),
            stock: raw.stock.or(raw.count_in_stock),
            rating: raw.rating,
            num_reviews: raw.num_reviews.unwrap_or_default(),
            model_url: raw.model_url.or(raw.glb_file).or(raw.model3d),
            is_featured: raw.is_featured.or(raw.featured).unwrap_or_default(),
            created_at: raw.created_at,
        })
    }
}

impl Product {
    /// The price the shopper pays: the sale price when it undercuts the
    /// list price, otherwise the list price.
    #[must_use]
    pub fn effective_price(&self) -> Decimal {
        match self.sale_price {
            Some(sale) if sale > Decimal::ZERO && sale < self.price => sale,
            _ => self.price,
        }
    }

    /// Whether the product is discounted.
    #[must_use]
    pub fn on_sale(&self) -> bool {
        self.effective_price() < self.price
    }

    /// First image, if any.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    /// Category name, if any.
    #[must_use]
    pub fn category_name(&self) -> Option<&str> {
        self.category.as_ref().map(CategoryRef::name)
    }

    /// Products without stock information are treated as available.
    #[must_use]
    pub fn in_stock(&self) -> bool {
        self.stock.is_none_or(|s| s > 0)
    }
}

/// An accessory (cases, cleaning kits, chains).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawAccessory")]
pub struct Accessory {
    pub id: AccessoryId,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub sale_price: Option<Decimal>,
    pub images: Vec<String>,
    pub stock: Option<u32>,
    pub category: Option<CategoryRef>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAccessory {
    #[serde(rename = "_id")]
    mongo_id: Option<AccessoryId>,
    id: Option<AccessoryId>,
    name: Option<String>,
    title: Option<String>,
    description: Option<String>,
    price: Decimal,
    sale_price: Option<Decimal>,
    discount_price: Option<Decimal>,
    #[serde(default, deserialize_with = "one_or_many")]
    images: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    image: Vec<String>,
    stock: Option<u32>,
    count_in_stock: Option<u32>,
    category: Option<CategoryRef>,
}

impl TryFrom<RawAccessory> for Accessory {
    type Error = &'static str;

    fn try_from(raw: RawAccessory) -> Result<Self, Self::Error> {
        Ok(Self {
            id: raw.id.or(raw.mongo_id).ok_or("accessory has no id")?,
            name: raw.name.or(raw.title).ok_or("accessory has no name")?,
            description: raw.description.unwrap_or_default(),
            price: raw.price,
            sale_price: raw.sale_price.or(raw.discount_price),
            images: non_empty_or(raw.images, raw.image),
            stock: raw.stock.or(raw.count_in_stock),
            category: raw.category,
        })
    }
}

impl Accessory {
    /// See [`Product::effective_price`].
    #[must_use]
    pub fn effective_price(&self) -> Decimal {
        match self.sale_price {
            Some(sale) if sale > Decimal::ZERO && sale < self.price => sale,
            _ => self.price,
        }
    }

    /// First image, if any.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }
}

/// A browsable category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawCategory")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: Option<String>,
    pub image: Option<String>,
    pub description: Option<String>,
}

#[derive(Deserialize)]
struct RawCategory {
    #[serde(rename = "_id")]
    mongo_id: Option<CategoryId>,
    id: Option<CategoryId>,
    name: String,
    slug: Option<String>,
    image: Option<String>,
    description: Option<String>,
}

impl TryFrom<RawCategory> for Category {
    type Error = &'static str;

    fn try_from(raw: RawCategory) -> Result<Self, Self::Error> {
        Ok(Self {
            id: raw.id.or(raw.mongo_id).ok_or("category has no id")?,
            name: raw.name,
            slug: raw.slug,
            image: raw.image,
            description: raw.description,
        })
    }
}

impl Category {
    /// URL slug; derived from the name when the backend omits it.
    #[must_use]
    pub fn slug(&self) -> String {
        self.slug.clone().unwrap_or_else(|| slugify(&self.name))
    }
}

/// Lowercase, dash-separated slug.
#[must_use]
pub fn slugify(name: &str) -> String {
    name.split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

/// A lens package sold as its own cart line alongside a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LensOption {
    pub id: &'static str,
    pub name: &'static str,
    price_cents: i64,
}

impl LensOption {
    #[must_use]
    pub fn price(&self) -> Decimal {
        Decimal::new(self.price_cents, 2)
    }
}

/// Lens packages offered on every frame.
pub const LENS_OPTIONS: [LensOption; 4] = [
    LensOption {
        id: "single-vision",
        name: "Single vision",
        price_cents: 4_900,
    },
    LensOption {
        id: "blue-light",
        name: "Blue light filtering",
        price_cents: 7_900,
    },
    LensOption {
        id: "progressive",
        name: "Progressive",
        price_cents: 19_900,
    },
    LensOption {
        id: "polarized",
        name: "Polarized sun lenses",
        price_cents: 9_900,
    },
];

/// Look up a lens package by id.
#[must_use]
pub fn lens_option(id: &str) -> Option<&'static LensOption> {
    LENS_OPTIONS.iter().find(|l| l.id == id)
}

/// `preferred` unless it is empty.
fn non_empty_or<T>(preferred: Vec<T>, fallback: Vec<T>) -> Vec<T> {
    if preferred.is_empty() {
        fallback
    } else {
        preferred
    }
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
        Null(()),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) if s.is_empty() => Vec::new(),
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
        OneOrMany::Null(()) => Vec::new(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_lens_lookup() {
        let lens = lens_option("progressive").unwrap();
        assert_eq!(lens.price(), Decimal::new(19_900, 2));
        assert!(lens_option("bifocal").is_none());
    }

    #[test]
    fn test_product_accepts_backend_aliases() {
        let json = r#"{
            "_id": "p1",
            "title": "Aviator Classic",
            "price": 120.5,
            "discountPrice": 99,
            "category": {"_id": "c1", "name": "Sunglasses"},
            "shape": "Aviator",
            "frameMaterial": "Metal",
            "color": "Gold",
            "image": "https://cdn.example.com/aviator.jpg",
            "countInStock": 0,
            "numReviews": 4,
            "glbFile": "https://cdn.example.com/aviator.glb",
            "passwordHash": "ignored"
        }"#;

        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.id.as_str(), "p1");
        assert_eq!(product.name, "Aviator Classic");
        assert_eq!(product.category_name(), Some("Sunglasses"));
        assert_eq!(product.frame_shape.as_deref(), Some("Aviator"));
        assert_eq!(product.colors, vec!["Gold".to_string()]);
        assert_eq!(product.primary_image(), Some("https://cdn.example.com/aviator.jpg"));
        assert_eq!(product.effective_price(), Decimal::new(99, 0));
        assert!(product.on_sale());
        assert!(!product.in_stock());
        assert_eq!(product.num_reviews, 4);
        assert!(product.model_url.is_some());
    }

    #[test]
    fn test_product_minimal_fields() {
        let json = r#"{"id": "p2", "name": "Round", "price": 80, "category": "Eyeglasses", "images": null}"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.category_name(), Some("Eyeglasses"));
        assert!(product.images.is_empty());
        assert!(product.in_stock());
        assert!(!product.on_sale());
    }

    #[test]
    fn test_product_with_both_id_keys() {
        let json = r#"{"_id": "65a1", "id": "65a1", "name": "Round", "price": 80}"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.id.as_str(), "65a1");
    }

    #[test]
    fn test_product_with_both_image_keys() {
        let json = r#"{
            "id": "p4",
            "name": "Wayfarer",
            "title": "Wayfarer (legacy)",
            "price": 95,
            "image": "https://cdn.example.com/cover.jpg",
            "images": ["https://cdn.example.com/front.jpg", "https://cdn.example.com/side.jpg"],
            "color": "Black",
            "colors": ["Black", "Havana"],
            "stock": 3,
            "countInStock": 7
        }"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.name, "Wayfarer");
        assert_eq!(product.images.len(), 2);
        assert_eq!(product.colors, vec!["Black".to_string(), "Havana".to_string()]);
        assert_eq!(product.stock, Some(3));
    }

    #[test]
    fn test_product_without_id_is_rejected() {
        let json = r#"{"name": "Nameless", "price": 10}"#;
        let err = serde_json::from_str::<Product>(json).unwrap_err();
        assert!(err.to_string().contains("product has no id"));
    }

    #[test]
    fn test_product_survives_its_own_serialization() {
        let json = r#"{"_id": "p5", "title": "Oval", "price": "60.00", "discountPrice": 45,
            "category": {"_id": "c2", "id": "c2", "name": "Eyeglasses"}, "featured": true}"#;
        let product: Product = serde_json::from_str(json).unwrap();
        let json = serde_json::to_value(&product).unwrap();
        let again: Product = serde_json::from_value(json).unwrap();
        assert_eq!(again, product);
        assert!(again.is_featured);
        assert_eq!(again.category_name(), Some("Eyeglasses"));
    }

    #[test]
    fn test_accessory_and_category_with_both_id_keys() {
        let accessory: Accessory = serde_json::from_str(
            r#"{"_id": "a1", "id": "a1", "name": "Hard case", "price": 15, "image": "case.jpg", "images": []}"#,
        )
        .unwrap();
        assert_eq!(accessory.id.as_str(), "a1");
        assert_eq!(accessory.primary_image(), Some("case.jpg"));

        let category: Category =
            serde_json::from_str(r#"{"_id": "c1", "id": "c1", "name": "Sunglasses"}"#).unwrap();
        assert_eq!(category.id.as_str(), "c1");
    }

    #[test]
    fn test_sale_price_above_list_is_ignored() {
        let json = r#"{"id": "p3", "name": "Cat Eye", "price": 50, "salePrice": 70}"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.effective_price(), Decimal::new(50, 0));
    }

    #[test]
    fn test_category_slug() {
        let category = Category {
            id: CategoryId::new("c1"),
            name: "Blue Light & Computer".to_string(),
            slug: None,
            image: None,
            description: None,
        };
        assert_eq!(category.slug(), "blue-light-computer");
    }
}
