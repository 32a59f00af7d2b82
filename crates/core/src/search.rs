//! Search and filter state keeper.
//!
//! The storefront fetches the whole catalog once and filters it in memory:
//! a text match first, then a chain of attribute-equality predicates, then
//! the price range. Every step is a linear pass; the catalog is small enough
//! that an index would cost more than it saves.
//!
//! An empty query with no filters selected yields **no** results rather than
//! the full catalog, so a cleared search page is blank.

use std::cmp::Ordering;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::Product;

/// Result ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SearchSort {
    /// Catalog order.
    #[default]
    Relevance,
    PriceAsc,
    PriceDesc,
    Newest,
    Rating,
}

impl SearchSort {
    /// Parse a query-string value; unknown values fall back to relevance.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "price-asc" => Self::PriceAsc,
            "price-desc" => Self::PriceDesc,
            "newest" => Self::Newest,
            "rating" => Self::Rating,
            _ => Self::Relevance,
        }
    }

    /// Query-string value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Relevance => "relevance",
            Self::PriceAsc => "price-asc",
            Self::PriceDesc => "price-desc",
            Self::Newest => "newest",
            Self::Rating => "rating",
        }
    }
}

/// Query text plus selected filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchCriteria {
    pub query: String,
    pub category: Option<String>,
    pub gender: Option<String>,
    pub frame_shape: Option<String>,
    pub frame_material: Option<String>,
    pub color: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub sort: SearchSort,
}

impl SearchCriteria {
    /// Criteria with only a text query.
    #[must_use]
    pub fn text(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    /// The state after "clear filters": no query, no filters.
    #[must_use]
    pub fn cleared() -> Self {
        Self::default()
    }

    /// Whether any attribute or price filter is selected.
    #[must_use]
    pub fn has_filters(&self) -> bool {
        [
            &self.category,
            &self.gender,
            &self.frame_shape,
            &self.frame_material,
            &self.color,
        ]
        .into_iter()
        .any(|f| f.as_deref().is_some_and(|v| !v.trim().is_empty()))
            || self.min_price.is_some()
            || self.max_price.is_some()
    }

    /// Whether these criteria would produce any results at all.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.query.trim().is_empty() || self.has_filters()
    }
}

/// Apply `criteria` to `catalog`.
#[must_use]
pub fn apply<'a>(catalog: &'a [Product], criteria: &SearchCriteria) -> Vec<&'a Product> {
    if !criteria.is_active() {
        return Vec::new();
    }

    let needle = criteria.query.trim().to_lowercase();
    let mut results: Vec<&Product> = catalog
        .iter()
        .filter(|p| needle.is_empty() || matches_text(p, &needle))
        .filter(|p| attr_matches(p.category_name(), criteria.category.as_deref()))
        .filter(|p| attr_matches(p.gender.as_deref(), criteria.gender.as_deref()))
        .filter(|p| attr_matches(p.frame_shape.as_deref(), criteria.frame_shape.as_deref()))
        .filter(|p| {
            attr_matches(
                p.frame_material.as_deref(),
                criteria.frame_material.as_deref(),
            )
        })
        .filter(|p| color_matches(p, criteria.color.as_deref()))
        .filter(|p| criteria.min_price.is_none_or(|min| p.effective_price() >= min))
        .filter(|p| criteria.max_price.is_none_or(|max| p.effective_price() <= max))
        .collect();

    sort(&mut results, criteria.sort);
    results
}

/// Up to `limit` text matches, for the search-as-you-type dropdown.
#[must_use]
pub fn suggest<'a>(catalog: &'a [Product], query: &str, limit: usize) -> Vec<&'a Product> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    catalog
        .iter()
        .filter(|p| matches_text(p, &needle))
        .take(limit)
        .collect()
}

/// Distinct, sorted values of an attribute across the catalog, used to
/// populate filter dropdowns.
#[must_use]
pub fn facet_values<'a, F>(catalog: &'a [Product], attr: F) -> Vec<String>
where
    F: Fn(&'a Product) -> Vec<&'a str>,
{
    let mut values: Vec<String> = catalog
        .iter()
        .flat_map(attr)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToOwned::to_owned)
        .collect();
    values.sort_by_key(|v| v.to_lowercase());
    values.dedup_by(|a, b| a.eq_ignore_ascii_case(b));
    values
}

fn matches_text(product: &Product, needle: &str) -> bool {
    let haystacks = [
        Some(product.name.as_str()),
        product.brand.as_deref(),
        product.category_name(),
        Some(product.description.as_str()),
    ];
    haystacks
        .into_iter()
        .flatten()
        .any(|h| h.to_lowercase().contains(needle))
}

fn attr_matches(value: Option<&str>, wanted: Option<&str>) -> bool {
    match wanted.map(str::trim) {
        None | Some("") => true,
        Some(wanted) => value.is_some_and(|v| v.trim().eq_ignore_ascii_case(wanted)),
    }
}

fn color_matches(product: &Product, wanted: Option<&str>) -> bool {
    match wanted.map(str::trim) {
        None | Some("") => true,
        Some(wanted) => product
            .colors
            .iter()
            .any(|c| c.trim().eq_ignore_ascii_case(wanted)),
    }
}

fn sort(results: &mut [&Product], order: SearchSort) {
    match order {
        SearchSort::Relevance => {}
        SearchSort::PriceAsc => results.sort_by_key(|p| p.effective_price()),
        SearchSort::PriceDesc => results.sort_by_key(|p| std::cmp::Reverse(p.effective_price())),
        SearchSort::Newest => results.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SearchSort::Rating => results.sort_by(|a, b| {
            b.rating
                .unwrap_or(0.0)
                .partial_cmp(&a.rating.unwrap_or(0.0))
                .unwrap_or(Ordering::Equal)
        }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn catalog() -> Vec<Product> {
        serde_json::from_value(serde_json::json!([
            {"_id": "1", "name": "Aviator Gold", "price": 150, "category": "Sunglasses",
             "gender": "Unisex", "frameShape": "Aviator", "frameMaterial": "Metal",
             "colors": ["Gold", "Silver"], "rating": 4.5, "createdAt": "2024-03-01T00:00:00Z"},
            {"_id": "2", "name": "Round Reader", "price": 60, "category": "Eyeglasses",
             "gender": "Women", "frameShape": "Round", "frameMaterial": "Acetate",
             "colors": ["Tortoise"], "rating": 3.9, "createdAt": "2024-05-01T00:00:00Z"},
            {"_id": "3", "name": "Wayfarer", "price": 120, "salePrice": 90, "brand": "Sunny",
             "category": "Sunglasses", "gender": "Men", "frameShape": "Square",
             "frameMaterial": "Acetate", "colors": ["Black"], "rating": 4.8,
             "createdAt": "2023-11-01T00:00:00Z"},
            {"_id": "4", "name": "Blue Block", "price": 80, "category": "Computer Glasses",
             "description": "Blue light filtering round frames", "gender": "Unisex",
             "frameShape": "Round", "frameMaterial": "TR90", "colors": ["Black", "Clear"]}
        ]))
        .unwrap()
    }

    fn ids(results: &[&Product]) -> Vec<String> {
        results.iter().map(|p| p.id.to_string()).collect()
    }

    #[test]
    fn test_empty_query_and_no_filters_is_empty() {
        let catalog = catalog();
        assert!(apply(&catalog, &SearchCriteria::default()).is_empty());
        assert!(apply(&catalog, &SearchCriteria::text("   ")).is_empty());
    }

    #[test]
    fn test_clearing_filters_resets_to_empty() {
        let catalog = catalog();
        let filtered = SearchCriteria {
            category: Some("Sunglasses".into()),
            ..SearchCriteria::default()
        };
        assert_eq!(apply(&catalog, &filtered).len(), 2);
        assert!(apply(&catalog, &SearchCriteria::cleared()).is_empty());
    }

    #[test]
    fn test_text_match_is_case_insensitive_across_fields() {
        let catalog = catalog();
        assert_eq!(ids(&apply(&catalog, &SearchCriteria::text("AVIATOR"))), vec!["1"]);
        // brand
        assert_eq!(ids(&apply(&catalog, &SearchCriteria::text("sunny"))), vec!["3"]);
        // description
        assert_eq!(ids(&apply(&catalog, &SearchCriteria::text("blue light"))), vec!["4"]);
        // category
        assert_eq!(
            ids(&apply(&catalog, &SearchCriteria::text("sunglasses"))),
            vec!["1", "3"]
        );
    }

    #[test]
    fn test_filters_without_query_filter_whole_catalog() {
        let catalog = catalog();
        let criteria = SearchCriteria {
            frame_shape: Some("round".into()),
            ..SearchCriteria::default()
        };
        assert_eq!(ids(&apply(&catalog, &criteria)), vec!["2", "4"]);
    }

    #[test]
    fn test_filters_chain_after_text_match() {
        let catalog = catalog();
        let criteria = SearchCriteria {
            query: "glasses".into(),
            frame_material: Some("Acetate".into()),
            gender: Some("men".into()),
            ..SearchCriteria::default()
        };
        assert_eq!(ids(&apply(&catalog, &criteria)), vec!["3"]);
    }

    #[test]
    fn test_color_matches_any_variant() {
        let catalog = catalog();
        let criteria = SearchCriteria {
            color: Some("black".into()),
            ..SearchCriteria::default()
        };
        assert_eq!(ids(&apply(&catalog, &criteria)), vec!["3", "4"]);
    }

    #[test]
    fn test_price_range_uses_effective_price() {
        let catalog = catalog();
        let criteria = SearchCriteria {
            max_price: Some(Decimal::new(100, 0)),
            sort: SearchSort::PriceAsc,
            ..SearchCriteria::default()
        };
        // Wayfarer is on sale for 90.
        assert_eq!(ids(&apply(&catalog, &criteria)), vec!["2", "4", "3"]);
    }

    #[test]
    fn test_blank_filter_values_are_ignored() {
        let criteria = SearchCriteria {
            category: Some("  ".into()),
            ..SearchCriteria::default()
        };
        assert!(!criteria.has_filters());
        assert!(apply(&catalog(), &criteria).is_empty());
    }

    #[test]
    fn test_sorting() {
        let catalog = catalog();
        let mut criteria = SearchCriteria {
            category: Some("sunglasses".into()),
            sort: SearchSort::PriceDesc,
            ..SearchCriteria::default()
        };
        assert_eq!(ids(&apply(&catalog, &criteria)), vec!["1", "3"]);

        criteria.sort = SearchSort::Rating;
        assert_eq!(ids(&apply(&catalog, &criteria)), vec!["3", "1"]);

        criteria.sort = SearchSort::Newest;
        assert_eq!(ids(&apply(&catalog, &criteria)), vec!["1", "3"]);
    }

    #[test]
    fn test_suggest_limits_results() {
        let catalog = catalog();
        assert_eq!(suggest(&catalog, "r", 2).len(), 2);
        assert!(suggest(&catalog, "", 5).is_empty());
    }

    #[test]
    fn test_facet_values_dedup_case_insensitive() {
        let catalog = catalog();
        let shapes = facet_values(&catalog, |p| p.frame_shape.as_deref().into_iter().collect());
        assert_eq!(shapes, vec!["Aviator", "Round", "Square"]);

        let colors = facet_values(&catalog, |p| p.colors.iter().map(String::as_str).collect());
        assert_eq!(colors, vec!["Black", "Clear", "Gold", "Silver", "Tortoise"]);
    }

    #[test]
    fn test_sort_parse() {
        assert_eq!(SearchSort::parse("price-desc"), SearchSort::PriceDesc);
        assert_eq!(SearchSort::parse("bogus"), SearchSort::Relevance);
    }
}
