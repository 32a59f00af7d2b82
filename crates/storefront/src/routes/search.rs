//! Search route handlers.
//!
//! Search runs in memory over the cached catalog. The suggestions endpoint
//! backs the header's search-as-you-type dropdown; the input debounces with
//! an HTMX `delay:300ms` trigger.

use std::sync::Arc;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use eyewear_core::search::{self, SearchCriteria, SearchSort};
use eyewear_core::Product;
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::filters;
use crate::routes::products::ProductCard;
use crate::services::{PageContext, Pricing};
use crate::state::AppState;

/// Suggestions shown in the dropdown.
const SUGGESTION_LIMIT: usize = 6;

/// Shortest query that produces suggestions.
const MIN_SUGGEST_CHARS: usize = 2;

// =============================================================================
// Query Types
// =============================================================================

/// Search page query parameters.
///
/// Everything is a string so an empty form field is "not set" rather than a
/// parse error.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    pub category: Option<String>,
    pub gender: Option<String>,
    pub shape: Option<String>,
    pub material: Option<String>,
    pub color: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub sort: Option<String>,
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty()).map(String::from)
}

fn price(value: Option<&String>) -> Option<Decimal> {
    non_empty(value)
        .and_then(|v| v.parse::<Decimal>().ok())
        .filter(|p| !p.is_sign_negative())
}

impl SearchQuery {
    /// Criteria for the core search. Unparsable prices are ignored.
    #[must_use]
    pub fn criteria(&self) -> SearchCriteria {
        SearchCriteria {
            query: self.q.trim().to_string(),
            category: non_empty(self.category.as_ref()),
            gender: non_empty(self.gender.as_ref()),
            frame_shape: non_empty(self.shape.as_ref()),
            frame_material: non_empty(self.material.as_ref()),
            color: non_empty(self.color.as_ref()),
            min_price: price(self.min_price.as_ref()),
            max_price: price(self.max_price.as_ref()),
            sort: self.sort.as_deref().map(SearchSort::parse).unwrap_or_default(),
        }
    }
}

/// Suggestions query parameters.
#[derive(Debug, Deserialize)]
pub struct SuggestQuery {
    #[serde(default)]
    pub q: String,
}

// =============================================================================
// View Models
// =============================================================================

/// A filter dropdown.
#[derive(Debug, Clone)]
pub struct Facet {
    /// Query parameter name.
    pub param: &'static str,
    pub label: &'static str,
    pub options: Vec<FacetOption>,
}

/// One dropdown entry.
#[derive(Debug, Clone)]
pub struct FacetOption {
    pub value: String,
    pub selected: bool,
}

/// A sort dropdown entry.
#[derive(Debug, Clone)]
pub struct SortOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// A suggestion row.
#[derive(Debug, Clone)]
pub struct Suggestion {
    pub id: String,
    pub name: String,
    pub brand: Option<String>,
    pub image: Option<String>,
    pub price: String,
}

fn facet(
    param: &'static str,
    label: &'static str,
    values: Vec<String>,
    selected: Option<&str>,
) -> Facet {
    Facet {
        param,
        label,
        options: values
            .into_iter()
            .map(|value| FacetOption {
                selected: selected.is_some_and(|s| s.eq_ignore_ascii_case(&value)),
                value,
            })
            .collect(),
    }
}

fn facets(catalog: &[Product], criteria: &SearchCriteria) -> Vec<Facet> {
    vec![
        facet(
            "category",
            "Category",
            search::facet_values(catalog, |p| p.category_name().into_iter().collect()),
            criteria.category.as_deref(),
        ),
        facet(
            "gender",
            "Gender",
            search::facet_values(catalog, |p| p.gender.as_deref().into_iter().collect()),
            criteria.gender.as_deref(),
        ),
        facet(
            "shape",
            "Frame shape",
            search::facet_values(catalog, |p| p.frame_shape.as_deref().into_iter().collect()),
            criteria.frame_shape.as_deref(),
        ),
        facet(
            "material",
            "Material",
            search::facet_values(catalog, |p| {
                p.frame_material.as_deref().into_iter().collect()
            }),
            criteria.frame_material.as_deref(),
        ),
        facet(
            "color",
            "Colour",
            search::facet_values(catalog, |p| p.colors.iter().map(String::as_str).collect()),
            criteria.color.as_deref(),
        ),
    ]
}

fn sort_options(selected: SearchSort) -> Vec<SortOption> {
    [
        (SearchSort::Relevance, "Relevance"),
        (SearchSort::PriceAsc, "Price: low to high"),
        (SearchSort::PriceDesc, "Price: high to low"),
        (SearchSort::Newest, "Newest"),
        (SearchSort::Rating, "Top rated"),
    ]
    .into_iter()
    .map(|(sort, label)| SortOption {
        value: sort.as_str(),
        label,
        selected: sort == selected,
    })
    .collect()
}

// =============================================================================
// Templates
// =============================================================================

/// Search page template.
#[derive(Template, WebTemplate)]
#[template(path = "search/index.html")]
pub struct SearchTemplate {
    pub page: PageContext,
    pub query: String,
    pub min_price: String,
    pub max_price: String,
    pub active: bool,
    pub results: Vec<ProductCard>,
    pub facets: Vec<Facet>,
    pub sorts: Vec<SortOption>,
}

/// Suggestions dropdown fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/search_suggestions.html")]
pub struct SuggestionsTemplate {
    pub query: String,
    pub suggestions: Vec<Suggestion>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the search page.
///
/// No query and no filters shows an empty page, not the whole catalog.
#[instrument(skip(state, page))]
pub async fn index(
    State(state): State<AppState>,
    page: PageContext,
    Query(query): Query<SearchQuery>,
) -> impl IntoResponse {
    let criteria = query.criteria();

    let catalog = state.api().catalog().await.unwrap_or_else(|e| {
        tracing::warn!("Failed to fetch catalog for search: {e}");
        Arc::default()
    });

    let results = search::apply(&catalog, &criteria);
    tracing::debug!(results = results.len(), active = criteria.is_active(), "Search");

    SearchTemplate {
        query: criteria.query.clone(),
        min_price: non_empty(query.min_price.as_ref()).unwrap_or_default(),
        max_price: non_empty(query.max_price.as_ref()).unwrap_or_default(),
        active: criteria.is_active(),
        results: ProductCard::many(results, &page),
        facets: facets(&catalog, &criteria),
        sorts: sort_options(criteria.sort),
        page,
    }
}

/// Suggestions dropdown (HTMX).
#[instrument(skip(state, session))]
pub async fn suggest(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<SuggestQuery>,
) -> impl IntoResponse {
    let q = query.q.trim().to_string();
    if q.chars().count() < MIN_SUGGEST_CHARS {
        return SuggestionsTemplate {
            query: q,
            suggestions: Vec::new(),
        };
    }

    let (catalog, pricing) = tokio::join!(state.api().catalog(), Pricing::load(&state, &session));
    let catalog = catalog.unwrap_or_else(|e| {
        tracing::warn!("Failed to fetch catalog for suggestions: {e}");
        Arc::default()
    });

    let suggestions = search::suggest(&catalog, &q, SUGGESTION_LIMIT)
        .into_iter()
        .map(|p| Suggestion {
            id: p.id.to_string(),
            name: p.name.clone(),
            brand: p.brand.clone(),
            image: p.primary_image().map(String::from),
            price: pricing.format(p.effective_price()),
        })
        .collect();

    SuggestionsTemplate {
        query: q,
        suggestions,
    }
}
