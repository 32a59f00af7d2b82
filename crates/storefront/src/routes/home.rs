//! Home page route handler.

use std::sync::Arc;

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use eyewear_core::Product;
use tracing::instrument;

use crate::filters;
use crate::routes::products::{CategoryLink, ProductCard};
use crate::services::PageContext;
use crate::state::AppState;

/// Products in the featured grid.
const FEATURED_LIMIT: usize = 8;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub page: PageContext,
    pub featured: Vec<ProductCard>,
    pub categories: Vec<CategoryLink>,
}

/// Flagged products first; an unflagged catalog shows its first products.
fn featured(catalog: &[Product]) -> Vec<&Product> {
    let flagged: Vec<&Product> = catalog
        .iter()
        .filter(|p| p.is_featured)
        .take(FEATURED_LIMIT)
        .collect();
    if flagged.is_empty() {
        catalog.iter().take(FEATURED_LIMIT).collect()
    } else {
        flagged
    }
}

/// Display the home page.
#[instrument(skip(state, page))]
pub async fn home(State(state): State<AppState>, page: PageContext) -> impl IntoResponse {
    let (catalog, categories) = tokio::join!(state.api().catalog(), state.api().categories());

    let catalog = catalog.unwrap_or_else(|e| {
        tracing::warn!("Failed to fetch catalog for home page: {e}");
        Arc::default()
    });
    let categories = categories.unwrap_or_else(|e| {
        tracing::warn!("Failed to fetch categories for home page: {e}");
        Arc::default()
    });

    HomeTemplate {
        featured: ProductCard::many(featured(&catalog), &page),
        categories: CategoryLink::many(&categories, None),
        page,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(id: &str, featured: bool) -> Product {
        serde_json::from_value(serde_json::json!({
            "_id": id, "name": id, "price": 10, "isFeatured": featured,
        }))
        .unwrap()
    }

    #[test]
    fn test_featured_prefers_flagged() {
        let catalog = vec![product("a", false), product("b", true)];
        let picked = featured(&catalog);
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].id.as_str(), "b");
    }

    #[test]
    fn test_featured_falls_back_to_catalog_order() {
        let catalog: Vec<Product> = (0..10).map(|i| product(&format!("p{i}"), false)).collect();
        assert_eq!(featured(&catalog).len(), FEATURED_LIMIT);
    }
}
