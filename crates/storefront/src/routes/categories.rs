//! Category route handlers.

use std::sync::Arc;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use tracing::instrument;

use crate::api::{Page, ProductQuery};
use crate::error::{AppError, Result};
use crate::filters;
use crate::routes::products::{ListingQuery, Pagination, ProductCard};
use crate::services::PageContext;
use crate::state::AppState;

/// Category page template.
#[derive(Template, WebTemplate)]
#[template(path = "categories/show.html")]
pub struct CategoryShowTemplate {
    pub page: PageContext,
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub products: Vec<ProductCard>,
    pub pagination: Pagination,
}

/// Display the products of one category, looked up by slug.
#[instrument(skip(state, page))]
pub async fn show(
    State(state): State<AppState>,
    page: PageContext,
    Path(slug): Path<String>,
    Query(query): Query<ListingQuery>,
) -> Result<impl IntoResponse> {
    let categories = state.api().categories().await?;
    let category = categories
        .iter()
        .find(|c| c.slug() == slug)
        .ok_or_else(|| AppError::NotFound(format!("category {slug}")))?;

    let product_query = ProductQuery {
        page: query.page.unwrap_or(1).max(1),
        category: Some(category.id.to_string()),
        sort: query.sort.clone().filter(|s| !s.trim().is_empty()),
        ..ProductQuery::default()
    };
    let listing = state
        .api()
        .list_products(&product_query)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(category = %slug, "Failed to fetch category products: {e}");
            Arc::new(Page::default())
        });

    Ok(CategoryShowTemplate {
        name: category.name.clone(),
        description: category.description.clone(),
        image: category.image.clone(),
        products: ProductCard::many(&listing.items, &page),
        pagination: Pagination::new(&listing, &format!("/categories/{slug}?")),
        page,
    })
}
