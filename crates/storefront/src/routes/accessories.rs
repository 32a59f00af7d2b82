//! Accessory route handlers.

use std::sync::Arc;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use eyewear_core::{Accessory, AccessoryId};
use serde::Deserialize;
use tracing::instrument;

use crate::api::Page;
use crate::error::Result;
use crate::filters;
use crate::routes::products::Pagination;
use crate::services::PageContext;
use crate::state::AppState;

/// Accessories per listing page.
const PAGE_SIZE: u32 = 12;

/// Accessory tile data.
#[derive(Debug, Clone)]
pub struct AccessoryCard {
    pub id: String,
    pub name: String,
    pub description: String,
    pub image: Option<String>,
    pub price: String,
    pub compare_at_price: Option<String>,
    pub in_stock: bool,
}

impl AccessoryCard {
    #[must_use]
    pub fn new(accessory: &Accessory, page: &PageContext) -> Self {
        let price = accessory.effective_price();
        Self {
            id: accessory.id.to_string(),
            name: accessory.name.clone(),
            description: accessory.description.clone(),
            image: accessory.primary_image().map(String::from),
            price: page.price(price),
            compare_at_price: (price < accessory.price).then(|| page.price(accessory.price)),
            in_stock: accessory.stock.is_none_or(|s| s > 0),
        }
    }
}

/// Listing query parameters.
#[derive(Debug, Deserialize)]
pub struct AccessoryQuery {
    pub page: Option<u32>,
}

/// Accessory listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "accessories/index.html")]
pub struct AccessoriesIndexTemplate {
    pub page: PageContext,
    pub accessories: Vec<AccessoryCard>,
    pub pagination: Pagination,
}

/// Accessory detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "accessories/show.html")]
pub struct AccessoryShowTemplate {
    pub page: PageContext,
    pub accessory: AccessoryCard,
    pub images: Vec<String>,
}

/// Display accessory listing page.
#[instrument(skip(state, page))]
pub async fn index(
    State(state): State<AppState>,
    page: PageContext,
    Query(query): Query<AccessoryQuery>,
) -> impl IntoResponse {
    let number = query.page.unwrap_or(1).max(1);
    let listing = state
        .api()
        .list_accessories(number, PAGE_SIZE)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!("Failed to fetch accessories: {e}");
            Arc::new(Page::default())
        });

    AccessoriesIndexTemplate {
        accessories: listing
            .items
            .iter()
            .map(|a| AccessoryCard::new(a, &page))
            .collect(),
        pagination: Pagination::new(&listing, "/accessories?"),
        page,
    }
}

/// Display accessory detail page.
#[instrument(skip(state, page))]
pub async fn show(
    State(state): State<AppState>,
    page: PageContext,
    Path(id): Path<AccessoryId>,
) -> Result<impl IntoResponse> {
    let accessory = state.api().get_accessory(&id).await?;

    Ok(AccessoryShowTemplate {
        accessory: AccessoryCard::new(&accessory, &page),
        images: accessory.images.clone(),
        page,
    })
}
