//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use eyewear_core::catalog::LENS_OPTIONS;
use eyewear_core::reviews::{Review, ReviewStats};
use eyewear_core::{Category, Product, ProductId};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::api::{ApiError, Page, ProductQuery, ReviewInput};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{OptionalAuth, RequireAuth, forget_on_unauthorized};
use crate::routes::pd;
use crate::services::{PageContext, wishlist};
use crate::state::AppState;

/// Number of related products on a detail page.
const RELATED_LIMIT: usize = 4;

// =============================================================================
// View Models
// =============================================================================

/// Product tile data for grids.
#[derive(Debug, Clone)]
pub struct ProductCard {
    pub id: String,
    pub name: String,
    pub brand: Option<String>,
    pub image: Option<String>,
    pub price: String,
    pub compare_at_price: Option<String>,
    pub rating: f64,
    pub in_stock: bool,
}

impl ProductCard {
    #[must_use]
    pub fn new(product: &Product, page: &PageContext) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            brand: product.brand.clone(),
            image: product.primary_image().map(String::from),
            price: page.price(product.effective_price()),
            compare_at_price: product.on_sale().then(|| page.price(product.price)),
            rating: product.rating.unwrap_or(0.0),
            in_stock: product.in_stock(),
        }
    }

    /// Cards for a slice of products.
    #[must_use]
    pub fn many<'a>(
        products: impl IntoIterator<Item = &'a Product>,
        page: &PageContext,
    ) -> Vec<Self> {
        products.into_iter().map(|p| Self::new(p, page)).collect()
    }
}

/// Category link for filter bars.
#[derive(Debug, Clone)]
pub struct CategoryLink {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub active: bool,
}

impl CategoryLink {
    #[must_use]
    pub fn many(categories: &[Category], active: Option<&str>) -> Vec<Self> {
        categories
            .iter()
            .map(|c| Self {
                id: c.id.to_string(),
                name: c.name.clone(),
                slug: c.slug(),
                active: active == Some(c.id.as_str()),
            })
            .collect()
    }
}

/// A review as shown on the product page.
#[derive(Debug, Clone)]
pub struct ReviewView {
    pub author: String,
    pub rating: u8,
    pub comment: String,
    pub date: Option<String>,
}

impl From<&Review> for ReviewView {
    fn from(review: &Review) -> Self {
        Self {
            author: if review.author.is_empty() {
                "Anonymous".to_string()
            } else {
                review.author.clone()
            },
            rating: review.rating.clamp(1, 5),
            comment: review.comment.clone(),
            date: review.created_at.map(|d| d.format("%B %-d, %Y").to_string()),
        }
    }
}

/// One histogram bar.
#[derive(Debug, Clone)]
pub struct StarBar {
    pub stars: u8,
    pub count: u32,
    pub percent: u32,
}

/// Lens package as offered on the detail page.
#[derive(Debug, Clone)]
pub struct LensView {
    pub id: &'static str,
    pub name: &'static str,
    pub price: String,
}

/// Previous/next links for paginated listings.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub page: u32,
    pub total_pages: u32,
    pub prev: Option<String>,
    pub next: Option<String>,
}

impl Pagination {
    /// Build links by appending `page=N` to `base` (which ends in `?` or `&`).
    #[must_use]
    pub fn new<T>(listing: &Page<T>, base: &str) -> Self {
        Self {
            page: listing.page,
            total_pages: listing.total_pages,
            prev: listing
                .has_prev()
                .then(|| format!("{base}page={}", listing.page - 1)),
            next: listing
                .has_next()
                .then(|| format!("{base}page={}", listing.page + 1)),
        }
    }
}

// =============================================================================
// Query / Form Types
// =============================================================================

/// Listing query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ListingQuery {
    pub page: Option<u32>,
    pub category: Option<String>,
    pub sort: Option<String>,
}

impl ListingQuery {
    fn category(&self) -> Option<&str> {
        self.category.as_deref().filter(|c| !c.trim().is_empty())
    }

    fn sort(&self) -> Option<&str> {
        self.sort.as_deref().filter(|s| !s.trim().is_empty())
    }

    /// Query string prefix preserving everything except the page.
    fn link_base(&self, path: &str) -> String {
        let mut base = format!("{path}?");
        if let Some(category) = self.category() {
            base.push_str(&format!("category={}&", urlencoding::encode(category)));
        }
        if let Some(sort) = self.sort() {
            base.push_str(&format!("sort={}&", urlencoding::encode(sort)));
        }
        base
    }
}

/// Detail page query parameters.
#[derive(Debug, Deserialize)]
pub struct DetailQuery {
    pub review_error: Option<String>,
}

/// Review form data.
#[derive(Debug, Deserialize)]
pub struct ReviewForm {
    pub rating: u8,
    pub comment: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub page: PageContext,
    pub products: Vec<ProductCard>,
    pub categories: Vec<CategoryLink>,
    pub sort: String,
    pub pagination: Pagination,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub page: PageContext,
    pub product: ProductCard,
    pub description: String,
    pub images: Vec<String>,
    pub colors: Vec<String>,
    pub details: Vec<(String, String)>,
    pub has_model: bool,
    pub lenses: Vec<LensView>,
    pub reviews: Vec<ReviewView>,
    pub stats: ReviewStats,
    pub star_bars: Vec<StarBar>,
    pub related: Vec<ProductCard>,
    pub in_wishlist: bool,
    pub review_error: Option<String>,
    /// Last plausible PD measured in this session, in millimetres.
    pub pd: Option<String>,
}

/// Virtual try-on page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/try_on.html")]
pub struct TryOnTemplate {
    pub page: PageContext,
    pub product: ProductCard,
    pub model_url: Option<String>,
    pub images: Vec<String>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display product listing page.
#[instrument(skip(state, page))]
pub async fn index(
    State(state): State<AppState>,
    page: PageContext,
    Query(query): Query<ListingQuery>,
) -> impl IntoResponse {
    let product_query = ProductQuery {
        page: query.page.unwrap_or(1).max(1),
        category: query.category().map(String::from),
        sort: query.sort().map(String::from),
        ..ProductQuery::default()
    };

    let (listing, categories) = tokio::join!(
        state.api().list_products(&product_query),
        state.api().categories(),
    );

    let listing = listing.unwrap_or_else(|e| {
        tracing::warn!("Failed to fetch products: {e}");
        std::sync::Arc::new(Page::default())
    });
    let categories = categories.unwrap_or_else(|e| {
        tracing::warn!("Failed to fetch categories: {e}");
        std::sync::Arc::default()
    });

    ProductsIndexTemplate {
        products: ProductCard::many(&listing.items, &page),
        categories: CategoryLink::many(&categories, query.category()),
        sort: query.sort().unwrap_or_default().to_string(),
        pagination: Pagination::new(&listing, &query.link_base("/products")),
        page,
    }
}

/// Display product detail page.
#[instrument(skip(state, session, page, user))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    page: PageContext,
    OptionalAuth(user): OptionalAuth,
    Path(id): Path<ProductId>,
    Query(query): Query<DetailQuery>,
) -> Result<Response> {
    let product = state.api().get_product(&id).await?;

    let (reviews, catalog) = tokio::join!(
        state.api().product_reviews(&id),
        state.api().catalog(),
    );
    let reviews = reviews.unwrap_or_else(|e| {
        tracing::warn!(product_id = %id, "Failed to fetch reviews: {e}");
        Vec::new()
    });
    let related = catalog.map_or_else(
        |e| {
            tracing::warn!("Failed to fetch catalog for related products: {e}");
            Vec::new()
        },
        |catalog| {
            let cards = related_products(&catalog, &product);
            ProductCard::many(cards, &page)
        },
    );

    let in_wishlist = match &user {
        Some(user) => wishlist::load(&state, &session, user).await.contains(&id),
        None => false,
    };

    let stats = ReviewStats::from_reviews(&reviews);
    let star_bars = (1..=5u8)
        .rev()
        .map(|stars| StarBar {
            stars,
            count: stats
                .distribution
                .get(usize::from(stars - 1))
                .copied()
                .unwrap_or(0),
            percent: stats.percent(stars),
        })
        .collect();

    let details = [
        ("Brand", product.brand.as_deref()),
        ("Category", product.category_name()),
        ("Gender", product.gender.as_deref()),
        ("Frame shape", product.frame_shape.as_deref()),
        ("Material", product.frame_material.as_deref()),
    ]
    .into_iter()
    .filter_map(|(label, value)| value.map(|v| (label.to_string(), v.to_string())))
    .collect();

    let pd = pd::last_measurement(&session)
        .await
        .filter(|m| m.plausible)
        .map(|m| format!("{:.1}", m.millimeters));

    let lenses = LENS_OPTIONS
        .iter()
        .map(|l| LensView {
            id: l.id,
            name: l.name,
            price: page.price(l.price()),
        })
        .collect();

    Ok(ProductShowTemplate {
        product: ProductCard::new(&product, &page),
        description: product.description.clone(),
        images: product.images.clone(),
        colors: product.colors.clone(),
        details,
        has_model: product.model_url.is_some(),
        lenses,
        reviews: reviews.iter().map(ReviewView::from).collect(),
        stats,
        star_bars,
        related,
        in_wishlist,
        review_error: query.review_error,
        pd,
        page,
    }
    .into_response())
}

/// Same-category products, excluding the product itself.
fn related_products<'a>(catalog: &'a [Product], product: &Product) -> Vec<&'a Product> {
    let Some(category) = product.category_name() else {
        return Vec::new();
    };
    catalog
        .iter()
        .filter(|p| p.id != product.id && p.category_name() == Some(category))
        .take(RELATED_LIMIT)
        .collect()
}

/// Submit a review for a product.
#[instrument(skip(state, session, current, form), fields(rating = form.rating))]
pub async fn submit_review(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(current): RequireAuth,
    Path(id): Path<ProductId>,
    Form(form): Form<ReviewForm>,
) -> Result<Response> {
    let back = |error: Option<&str>| match error {
        Some(e) => format!("/products/{id}?review_error={}#reviews", urlencoding::encode(e)),
        None => format!("/products/{id}#reviews"),
    };

    let comment = form.comment.trim();
    if !(1..=5).contains(&form.rating) {
        let target = back(Some("Please choose a rating from 1 to 5 stars."));
        return Ok(Redirect::to(&target).into_response());
    }
    if comment.is_empty() {
        return Ok(Redirect::to(&back(Some("Please write a short comment."))).into_response());
    }

    let input = ReviewInput {
        product_id: id.as_str(),
        rating: form.rating,
        comment,
    };

    match state.api().create_review(&current.token, &input).await {
        Ok(()) => {
            tracing::info!(product_id = %id, "Review submitted");
            // Ratings on listings and the detail page are cached
            state.api().invalidate_cache();
            Ok(Redirect::to(&back(None)).into_response())
        }
        Err(e @ ApiError::Unauthorized(_)) => {
            forget_on_unauthorized(&session, &e).await;
            Err(AppError::Api(e))
        }
        Err(e) if e.is_client_error() => {
            tracing::warn!(product_id = %id, "Review rejected: {e}");
            Ok(Redirect::to(&back(Some(&e.user_message()))).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// Display the virtual try-on page.
///
/// The browser runs face tracking and renders the 3D model; the server only
/// hands over the model and image URLs.
#[instrument(skip(state, page))]
pub async fn try_on(
    State(state): State<AppState>,
    page: PageContext,
    Path(id): Path<ProductId>,
) -> Result<Response> {
    let product = state.api().get_product(&id).await?;

    Ok(TryOnTemplate {
        product: ProductCard::new(&product, &page),
        model_url: product.model_url.clone(),
        images: product.images.clone(),
        page,
    }
    .into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(id: &str, category: &str) -> Product {
        serde_json::from_value(serde_json::json!({
            "_id": id,
            "name": id,
            "price": 100,
            "category": category,
        }))
        .unwrap()
    }

    #[test]
    fn test_related_products_share_category() {
        let catalog = vec![
            product("a", "sunglasses"),
            product("b", "sunglasses"),
            product("c", "optical"),
        ];
        let related = related_products(&catalog, &catalog[0]);
        assert_eq!(related.len(), 1);
        assert_eq!(related[0].id.as_str(), "b");
    }

    #[test]
    fn test_listing_link_base_keeps_filters() {
        let query = ListingQuery {
            page: Some(3),
            category: Some("sun glasses".to_string()),
            sort: Some(String::new()),
        };
        assert_eq!(query.link_base("/products"), "/products?category=sun%20glasses&");
    }

    #[test]
    fn test_pagination_links() {
        let listing = Page {
            items: vec![1, 2],
            page: 2,
            total_pages: 3,
        };
        let pagination = Pagination::new(&listing, "/products?");
        assert_eq!(pagination.prev.as_deref(), Some("/products?page=1"));
        assert_eq!(pagination.next.as_deref(), Some("/products?page=3"));
    }

    #[test]
    fn test_card_shows_sale_price() {
        let product: Product = serde_json::from_value(serde_json::json!({
            "_id": "p", "name": "Round", "price": 100, "salePrice": 80,
        }))
        .unwrap();
        let card = ProductCard::new(&product, &PageContext::default());
        assert_eq!(card.price, "$80.00");
        assert_eq!(card.compare_at_price.as_deref(), Some("$100.00"));
    }
}
