//! Products, accessories, categories and reviews.

use std::sync::Arc;

use eyewear_core::reviews::Review;
use eyewear_core::{Accessory, AccessoryId, Category, Product, ProductId};
use reqwest::Method;
use tracing::{debug, instrument};

use crate::api::cache::{CacheKey, CacheValue};
use crate::api::types::{Page, ReviewInput};
use crate::api::{ApiClient, ApiError};

/// Page size used when walking the whole catalog.
const CATALOG_PAGE_SIZE: u32 = 100;

/// Upper bound on pages fetched for the full catalog.
const CATALOG_MAX_PAGES: u32 = 50;

/// Listing parameters for `GET /products`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductQuery {
    pub page: u32,
    pub limit: u32,
    pub category: Option<String>,
    pub sort: Option<String>,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 12,
            category: None,
            sort: None,
        }
    }
}

impl ProductQuery {
    fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("page", self.page.to_string()),
            ("limit", self.limit.to_string()),
        ];
        if let Some(category) = &self.category {
            params.push(("category", category.clone()));
        }
        if let Some(sort) = &self.sort {
            params.push(("sort", sort.clone()));
        }
        params
    }

    fn cache_key(&self) -> CacheKey {
        CacheKey::Products {
            page: self.page,
            limit: self.limit,
            category: self.category.clone(),
            sort: self.sort.clone(),
        }
    }
}

impl ApiClient {
    // =========================================================================
    // Product Methods
    // =========================================================================

    /// List one page of products.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        query: &ProductQuery,
    ) -> Result<Arc<Page<Product>>, ApiError> {
        let cache_key = query.cache_key();
        if let Some(CacheValue::Products(page)) = self.cache().get(&cache_key).await {
            debug!("Cache hit for product page");
            return Ok(page);
        }

        let page: Page<Product> = self.get_json("products", &query.params(), None).await?;
        let page = Arc::new(page);

        self.cache()
            .insert(cache_key, CacheValue::Products(Arc::clone(&page)))
            .await;

        Ok(page)
    }

    /// Fetch every product, walking pages until the backend reports the last.
    ///
    /// Search, facets and related products all work off this list.
    ///
    /// # Errors
    ///
    /// Returns an error if any page request fails.
    #[instrument(skip(self))]
    pub async fn catalog(&self) -> Result<Arc<Vec<Product>>, ApiError> {
        if let Some(CacheValue::Catalog(products)) = self.cache().get(&CacheKey::Catalog).await {
            debug!("Cache hit for catalog");
            return Ok(products);
        }

        let mut products = Vec::new();
        let mut query = ProductQuery {
            limit: CATALOG_PAGE_SIZE,
            ..ProductQuery::default()
        };
        loop {
            let page: Page<Product> = self.get_json("products", &query.params(), None).await?;
            let fetched = page.items.len();
            let has_next = page.has_next();
            products.extend(page.items);

            // Backends that ignore paging return everything at once.
            if !has_next || fetched == 0 || query.page >= CATALOG_MAX_PAGES {
                break;
            }
            query.page += 1;
        }

        debug!(count = products.len(), "Fetched catalog");
        let products = Arc::new(products);
        self.cache()
            .insert(CacheKey::Catalog, CacheValue::Catalog(Arc::clone(&products)))
            .await;
        Ok(products)
    }

    /// Get a product by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found or the API request fails.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Product, ApiError> {
        let cache_key = CacheKey::Product(id.clone());
        if let Some(CacheValue::Product(product)) = self.cache().get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let path = format!("products/{}", urlencoding::encode(id.as_str()));
        let product: Product = self
            .get_json::<SingleOrWrapped<Product>>(&path, &[], None)
            .await
            .map_err(|e| not_found_as(e, format!("Product not found: {id}")))?
            .into_inner();

        self.cache()
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    // =========================================================================
    // Accessory Methods
    // =========================================================================

    /// List one page of accessories.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_accessories(
        &self,
        page: u32,
        limit: u32,
    ) -> Result<Arc<Page<Accessory>>, ApiError> {
        let cache_key = CacheKey::Accessories { page, limit };
        if let Some(CacheValue::Accessories(page)) = self.cache().get(&cache_key).await {
            debug!("Cache hit for accessory page");
            return Ok(page);
        }

        let params = [("page", page.to_string()), ("limit", limit.to_string())];
        let result: Page<Accessory> = self.get_json("accessories", &params, None).await?;
        let result = Arc::new(result);

        self.cache()
            .insert(cache_key, CacheValue::Accessories(Arc::clone(&result)))
            .await;

        Ok(result)
    }

    /// Get an accessory by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the accessory is not found or the API request fails.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn get_accessory(&self, id: &AccessoryId) -> Result<Accessory, ApiError> {
        let cache_key = CacheKey::Accessory(id.clone());
        if let Some(CacheValue::Accessory(accessory)) = self.cache().get(&cache_key).await {
            debug!("Cache hit for accessory");
            return Ok(*accessory);
        }

        let path = format!("accessories/{}", urlencoding::encode(id.as_str()));
        let accessory: Accessory = self
            .get_json::<SingleOrWrapped<Accessory>>(&path, &[], None)
            .await
            .map_err(|e| not_found_as(e, format!("Accessory not found: {id}")))?
            .into_inner();

        self.cache()
            .insert(cache_key, CacheValue::Accessory(Box::new(accessory.clone())))
            .await;

        Ok(accessory)
    }

    // =========================================================================
    // Category Methods
    // =========================================================================

    /// Get all categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Arc<Vec<Category>>, ApiError> {
        if let Some(CacheValue::Categories(categories)) =
            self.cache().get(&CacheKey::Categories).await
        {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let page: Page<Category> = self.get_json("categories", &[], None).await?;
        let categories = Arc::new(page.items);

        self.cache()
            .insert(
                CacheKey::Categories,
                CacheValue::Categories(Arc::clone(&categories)),
            )
            .await;

        Ok(categories)
    }

    // =========================================================================
    // Review Methods
    // =========================================================================

    /// Reviews for a product. Not cached so a new review shows immediately.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(product = %product_id))]
    pub async fn product_reviews(&self, product_id: &ProductId) -> Result<Vec<Review>, ApiError> {
        let path = format!("reviews/product/{}", urlencoding::encode(product_id.as_str()));
        let page: Page<Review> = self.get_json(&path, &[], None).await?;
        Ok(page.items)
    }

    /// Submit a review as the logged-in user.
    ///
    /// Drops the cached product so its rating refreshes.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the review.
    #[instrument(skip(self, token, input), fields(product = %input.product_id))]
    pub async fn create_review(
        &self,
        token: &str,
        input: &ReviewInput<'_>,
    ) -> Result<(), ApiError> {
        self.send_unit(Method::POST, "reviews", Some(input), Some(token))
            .await?;
        self.cache()
            .invalidate(&CacheKey::Product(ProductId::new(input.product_id)))
            .await;
        Ok(())
    }
}

/// Single-resource responses come bare or as `{product: {...}}` / `{data: {...}}`.
#[derive(serde::Deserialize)]
#[serde(untagged)]
enum SingleOrWrapped<T> {
    Wrapped {
        #[serde(alias = "product", alias = "accessory", alias = "data")]
        item: T,
    },
    Bare(T),
}

impl<T> SingleOrWrapped<T> {
    fn into_inner(self) -> T {
        match self {
            Self::Wrapped { item } | Self::Bare(item) => item,
        }
    }
}

fn not_found_as(err: ApiError, message: String) -> ApiError {
    match err {
        ApiError::NotFound(_) => ApiError::NotFound(message),
        other => other,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_query_params() {
        let query = ProductQuery {
            page: 2,
            limit: 12,
            category: Some("sunglasses".into()),
            sort: None,
        };
        let params = query.params();
        assert_eq!(params.len(), 3);
        assert!(params.contains(&("category", "sunglasses".to_string())));
    }

    #[test]
    fn test_single_or_wrapped() {
        let wrapped: SingleOrWrapped<Product> = serde_json::from_value(serde_json::json!({
            "product": {"_id": "p1", "name": "Round", "price": 10}
        }))
        .unwrap();
        assert_eq!(wrapped.into_inner().id.as_str(), "p1");

        let bare: SingleOrWrapped<Product> = serde_json::from_value(serde_json::json!({
            "_id": "p2", "name": "Square", "price": 10
        }))
        .unwrap();
        assert_eq!(bare.into_inner().id.as_str(), "p2");
    }
}
