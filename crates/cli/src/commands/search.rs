//! Catalog search from the command line.
//!
//! Runs the same in-memory filter and ranking as the storefront's `/search`
//! page against the live catalog.

use eyewear_core::search::{self, SearchCriteria, SearchSort};
use rust_decimal::Decimal;
use tracing::info;

/// Build criteria from command-line arguments.
pub fn criteria(
    query: String,
    category: Option<String>,
    shape: Option<String>,
    max_price: Option<Decimal>,
    sort: &str,
) -> SearchCriteria {
    SearchCriteria {
        query,
        category,
        frame_shape: shape,
        max_price,
        sort: SearchSort::parse(sort),
        ..SearchCriteria::default()
    }
}

/// Fetch the catalog and log matching products.
///
/// # Errors
///
/// Returns an error if configuration is missing or the catalog fetch fails.
pub async fn run(criteria: &SearchCriteria) -> Result<(), Box<dyn std::error::Error>> {
    if !criteria.is_active() {
        return Err("give a --query or at least one filter".into());
    }

    let api = super::client()?;
    let catalog = api.catalog().await?;
    let results = search::apply(&catalog, criteria);

    info!(results = results.len(), sort = criteria.sort.as_str(), "Search complete");
    for product in results {
        info!(
            id = %product.id,
            price = %product.effective_price(),
            "{}{}",
            product.brand.as_deref().map(|b| format!("{b} ")).unwrap_or_default(),
            product.name
        );
    }

    Ok(())
}
