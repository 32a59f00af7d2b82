//! Backend connectivity check.
//!
//! Uses the same environment as the storefront (`EYEWEAR_API_URL` and
//! friends), so a passing check means the storefront's readiness probe will
//! pass too.

use tracing::info;

/// Fetch categories, marketing scripts and the catalog, logging a summary.
///
/// # Errors
///
/// Returns an error if configuration is missing or the backend fails.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let api = super::client()?;

    let categories = api.categories().await?;
    info!(count = categories.len(), "Categories reachable");
    for category in categories.iter() {
        info!(id = %category.id, slug = %category.slug(), "  {}", category.name);
    }

    let scripts = api.scripts().await?;
    let enabled = scripts.iter().filter(|s| s.enabled).count();
    info!(total = scripts.len(), enabled, "Marketing scripts reachable");

    let catalog = api.catalog().await?;
    let in_stock = catalog.iter().filter(|p| p.in_stock()).count();
    let with_model = catalog.iter().filter(|p| p.model_url.is_some()).count();
    info!(
        products = catalog.len(),
        in_stock,
        try_on = with_model,
        "Catalog reachable"
    );

    Ok(())
}
