//! `products`: the catalog listing.

use eshop_storefront::Storefront;
use eshop_storefront::views::catalog::{CatalogView, CategoryFilter, SortOption};

use super::CliError;

/// Print the catalog with the given filter, keyword and sort applied.
#[allow(clippy::print_stdout)]
pub async fn list(
    storefront: &Storefront,
    category: &str,
    search: String,
    sort: &str,
) -> Result<(), CliError> {
    let sort: SortOption = sort.parse()?;

    let mut view = CatalogView::new(storefront.clone());
    if let Some(navigation) = view.load().await {
        return Err(CliError::Redirected(navigation.to));
    }
    view.query.category = CategoryFilter::parse(category);
    view.query.keyword = search;
    view.query.sort = sort;

    if let Some(message) = view.categories().error() {
        tracing::warn!("{message}");
    } else {
        println!("Categories: {}", view.category_options().join(" | "));
    }

    if let Some(message) = view.products().error() {
        return Err(CliError::Failed(message.to_string()));
    }

    let affordances = view.affordances();
    let products = view.visible_products();
    if products.is_empty() {
        println!("No products found");
        return Ok(());
    }
    for product in products {
        let stock = if product.in_stock() {
            format!("{} available", product.available_items)
        } else {
            "out of stock".to_string()
        };
        println!(
            "{:<12} {:<32} {:>12}  {} ({stock})",
            product.id,
            product.display_name(),
            product.price.to_string(),
            product.category,
        );
    }
    if affordances.can_edit {
        println!("Admin: `eshop product modify <id>` / `eshop product delete <id> --yes`");
    }
    Ok(())
}
