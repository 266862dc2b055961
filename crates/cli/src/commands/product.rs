//! `product`: detail view and admin add/modify/delete.

use eshop_core::{Price, ProductId};
use eshop_storefront::Storefront;
use eshop_storefront::forms::ProductForm;
use eshop_storefront::routes::{Route, Router};
use eshop_storefront::views::catalog::CatalogView;
use eshop_storefront::views::product_detail::ProductDetailView;
use eshop_storefront::views::product_editor::ProductEditor;

use super::{CliError, report_navigation};

/// Field overrides for `product modify`; `None` keeps the stored value.
#[derive(Debug, Default)]
pub struct FieldUpdates {
    pub name: Option<String>,
    pub category: Option<String>,
    pub manufacturer: Option<String>,
    pub available_items: Option<String>,
    pub price: Option<String>,
    pub image_url: Option<String>,
    pub description: Option<String>,
}

impl FieldUpdates {
    fn apply(self, form: &mut ProductForm) {
        let fields = [
            (self.name, &mut form.name),
            (self.category, &mut form.category),
            (self.manufacturer, &mut form.manufacturer),
            (self.available_items, &mut form.available_items),
            (self.price, &mut form.price),
            (self.image_url, &mut form.image_url),
            (self.description, &mut form.description),
        ];
        for (update, field) in fields {
            if let Some(value) = update {
                *field = value;
            }
        }
    }
}

/// Print a product and the price of `quantity` units.
#[allow(clippy::print_stdout)]
pub async fn show(storefront: &Storefront, id: ProductId, quantity: i64) -> Result<(), CliError> {
    let route = Route::ProductDetail(id.clone());
    let resolved = Router::resolve(route.clone(), &storefront.snapshot());
    if resolved != route {
        return Err(CliError::Redirected(resolved));
    }

    let mut view = ProductDetailView::new(storefront.clone(), id);
    view.load().await;
    if let Some(message) = view.product().error() {
        return Err(CliError::Failed(message.to_string()));
    }
    let Some(product) = view.product().loaded() else {
        return Err(CliError::Failed("Product details are not loaded".to_string()));
    };

    println!("{}", product.display_name());
    println!("  Category:     {}", product.category);
    println!("  Manufacturer: {}", product.manufacturer);
    println!("  Price:        {}", product.price);
    if product.in_stock() {
        println!("  Available:    {}", product.available_items);
    } else {
        println!("  This product is currently out of stock.");
    }
    if !product.description.is_empty() {
        println!();
        println!("{}", product.description);
    }
    if let Some(message) = view.categories().error() {
        tracing::warn!("{message}");
    }

    if product.in_stock() {
        view.set_quantity(quantity)?;
        if let Some(total) = view.total() {
            println!();
            println!(
                "Total for {}: {}",
                view.quantity(),
                Price::format_amount(total)
            );
        }
    }
    Ok(())
}

/// Create a product (admin only).
#[allow(clippy::print_stdout)]
pub async fn add(storefront: &Storefront, form: ProductForm) -> Result<(), CliError> {
    let mut editor = ProductEditor::create(storefront.clone());
    if let Some(navigation) = editor.load().await {
        return Err(CliError::Redirected(navigation.to));
    }

    let category = form.category.trim().to_string();
    editor.form = form;
    if !editor.category_options().contains(&category) {
        tracing::info!(category = %category, "Adding a new category");
    }

    let navigation = editor.submit().await?;
    report_navigation(&navigation);
    if let Some(notice) = editor.notice() {
        println!("{}", notice.message);
    }
    Ok(())
}

/// Update a product (admin only). The stored values prefill the form.
#[allow(clippy::print_stdout)]
pub async fn modify(
    storefront: &Storefront,
    id: ProductId,
    updates: FieldUpdates,
) -> Result<(), CliError> {
    let mut editor = ProductEditor::modify(storefront.clone(), id);
    if let Some(navigation) = editor.load().await {
        return Err(CliError::Redirected(navigation.to));
    }
    if let Some(message) = editor.error() {
        return Err(CliError::Failed(message.to_string()));
    }

    updates.apply(&mut editor.form);
    let navigation = editor.submit().await?;
    report_navigation(&navigation);
    if let Some(notice) = editor.notice() {
        println!("{}", notice.message);
    }
    Ok(())
}

/// Delete a product (admin only). Without `confirmed` nothing is sent.
#[allow(clippy::print_stdout)]
pub async fn delete(storefront: &Storefront, id: &ProductId, confirmed: bool) -> Result<(), CliError> {
    let mut view = CatalogView::new(storefront.clone());
    if let Some(navigation) = view.load().await {
        return Err(CliError::Redirected(navigation.to));
    }
    if !view.request_delete(id) {
        return Err(CliError::Failed(format!(
            "Product {id} cannot be deleted from this session"
        )));
    }

    if !confirmed {
        if let Some(product) = view.pending_delete() {
            println!(
                "Delete {}? Re-run with --yes to confirm.",
                product.display_name()
            );
        }
        view.cancel_delete();
        return Ok(());
    }

    let deleted = view.confirm_delete().await;
    let message = view
        .notice()
        .map(|notice| notice.message.clone())
        .unwrap_or_default();
    if deleted {
        println!("{message}");
        Ok(())
    } else {
        Err(CliError::Failed(message))
    }
}
