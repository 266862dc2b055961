//! `order`: walk the checkout for a single product.

use eshop_core::{AddressId, ProductId};
use eshop_storefront::Storefront;
use eshop_storefront::forms::AddressForm;
use eshop_storefront::routes::{Route, Router};
use eshop_storefront::views::checkout::{CheckoutStep, CheckoutWorkflow};
use eshop_storefront::views::product_detail::ProductDetailView;

use super::{CliError, report_navigation};

/// Order `quantity` units of `product_id`, delivered to the saved address
/// `address` or to a new address built from `new_address`.
#[allow(clippy::print_stdout)]
pub async fn place(
    storefront: &Storefront,
    product_id: ProductId,
    quantity: i64,
    address: Option<AddressId>,
    new_address: AddressForm,
) -> Result<(), CliError> {
    let resolved = Router::resolve(Route::CreateOrder, &storefront.snapshot());
    if resolved != Route::CreateOrder {
        return Err(CliError::Redirected(resolved));
    }

    // Product page: pick the quantity and start checkout
    let mut detail = ProductDetailView::new(storefront.clone(), product_id);
    detail.load().await;
    if let Some(message) = detail.product().error() {
        return Err(CliError::Failed(message.to_string()));
    }
    detail.set_quantity(quantity)?;
    let (intent, navigation) = detail.place_order()?;
    report_navigation(&navigation);

    let mut checkout = CheckoutWorkflow::new(storefront.clone(), Some(intent));
    checkout.start().await;
    if let Some(message) = checkout.product().error() {
        return Err(CliError::Failed(message.to_string()));
    }
    if let Some(review) = checkout.review() {
        println!(
            "[{}] {} x {}",
            CheckoutStep::ReviewProduct.label(),
            review.product.display_name(),
            review.quantity.get()
        );
        for warning in &review.warnings {
            tracing::warn!("{warning}");
        }
    }

    checkout.next().await?;
    if let Some(message) = checkout.addresses().error() {
        tracing::warn!("{message}");
    }
    match address {
        Some(id) => checkout.select_address(id)?,
        None => {
            *checkout.address_form_mut() = new_address;
            let id = checkout.submit_address().await?;
            println!("Saved address {id}");
        }
    }

    checkout.next().await?;
    let confirmation = checkout.confirmation()?;
    println!(
        "[{}] {} x {} to {}: {}",
        CheckoutStep::Confirm.label(),
        confirmation.product.display_name(),
        confirmation.quantity.get(),
        confirmation.address.label(),
        confirmation.formatted_total()
    );

    if let Some(navigation) = checkout.next().await? {
        report_navigation(&navigation);
    }
    if let Some(notice) = checkout.notice() {
        println!("{}", notice.message);
    }
    if let Some(order) = checkout.order() {
        println!("Order id: {}", order.id);
    }
    Ok(())
}
