//! Cart commands.

use dsnh_core::Quantity;
use dsnh_storefront::api::ProductQuery;
use dsnh_storefront::error::{AppError, add_breadcrumb};
use dsnh_storefront::state::Storefront;
use dsnh_storefront::views::{CartView, HeaderBadge};

/// Print the cart.
pub fn show(storefront: &Storefront) {
    let cart = storefront.cart().get_cart();
    tracing::info!("{}", CartView::new(&cart));
}

/// Add a catalog product by id.
pub async fn add(storefront: &Storefront, id: &str, qty: u32) -> Result<(), AppError> {
    let catalog = storefront.catalog();
    catalog
        .refresh(&ProductQuery::new(storefront.config().product_rows))
        .await;

    let product = catalog
        .find(Some(id))
        .filter(|p| p.id == *id)
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    let mut notices = storefront.cart().subscribe_notices();
    let cart = storefront.cart().add_product(&product, Quantity::new(qty));
    add_breadcrumb("cart", "Added item", Some(&[("product_id", id)]));

    if let Ok(notice) = notices.try_recv() {
        tracing::info!("{}", notice.message);
    }
    tracing::info!("Cart: {} item(s)", HeaderBadge::new(&cart));
    Ok(())
}

/// Overwrite a line's quantity. Anything that isn't a positive number
/// becomes 1.
pub fn set(storefront: &Storefront, id: &str, qty: &str) {
    let cart = storefront.cart().set_qty(id, Quantity::parse_lossy(qty));
    add_breadcrumb("cart", "Set quantity", Some(&[("product_id", id), ("qty", qty)]));
    tracing::info!("{}", CartView::new(&cart));
}

pub fn remove(storefront: &Storefront, id: &str) {
    let cart = storefront.cart().remove_item(id);
    add_breadcrumb("cart", "Removed item", Some(&[("product_id", id)]));
    tracing::info!("{}", CartView::new(&cart));
}

pub fn clear(storefront: &Storefront) {
    storefront.cart().clear();
    add_breadcrumb("cart", "Cleared cart", None);
    tracing::info!("Cart cleared");
}
