//! Order commands.

use dsnh_storefront::error::AppError;
use dsnh_storefront::state::Storefront;
use dsnh_storefront::views::OrderDetailView;

/// List locally recorded orders, newest first.
pub fn list(storefront: &Storefront) {
    let rows = storefront.admin().orders.rows();
    if rows.is_empty() {
        tracing::info!("No orders yet. Orders will appear after a checkout.");
        return;
    }
    for row in rows {
        tracing::info!(
            "{:<16} {:<24} {:>3} item(s)  {}",
            row.id,
            row.customer_name,
            row.item_count,
            row.created
        );
    }
}

/// Show a locally recorded order.
pub fn show(storefront: &Storefront, id: &str) -> Result<(), AppError> {
    match storefront.admin().orders.stored_detail(id) {
        OrderDetailView::NotFound => Err(AppError::NotFound(format!("order {id}"))),
        view => {
            tracing::info!("{view}");
            Ok(())
        }
    }
}

/// Fetch an order from the API.
pub async fn fetch(storefront: &Storefront, id: &str) -> Result<(), AppError> {
    let view = storefront.admin().orders.fetch_live(id).await?;
    tracing::info!("{view}");
    Ok(())
}
