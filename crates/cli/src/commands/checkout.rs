//! Checkout command.

use clap::Args;
use dsnh_core::format_price;
use dsnh_storefront::checkout::CheckoutForm;
use dsnh_storefront::error::{AppError, add_breadcrumb};
use dsnh_storefront::state::Storefront;

/// Customer details for the order.
#[derive(Args)]
pub struct CheckoutArgs {
    #[arg(long)]
    first_name: String,

    #[arg(long)]
    last_name: String,

    #[arg(long)]
    email: String,

    #[arg(long)]
    phone: String,

    #[arg(long)]
    street_address: String,

    #[arg(long, default_value = "")]
    street_address_two: String,

    #[arg(long, default_value = "")]
    town: String,

    #[arg(long, default_value = "")]
    district: String,

    #[arg(long, default_value = "")]
    zip: String,

    #[arg(long, default_value = "")]
    country: String,
}

impl From<CheckoutArgs> for CheckoutForm {
    fn from(args: CheckoutArgs) -> Self {
        Self {
            first_name: args.first_name,
            last_name: args.last_name,
            email: args.email,
            phone: args.phone,
            street_address: args.street_address,
            street_address_two: args.street_address_two,
            town: args.town,
            district: args.district,
            zip: args.zip,
            country: args.country,
        }
    }
}

/// Show the summary, then place the order.
pub async fn run(storefront: &Storefront, args: CheckoutArgs) -> Result<(), AppError> {
    let checkout = storefront.checkout();

    let summary = checkout.summary();
    for line in &summary.lines {
        tracing::info!("{}  {}", line.label, format_price(line.line_total));
    }
    tracing::info!("Total  {}", format_price(summary.total));

    add_breadcrumb("checkout", "Submitting order", None);
    let receipt = checkout.submit(&CheckoutForm::from(args)).await?;

    if receipt.order_id.is_empty() {
        tracing::info!("Order placed successfully.");
    } else {
        tracing::info!("Order placed successfully. Order id: {}", receipt.order_id);
    }
    Ok(())
}
