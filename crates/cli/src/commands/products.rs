//! Product commands.

use std::path::Path;

use dsnh_storefront::admin::ProductForm;
use dsnh_storefront::api::ImageUpload;
use dsnh_storefront::catalog::CatalogSource;
use dsnh_storefront::error::AppError;
use dsnh_storefront::state::Storefront;

/// List products, optionally filtered.
pub async fn list(storefront: &Storefront, search: &str) {
    let admin = &storefront.admin().products;
    admin.refresh().await;
    if storefront.catalog().source() == CatalogSource::Sample {
        tracing::warn!("Showing sample products; the product API is unavailable");
    }

    let rows = admin.rows(search);
    if rows.is_empty() {
        tracing::info!("No products found.");
        return;
    }
    for row in rows {
        tracing::info!(
            "{:>6}  {:<32} {:>10}  {:<9}  {}",
            row.id,
            row.name,
            row.price,
            row.availability_label(),
            row.summary
        );
    }
}

/// Edit form pre-filled from the product currently listed under `id`.
pub async fn current_form(storefront: &Storefront, id: &str) -> Result<ProductForm, AppError> {
    storefront.admin().products.refresh().await;
    storefront
        .catalog()
        .find(Some(id))
        .filter(|p| p.id == *id)
        .map(|product| ProductForm::from_product(&product))
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))
}

/// Create or update a product, depending on whether the form has an id.
pub async fn save(storefront: &Storefront, form: ProductForm) -> Result<(), AppError> {
    tracing::info!("{}", form.title());

    let response = storefront.admin().products.save(&form).await?;
    tracing::info!("Saved successfully.");
    if let Some(response) = response {
        tracing::debug!(%response, "Save response");
    }
    Ok(())
}

/// Load an image file for upload.
pub fn read_image(path: &Path) -> Result<ImageUpload, AppError> {
    let bytes = std::fs::read(path)
        .map_err(|e| AppError::BadRequest(format!("cannot read {}: {e}", path.display())))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());

    Ok(ImageUpload {
        content_type: ImageUpload::guess_content_type(&file_name).to_string(),
        file_name,
        bytes,
    })
}
