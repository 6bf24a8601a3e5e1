//! Product management.

use std::sync::Arc;

use dsnh_core::Product;
use serde_json::Value;
use tracing::instrument;

use super::AdminError;
use crate::api::{ApiClient, ImageUpload, ProductFields, ProductQuery};
use crate::catalog::Catalog;
use crate::notice::Notice;
use crate::signal::Signal;
use crate::views::ProductRow;

/// The create/update product form.
///
/// An empty `id` means "create".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductForm {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Raw API price, sent as typed.
    pub price: String,
    /// `"1"` or `"0"`.
    pub availability: String,
    pub image: Option<ImageUpload>,
}

impl ProductForm {
    /// A blank create form.
    #[must_use]
    pub fn blank() -> Self {
        Self {
            availability: "1".to_string(),
            ..Self::default()
        }
    }

    /// Pre-fill the form for editing `product`.
    #[must_use]
    pub fn from_product(product: &Product) -> Self {
        let description = if product.description.is_empty() {
            product.short_description.clone()
        } else {
            product.description.clone()
        };
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            description,
            price: product.api.price_raw.to_string(),
            availability: if product.is_available() { "1" } else { "0" }.to_string(),
            image: None,
        }
    }

    /// Whether saving updates an existing product.
    #[must_use]
    pub fn is_update(&self) -> bool {
        !self.id.trim().is_empty()
    }

    /// Heading shown above the form.
    #[must_use]
    pub fn title(&self) -> String {
        if self.is_update() {
            format!("Update product #{}", self.id.trim())
        } else {
            "Create product".to_string()
        }
    }

    fn to_fields(&self) -> ProductFields {
        ProductFields {
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            price: self.price.trim().to_string(),
            availability: self.availability.trim().to_string(),
            image: self.image.clone(),
        }
    }
}

/// Product side of the admin console.
#[derive(Clone)]
pub struct ProductAdmin {
    api: ApiClient,
    catalog: Catalog,
    rows: u32,
    status: Arc<Signal<Notice>>,
}

impl ProductAdmin {
    pub(crate) const fn new(
        api: ApiClient,
        catalog: Catalog,
        rows: u32,
        status: Arc<Signal<Notice>>,
    ) -> Self {
        Self {
            api,
            catalog,
            rows,
            status,
        }
    }

    /// Table rows for the current catalog, filtered by `search`.
    #[must_use]
    pub fn rows(&self, search: &str) -> Vec<ProductRow> {
        self.catalog.search(search).iter().map(ProductRow::new).collect()
    }

    /// Reload the catalog from the API.
    pub async fn refresh(&self) -> Vec<ProductRow> {
        self.status.emit(Notice::info("Loading products..."));
        let refresh = self.catalog.refresh(&ProductQuery::new(self.rows)).await;
        if let Some(reason) = refresh.fallback_reason {
            self.status.emit(Notice::error(reason));
        }
        refresh.products.iter().map(ProductRow::new).collect()
    }

    /// Create or update a product, then reload the catalog.
    ///
    /// # Errors
    ///
    /// Returns error if the form has no name or the API rejects it.
    #[instrument(skip_all, fields(id = %form.id))]
    pub async fn save(&self, form: &ProductForm) -> Result<Option<Value>, AdminError> {
        if form.name.trim().is_empty() {
            return Err(self.fail(AdminError::Invalid("name")));
        }

        let fields = form.to_fields();
        let result = if form.is_update() {
            self.status.emit(Notice::info("Updating product…"));
            self.api.update_product(form.id.trim(), &fields).await
        } else {
            self.status.emit(Notice::info("Creating product…"));
            self.api.create_product(&fields).await
        };

        let response = result.map_err(|e| {
            tracing::error!(error = %e, "Product save failed");
            self.fail(e.into())
        })?;

        tracing::info!(update = form.is_update(), "Product saved");
        self.status
            .emit(Notice::success("Saved successfully. Refreshing…"));
        self.catalog.refresh(&ProductQuery::new(self.rows)).await;
        Ok(response)
    }

    /// Deleting is not offered by the product API.
    ///
    /// # Errors
    ///
    /// Always returns [`AdminError::DeleteUnsupported`].
    pub fn delete(&self, id: &str) -> Result<(), AdminError> {
        tracing::debug!(id, "Delete requested");
        Err(self.fail(AdminError::DeleteUnsupported))
    }

    fn fail(&self, error: AdminError) -> AdminError {
        self.status.emit(Notice::error(error.to_string()));
        error
    }
}
