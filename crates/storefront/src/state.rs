//! Storefront context shared by every front end.

use std::sync::Arc;

use crate::admin::AdminConsole;
use crate::api::{ApiClient, ApiError, ApiSettings};
use crate::cart::CartStore;
use crate::catalog::Catalog;
use crate::checkout::Checkout;
use crate::config::StorefrontConfig;
use crate::error::AppError;
use crate::orders::OrderHistory;
use crate::storage::{FileStorage, KeyValueStorage};

/// All storefront services wired over one storage medium.
///
/// This struct is cheaply cloneable via `Arc`. Every service shares the
/// same storage handle, so the cart and order history seen here are the ones
/// checkout writes to.
#[derive(Clone)]
pub struct Storefront {
    inner: Arc<StorefrontInner>,
}

struct StorefrontInner {
    config: StorefrontConfig,
    api: ApiClient,
    cart: CartStore,
    orders: OrderHistory,
    catalog: Catalog,
    checkout: Checkout,
    admin: AdminConsole,
}

impl Storefront {
    /// Create a storefront persisting under `config.data_dir`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Storage` if the data directory can't be created and
    /// `AppError::Api` if the configured URLs are unusable.
    pub fn new(config: StorefrontConfig) -> Result<Self, AppError> {
        let storage = Arc::new(FileStorage::open(config.data_dir.clone())?);
        Ok(Self::with_storage(config, storage)?)
    }

    /// Create a storefront over an arbitrary storage medium.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured URLs are unusable.
    pub fn with_storage(
        config: StorefrontConfig,
        storage: Arc<dyn KeyValueStorage>,
    ) -> Result<Self, ApiError> {
        let api = ApiClient::new(&ApiSettings::from(&config))?;
        let cart = CartStore::new(Arc::clone(&storage), config.source_url.clone());
        let orders = OrderHistory::new(storage);
        let catalog = Catalog::new(api.clone(), config.price_units);
        let checkout = Checkout::new(api.clone(), cart.clone(), orders.clone());
        let admin = AdminConsole::new(
            api.clone(),
            catalog.clone(),
            orders.clone(),
            config.product_rows,
        );

        Ok(Self {
            inner: Arc::new(StorefrontInner {
                config,
                api,
                cart,
                orders,
                catalog,
                checkout,
                admin,
            }),
        })
    }

    /// Get a reference to the configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the API client.
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    /// Get a reference to the cart store.
    #[must_use]
    pub fn cart(&self) -> &CartStore {
        &self.inner.cart
    }

    /// Get a reference to the order history.
    #[must_use]
    pub fn orders(&self) -> &OrderHistory {
        &self.inner.orders
    }

    /// Get a reference to the product catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    /// Get a reference to the checkout flow.
    #[must_use]
    pub fn checkout(&self) -> &Checkout {
        &self.inner.checkout
    }

    /// Get a reference to the admin console.
    #[must_use]
    pub fn admin(&self) -> &AdminConsole {
        &self.inner.admin
    }
}
