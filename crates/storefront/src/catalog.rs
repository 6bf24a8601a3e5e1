//! Product catalog with offline fallback.
//!
//! The catalog keeps the most recently loaded product list in memory and
//! broadcasts [`ProductsChanged`] whenever it is replaced. When the product
//! API can't be reached (or answers badly) the built-in sample listing is
//! used instead so the storefront stays browsable.

use std::sync::{Arc, PoisonError, RwLock};

use dsnh_core::{PriceUnitPolicy, Product, normalize_products, sample_products_response};
use tokio::sync::broadcast;
use tracing::instrument;

use crate::api::{ApiClient, ProductQuery};
use crate::signal::{ProductsChanged, Signal};

/// Where the current product list came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogSource {
    /// Nothing loaded yet.
    Empty,
    /// Fetched from the product API.
    Remote,
    /// Built-in sample listing.
    Sample,
}

/// Outcome of [`Catalog::refresh`].
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogRefresh {
    pub products: Vec<Product>,
    pub source: CatalogSource,
    /// Why the remote listing was not used, when it wasn't.
    pub fallback_reason: Option<String>,
}

/// Product catalog service.
#[derive(Clone)]
pub struct Catalog {
    inner: Arc<CatalogInner>,
}

struct CatalogInner {
    api: ApiClient,
    policy: PriceUnitPolicy,
    state: RwLock<(Vec<Product>, CatalogSource)>,
    changed: Signal<ProductsChanged>,
}

impl Catalog {
    #[must_use]
    pub fn new(api: ApiClient, policy: PriceUnitPolicy) -> Self {
        Self {
            inner: Arc::new(CatalogInner {
                api,
                policy,
                state: RwLock::new((Vec::new(), CatalogSource::Empty)),
                changed: Signal::new(),
            }),
        }
    }

    /// Reload the product list.
    ///
    /// Never fails: any API error is logged and the sample listing is used.
    /// Listings without an id are dropped.
    #[instrument(skip(self))]
    pub async fn refresh(&self, query: &ProductQuery) -> CatalogRefresh {
        let (products, source, fallback_reason) = match self.inner.api.list_products(query).await {
            Ok(response) => (
                normalize_products(&response, self.inner.policy),
                CatalogSource::Remote,
                None,
            ),
            Err(e) => {
                tracing::warn!(error = %e, "Falling back to sample products");
                (
                    normalize_products(&sample_products_response(), self.inner.policy),
                    CatalogSource::Sample,
                    Some(e.to_string()),
                )
            }
        };

        tracing::info!(count = products.len(), ?source, "Product list refreshed");
        self.replace(products.clone(), source);

        CatalogRefresh {
            products,
            source,
            fallback_reason,
        }
    }

    fn replace(&self, products: Vec<Product>, source: CatalogSource) {
        *self
            .inner
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner) = (products.clone(), source);
        self.inner.changed.emit(ProductsChanged { products });
    }

    /// The current product list.
    #[must_use]
    pub fn products(&self) -> Vec<Product> {
        self.inner
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .0
            .clone()
    }

    /// Where the current list came from.
    #[must_use]
    pub fn source(&self) -> CatalogSource {
        self.inner
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .1
    }

    /// Product for a detail view: the requested id, else the first product.
    ///
    /// `None` only while the list is empty.
    #[must_use]
    pub fn find(&self, id: Option<&str>) -> Option<Product> {
        let state = self
            .inner
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let products = &state.0;
        id.and_then(|id| products.iter().find(|p| p.id == *id))
            .or_else(|| products.first())
            .cloned()
    }

    /// Case-insensitive filter over name and descriptions. An empty query
    /// matches everything.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<Product> {
        let needle = query.trim().to_lowercase();
        let products = self.products();
        if needle.is_empty() {
            return products;
        }
        products
            .into_iter()
            .filter(|p| {
                [&p.name, &p.description, &p.short_description]
                    .iter()
                    .any(|field| field.to_lowercase().contains(&needle))
            })
            .collect()
    }

    /// Subscribe to list replacements.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ProductsChanged> {
        self.inner.changed.subscribe()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::api::ApiSettings;

    use super::*;

    fn offline_catalog() -> Catalog {
        // Port 9 (discard) on localhost refuses connections.
        let mut settings = ApiSettings::for_base_url("http://127.0.0.1:9");
        settings.timeout = std::time::Duration::from_secs(2);
        Catalog::new(ApiClient::new(&settings).unwrap(), PriceUnitPolicy::default())
    }

    #[tokio::test]
    async fn test_unreachable_api_falls_back_to_sample() {
        let catalog = offline_catalog();
        let mut changes = catalog.subscribe();
        assert_eq!(catalog.source(), CatalogSource::Empty);
        assert!(catalog.find(None).is_none());

        let refresh = catalog.refresh(&ProductQuery::new(20)).await;
        assert_eq!(refresh.source, CatalogSource::Sample);
        assert!(refresh.fallback_reason.is_some());
        assert_eq!(refresh.products.len(), 2);

        let event = changes.try_recv().unwrap();
        assert_eq!(event.products.len(), 2);
        assert_eq!(catalog.source(), CatalogSource::Sample);
    }

    #[tokio::test]
    async fn test_find_and_search() {
        let catalog = offline_catalog();
        catalog.refresh(&ProductQuery::new(20)).await;

        assert_eq!(catalog.find(Some("2")).unwrap().name, "Omega-3 Fish Oil 2000mg");
        assert_eq!(catalog.find(Some("missing")).unwrap().id.as_str(), "1");
        assert_eq!(catalog.find(None).unwrap().id.as_str(), "1");

        assert_eq!(catalog.search("").len(), 2);
        assert_eq!(catalog.search("  OMEGA ").len(), 1);
        assert_eq!(catalog.search("immune")[0].id.as_str(), "1");
        assert!(catalog.search("creatine").is_empty());
    }
}
