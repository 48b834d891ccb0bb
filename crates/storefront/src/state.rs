//! Application state shared across front ends.

use std::sync::Arc;

use crate::catalog::{CatalogError, HttpCatalogClient};
use crate::config::CartConfig;
use crate::notify::TracingNotifier;
use crate::storage::{FileStorage, LocalCartStorage};
use crate::store::CartStore;

/// The production cart store: HTTP catalog, file storage, tracing notifications.
pub type DefaultCartStore = CartStore<HttpCatalogClient, LocalCartStorage<FileStorage>, TracingNotifier>;

/// Application state shared by every caller that needs the cart.
///
/// This struct is cheaply cloneable via `Arc`. Pass it explicitly to whatever
/// needs cart access; there is no global instance.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: CartConfig,
    cart: DefaultCartStore,
}

impl AppState {
    /// Create a new application state, loading the persisted cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: CartConfig) -> Result<Self, CatalogError> {
        let catalog = HttpCatalogClient::new(&config.api)?;
        let storage = LocalCartStorage::file(&config.storage_path);
        let cart = CartStore::new(catalog, storage, TracingNotifier);

        Ok(Self {
            inner: Arc::new(AppStateInner { config, cart }),
        })
    }

    /// Get a reference to the configuration.
    #[must_use]
    pub fn config(&self) -> &CartConfig {
        &self.inner.config
    }

    /// Get a reference to the cart store.
    #[must_use]
    pub fn cart(&self) -> &DefaultCartStore {
        &self.inner.cart
    }
}
