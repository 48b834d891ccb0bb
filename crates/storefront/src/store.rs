//! The cart store.
//!
//! [`CartStore`] owns the current [`Cart`] and is the only place it changes.
//! Each operation computes a complete replacement cart, writes it to storage,
//! and only then publishes it to readers. Mutations are serialized, so two
//! rapid adds of the same product both land.
//!
//! Failures are returned as [`CartError`] and also reported to the
//! [`Notifier`] with a fixed message per operation.

use std::num::NonZeroU32;

use rocketshoes_core::{Cart, ProductId};
use serde::Deserialize;
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, instrument, warn};

use crate::catalog::Catalog;
use crate::error::{CartError, CartErrorKind, CartOperation, Result};
use crate::notify::Notifier;
use crate::storage::CartStorage;

/// Request to set a product's quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct UpdateProductAmount {
    pub product_id: ProductId,
    /// Absolute quantity. Values `<= 0` are ignored.
    pub amount: i64,
}

/// Holds the cart and applies user actions to it.
pub struct CartStore<C, S, N> {
    catalog: C,
    storage: S,
    notifier: N,
    state: watch::Sender<Cart>,
    // Held for the whole read-modify-write of every mutation.
    write_lock: Mutex<()>,
}

impl<C, S, N> CartStore<C, S, N>
where
    C: Catalog,
    S: CartStorage,
    N: Notifier,
{
    /// Create a store, loading the persisted cart.
    ///
    /// A missing snapshot starts an empty cart. So does an unreadable one;
    /// it is logged and replaced on the next successful mutation.
    pub fn new(catalog: C, storage: S, notifier: N) -> Self {
        let cart = match storage.load() {
            Ok(Some(cart)) => {
                debug!(items = cart.len(), "Loaded persisted cart");
                cart
            }
            Ok(None) => Cart::empty(),
            Err(e) => {
                warn!(error = %e, "Persisted cart could not be loaded, starting empty");
                Cart::empty()
            }
        };

        let (state, _) = watch::channel(cart);

        Self {
            catalog,
            storage,
            notifier,
            state,
            write_lock: Mutex::new(()),
        }
    }

    /// Snapshot of the current cart.
    #[must_use]
    pub fn cart(&self) -> Cart {
        self.state.borrow().clone()
    }

    /// Watch the cart; the receiver sees every published replacement.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Cart> {
        self.state.subscribe()
    }

    /// Add one unit of a product.
    ///
    /// New products are fetched from the catalog and appended with a quantity
    /// of one. Existing entries are incremented if stock allows.
    ///
    /// # Errors
    ///
    /// - `CartError::OutOfStock` if the incremented amount exceeds stock
    /// - `CartError::Catalog` / `CartError::Storage` on lookup or write failure
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add_product(&self, product_id: ProductId) -> Result<Cart> {
        let _guard = self.write_lock.lock().await;
        let result = self.try_add_product(product_id).await;
        self.report(CartOperation::Add, result)
    }

    /// Remove a product entirely.
    ///
    /// # Errors
    ///
    /// - `CartError::NotInCart` if the product is absent
    /// - `CartError::Storage` on write failure
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove_product(&self, product_id: ProductId) -> Result<Cart> {
        let _guard = self.write_lock.lock().await;
        let result = self
            .cart()
            .without(product_id)
            .ok_or(CartError::NotInCart(product_id))
            .and_then(|next| self.commit(next));
        self.report(CartOperation::Remove, result)
    }

    /// Set a product's quantity to an absolute value.
    ///
    /// Amounts `<= 0` leave the cart untouched and return it unchanged.
    ///
    /// # Errors
    ///
    /// - `CartError::NotInCart` if the product is absent
    /// - `CartError::OutOfStock` if `amount` exceeds stock
    /// - `CartError::Catalog` / `CartError::Storage` on lookup or write failure
    #[instrument(skip(self), fields(product_id = %update.product_id, amount = update.amount))]
    pub async fn update_product_amount(&self, update: UpdateProductAmount) -> Result<Cart> {
        let _guard = self.write_lock.lock().await;
        let result = self.try_update_product_amount(update).await;
        self.report(CartOperation::Update, result)
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Storage` if the empty cart cannot be written.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<Cart> {
        let _guard = self.write_lock.lock().await;
        let result = self.commit(Cart::empty());
        self.report(CartOperation::Clear, result)
    }

    async fn try_add_product(&self, product_id: ProductId) -> Result<Cart> {
        let cart = self.cart();
        let current = cart.amount_of(product_id);
        let stock = self.catalog.stock(product_id).await?;

        let next = match current {
            None => {
                let product = self.catalog.product(product_id).await?;
                cart.with_product_appended(product)?
            }
            Some(amount) if i64::from(amount) + 1 > stock.amount => {
                return Err(CartError::OutOfStock {
                    product_id,
                    requested: i64::from(amount) + 1,
                    available: stock.amount,
                });
            }
            Some(_) => cart
                .with_amount_incremented(product_id)
                .ok_or(CartError::NotInCart(product_id))?,
        };

        self.commit(next)
    }

    async fn try_update_product_amount(&self, update: UpdateProductAmount) -> Result<Cart> {
        let UpdateProductAmount { product_id, amount } = update;
        let cart = self.cart();

        if !cart.contains(product_id) {
            return Err(CartError::NotInCart(product_id));
        }

        if amount <= 0 {
            debug!("Ignoring non-positive amount");
            return Ok(cart);
        }

        let stock = self.catalog.stock(product_id).await?;

        let Some(amount) = Some(amount)
            .filter(|&requested| requested <= stock.amount)
            .and_then(|requested| u32::try_from(requested).ok())
            .and_then(NonZeroU32::new)
        else {
            return Err(CartError::OutOfStock {
                product_id,
                requested: amount,
                available: stock.amount,
            });
        };

        let next = cart
            .with_amount(product_id, amount)
            .ok_or(CartError::NotInCart(product_id))?;
        self.commit(next)
    }

    /// Persist then publish.
    fn commit(&self, next: Cart) -> Result<Cart> {
        // Blocking write on the runtime thread, still under `write_lock`.
        // Snapshots are a few KB and saves must finish before publishing.
        self.storage.save(&next)?;
        self.state.send_replace(next.clone());
        info!(
            items = next.len(),
            total_quantity = next.total_quantity(),
            "Cart updated"
        );
        Ok(next)
    }

    /// Log, capture and notify on failure; pass the result through.
    fn report(&self, operation: CartOperation, result: Result<Cart>) -> Result<Cart> {
        if let Err(err) = &result {
            match err.kind() {
                CartErrorKind::OutOfStock | CartErrorKind::NotFound => {
                    warn!(error = %err, ?operation, "Cart operation rejected");
                }
                CartErrorKind::Unexpected => {
                    let event_id = sentry::capture_error(err);
                    tracing::error!(
                        error = %err,
                        ?operation,
                        sentry_event_id = %event_id,
                        "Cart operation failed"
                    );
                }
            }
            self.notifier.error(err.notification(operation));
        }
        result
    }
}
