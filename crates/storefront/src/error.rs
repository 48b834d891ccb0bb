//! Cart error handling with Sentry integration.
//!
//! Every cart operation returns `Result<Cart, CartError>`. Callers branch on
//! [`CartError::kind`]; the user-facing text for each failure comes from
//! [`CartError::notification`].

use rocketshoes_core::{CartInvariantError, ProductId};
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::storage::StorageError;

/// Shown when a requested quantity exceeds available stock.
pub const OUT_OF_STOCK_MESSAGE: &str = "Requested quantity is out of stock";

/// Cart-level error type.
#[derive(Debug, Error)]
pub enum CartError {
    /// The product is not in the cart.
    #[error("Product {0} is not in the cart")]
    NotInCart(ProductId),

    /// Requested quantity exceeds available stock.
    #[error("Product {product_id}: requested {requested}, only {available} in stock")]
    OutOfStock {
        product_id: ProductId,
        requested: i64,
        available: i64,
    },

    /// Catalog or stock lookup failed.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Persisting the cart failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// A computed cart broke an invariant.
    #[error("Cart invariant violated: {0}")]
    Invariant(#[from] CartInvariantError),
}

/// Coarse classification of a [`CartError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CartErrorKind {
    /// Referenced product is absent from the cart.
    NotFound,
    /// Requested amount exceeds available stock.
    OutOfStock,
    /// Network, payload, storage or invariant failure.
    Unexpected,
}

/// The cart operation an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartOperation {
    Add,
    Remove,
    Update,
    Clear,
}

impl CartOperation {
    /// Generic failure text for this operation.
    #[must_use]
    pub const fn failure_message(self) -> &'static str {
        match self {
            Self::Add => "Error adding product",
            Self::Remove => "Error removing product",
            Self::Update => "Error updating product amount",
            Self::Clear => "Error clearing cart",
        }
    }
}

impl CartError {
    #[must_use]
    pub const fn kind(&self) -> CartErrorKind {
        match self {
            Self::NotInCart(_) => CartErrorKind::NotFound,
            Self::OutOfStock { .. } => CartErrorKind::OutOfStock,
            Self::Catalog(_) | Self::Storage(_) | Self::Invariant(_) => CartErrorKind::Unexpected,
        }
    }

    /// User-facing notification text for this error raised by `operation`.
    #[must_use]
    pub const fn notification(&self, operation: CartOperation) -> &'static str {
        match self.kind() {
            CartErrorKind::OutOfStock => OUT_OF_STOCK_MESSAGE,
            CartErrorKind::NotFound | CartErrorKind::Unexpected => operation.failure_message(),
        }
    }
}

/// Result type alias for `CartError`.
pub type Result<T> = std::result::Result<T, CartError>;

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added product", Some(&[("product_id", "123")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
