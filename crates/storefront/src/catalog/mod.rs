//! Catalog and stock lookups.
//!
//! # Architecture
//!
//! - [`Catalog`] is the seam the cart store depends on; it is generic so
//!   tests can supply in-memory fakes
//! - [`HttpCatalogClient`] talks to the REST catalog with `reqwest`
//! - Product records are cached via `moka` (5 minute TTL); stock never is,
//!   since every cart mutation must see the current inventory
//!
//! # Endpoints
//!
//! ```text
//! GET {base}/stock/{id}     -> {"id": 1, "amount": 3}
//! GET {base}/products/{id}  -> {"id": 1, "title": "...", "price": 179.9, "image": "..."}
//! ```

mod client;

use rocketshoes_core::{Product, ProductId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use client::HttpCatalogClient;

/// Available inventory for a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stock {
    /// Product id.
    pub id: ProductId,
    /// Units available. The catalog may report negative values, which
    /// allow no further units.
    pub amount: i64,
}

/// Errors that can occur when talking to the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed (connection, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Request URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the catalog.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Catalog returned a non-success status.
    #[error("Unexpected status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Truncated response body.
        body: String,
    },

    /// Catalog answered with a record for a different product.
    #[error("Requested product {requested} but catalog returned {received}")]
    ProductMismatch {
        requested: ProductId,
        received: ProductId,
    },
}

/// Catalog and stock lookups used by the cart store.
pub trait Catalog: Send + Sync {
    /// Current stock for a product. Never cached.
    fn stock(
        &self,
        product_id: ProductId,
    ) -> impl Future<Output = Result<Stock, CatalogError>> + Send;

    /// Full product record.
    fn product(
        &self,
        product_id: ProductId,
    ) -> impl Future<Output = Result<Product, CatalogError>> + Send;
}
