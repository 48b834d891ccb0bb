//! Cart and line item types.
//!
//! A [`Cart`] is an ordered list of [`CartItem`]s with at most one entry per
//! product. All transitions are pure: they borrow the current cart and return
//! a complete replacement, or `None` when the referenced product is absent.

use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::Price;

/// Errors raised when a list of items does not form a valid cart.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartInvariantError {
    /// Two entries share a product id.
    #[error("product {0} appears more than once in the cart")]
    DuplicateProduct(ProductId),
    /// An entry has a quantity of zero.
    #[error("product {0} has a quantity of zero")]
    ZeroAmount(ProductId),
}

/// A catalog product record.
///
/// The store never inspects anything but `id`. The display fields default
/// when absent, and fields this type does not name are kept in `extra` so a
/// saved cart reproduces the catalog record as received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Catalog product id.
    pub id: ProductId,
    /// Display title.
    #[serde(default)]
    pub title: String,
    /// Unit price.
    #[serde(default)]
    pub price: Price,
    /// Image URL.
    #[serde(default)]
    pub image: String,
    /// Any other catalog fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Product {
    /// Create a record with no extra catalog fields.
    #[must_use]
    pub fn new(
        id: ProductId,
        title: impl Into<String>,
        price: Price,
        image: impl Into<String>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            price,
            image: image.into(),
            extra: serde_json::Map::new(),
        }
    }
}

/// One product entry in the cart with its quantity.
///
/// Serializes flat, matching the catalog record with an extra `amount` field:
/// `{"id":1,"title":"…","price":"179.9","image":"…","amount":2}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Product record as returned by the catalog.
    #[serde(flatten)]
    pub product: Product,
    /// Quantity in the cart (always at least 1).
    pub amount: u32,
}

impl CartItem {
    /// Create a line item with a quantity of one.
    #[must_use]
    pub const fn new(product: Product) -> Self {
        Self { product, amount: 1 }
    }

    /// Product id of this entry.
    #[must_use]
    pub const fn id(&self) -> ProductId {
        self.product.id
    }

    /// Unit price times quantity.
    #[must_use]
    pub fn line_price(&self) -> Price {
        self.product.price.times(self.amount)
    }
}

/// The ordered, id-unique collection of line items.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<CartItem>", into = "Vec<CartItem>")]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn empty() -> Self {
        Self { items: Vec::new() }
    }

    /// Line items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Number of distinct products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Find the entry for a product.
    #[must_use]
    pub fn find(&self, product_id: ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.id() == product_id)
    }

    /// Quantity of a product, if present.
    #[must_use]
    pub fn amount_of(&self, product_id: ProductId) -> Option<u32> {
        self.find(product_id).map(|item| item.amount)
    }

    #[must_use]
    pub fn contains(&self, product_id: ProductId) -> bool {
        self.find(product_id).is_some()
    }

    /// Sum of all quantities.
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.amount)).sum()
    }

    /// Sum of all line prices.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.items.iter().map(CartItem::line_price).sum()
    }

    /// Append a new entry with a quantity of one.
    ///
    /// # Errors
    ///
    /// Returns [`CartInvariantError::DuplicateProduct`] if the product is
    /// already in the cart.
    pub fn with_product_appended(&self, product: Product) -> Result<Self, CartInvariantError> {
        if self.contains(product.id) {
            return Err(CartInvariantError::DuplicateProduct(product.id));
        }
        let mut items = self.items.clone();
        items.push(CartItem::new(product));
        Ok(Self { items })
    }

    /// Increase one entry's quantity by one, leaving the rest unchanged.
    ///
    /// Returns `None` if the product is not in the cart.
    #[must_use]
    pub fn with_amount_incremented(&self, product_id: ProductId) -> Option<Self> {
        let current = self.amount_of(product_id)?;
        self.with_amount_unchecked(product_id, current.saturating_add(1))
    }

    /// Set one entry's quantity to exactly `amount`.
    ///
    /// Returns `None` if the product is not in the cart.
    #[must_use]
    pub fn with_amount(&self, product_id: ProductId, amount: NonZeroU32) -> Option<Self> {
        self.with_amount_unchecked(product_id, amount.get())
    }

    /// Drop one entry, preserving the order of the rest.
    ///
    /// Returns `None` if the product is not in the cart.
    #[must_use]
    pub fn without(&self, product_id: ProductId) -> Option<Self> {
        if !self.contains(product_id) {
            return None;
        }
        let items = self
            .items
            .iter()
            .filter(|item| item.id() != product_id)
            .cloned()
            .collect();
        Some(Self { items })
    }

    fn with_amount_unchecked(&self, product_id: ProductId, amount: u32) -> Option<Self> {
        if !self.contains(product_id) {
            return None;
        }
        let items = self
            .items
            .iter()
            .map(|item| {
                if item.id() == product_id {
                    CartItem {
                        product: item.product.clone(),
                        amount,
                    }
                } else {
                    item.clone()
                }
            })
            .collect();
        Some(Self { items })
    }
}

impl TryFrom<Vec<CartItem>> for Cart {
    type Error = CartInvariantError;

    fn try_from(items: Vec<CartItem>) -> Result<Self, Self::Error> {
        for (index, item) in items.iter().enumerate() {
            if item.amount == 0 {
                return Err(CartInvariantError::ZeroAmount(item.id()));
            }
            if items.iter().take(index).any(|prev| prev.id() == item.id()) {
                return Err(CartInvariantError::DuplicateProduct(item.id()));
            }
        }
        Ok(Self { items })
    }
}

impl From<Cart> for Vec<CartItem> {
    fn from(cart: Cart) -> Self {
        cart.items
    }
}
