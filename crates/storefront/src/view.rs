//! Cart display data.
//!
//! Formats a [`Cart`] for presentation: per-line prices, item count and
//! subtotal, all as ready-to-print strings.

use rocketshoes_core::{Cart, CartItem};
use serde::Serialize;

/// Cart item display data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartItemView {
    pub id: i32,
    pub title: String,
    pub image: String,
    pub amount: u32,
    pub price: String,
    pub line_price: String,
}

/// Cart display data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub item_count: u64,
}

impl CartView {
    /// Create an empty cart view.
    #[must_use]
    pub fn empty() -> Self {
        Self::from(&Cart::empty())
    }
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            items: cart.items().iter().map(CartItemView::from).collect(),
            subtotal: cart.subtotal().to_string(),
            item_count: cart.total_quantity(),
        }
    }
}

impl From<&CartItem> for CartItemView {
    fn from(item: &CartItem) -> Self {
        Self {
            id: item.id().as_i32(),
            title: item.product.title.clone(),
            image: item.product.image.clone(),
            amount: item.amount,
            price: item.product.price.to_string(),
            line_price: item.line_price().to_string(),
        }
    }
}
