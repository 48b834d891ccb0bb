//! Cart commands.
//!
//! Each mutating command prints the resulting cart on success. On failure the
//! store has already delivered the user-facing notification; the error is
//! returned so the process exits non-zero.

use std::fmt::Write as _;

use rocketshoes_core::{Cart, ProductId};
use rocketshoes_storefront::state::AppState;
use rocketshoes_storefront::store::UpdateProductAmount;
use rocketshoes_storefront::view::CartView;
use tracing::info;

/// How the cart is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl OutputFormat {
    #[must_use]
    pub const fn from_json_flag(json: bool) -> Self {
        if json { Self::Json } else { Self::Table }
    }
}

/// Print the current cart.
///
/// # Errors
///
/// Returns an error if JSON encoding fails.
pub fn show(state: &AppState, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    print_cart(&state.cart().cart(), format)
}

/// Add one unit of a product.
///
/// # Errors
///
/// Returns an error if the product is out of stock or the lookup/write fails.
pub async fn add(
    state: &AppState,
    product_id: ProductId,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let cart = state.cart().add_product(product_id).await?;
    info!(%product_id, "Product added");
    print_cart(&cart, format)
}

/// Remove a product.
///
/// # Errors
///
/// Returns an error if the product is not in the cart or the write fails.
pub async fn remove(
    state: &AppState,
    product_id: ProductId,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let cart = state.cart().remove_product(product_id).await?;
    info!(%product_id, "Product removed");
    print_cart(&cart, format)
}

/// Set a product's quantity.
///
/// # Errors
///
/// Returns an error if the product is absent, out of stock, or the
/// lookup/write fails.
pub async fn update(
    state: &AppState,
    product_id: ProductId,
    amount: i64,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let cart = state
        .cart()
        .update_product_amount(UpdateProductAmount { product_id, amount })
        .await?;
    info!(%product_id, amount, "Product amount updated");
    print_cart(&cart, format)
}

/// Empty the cart.
///
/// # Errors
///
/// Returns an error if the write fails.
pub async fn clear(state: &AppState, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let cart = state.cart().clear().await?;
    info!("Cart cleared");
    print_cart(&cart, format)
}

#[allow(clippy::print_stdout)]
fn print_cart(cart: &Cart, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", render(&CartView::from(cart), format)?);
    Ok(())
}

/// Render a cart view as a table or JSON.
fn render(view: &CartView, format: OutputFormat) -> Result<String, serde_json::Error> {
    if format == OutputFormat::Json {
        return serde_json::to_string_pretty(view);
    }

    if view.items.is_empty() {
        return Ok("Cart is empty".to_string());
    }

    let title_width = view
        .items
        .iter()
        .map(|item| item.title.chars().count())
        .max()
        .unwrap_or(0)
        .max("PRODUCT".len());

    let mut out = String::new();
    // Writing to a String never fails
    let _ = writeln!(
        out,
        "{:>5}  {:<title_width$}  {:>4}  {:>10}  {:>10}",
        "ID", "PRODUCT", "QTY", "PRICE", "SUBTOTAL"
    );
    for item in &view.items {
        let _ = writeln!(
            out,
            "{:>5}  {:<title_width$}  {:>4}  {:>10}  {:>10}",
            item.id, item.title, item.amount, item.price, item.line_price
        );
    }
    let _ = write!(out, "{} item(s), total {}", view.item_count, view.subtotal);

    Ok(out)
}
