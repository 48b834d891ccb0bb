//! Core types for RocketShoes.
//!
//! This module provides type-safe wrappers for the cart domain.

pub mod cart;
pub mod id;
pub mod price;

pub use cart::{Cart, CartInvariantError, CartItem, Product};
pub use id::*;
pub use price::Price;
