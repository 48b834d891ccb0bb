//! RocketShoes Core - Cart domain types.
//!
//! This crate provides the types shared by every RocketShoes component:
//! - `storefront` - Cart store, catalog client and storage backends
//! - `cli` - Command-line front end for the cart
//!
//! # Architecture
//!
//! The core crate contains only types and pure transitions - no I/O, no HTTP
//! clients, no storage. Every cart operation here returns a new [`Cart`]
//! and leaves the original untouched, so the store can compute a complete
//! replacement before committing anything.
//!
//! # Modules
//!
//! - [`types`] - Product ids, prices, products, line items and the cart

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
