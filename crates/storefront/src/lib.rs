//! RocketShoes storefront cart library.
//!
//! This crate provides the cart store and its collaborators as a library,
//! allowing it to be tested and reused by any front end.
//!
//! # Architecture
//!
//! - [`store::CartStore`] owns the cart and applies add/remove/update
//! - [`catalog`] looks up stock and product records (REST, `reqwest` + `moka`)
//! - [`storage`] persists the cart under a fixed local-storage key
//! - [`notify`] delivers user-facing error messages
//! - [`state::AppState`] wires the production collaborators from [`config`]
//!
//! # Example
//!
//! ```rust,ignore
//! use rocketshoes_storefront::{config::CartConfig, state::AppState};
//!
//! let state = AppState::new(CartConfig::from_env()?)?;
//! let cart = state.cart().add_product(ProductId::new(1)).await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod config;
pub mod error;
pub mod notify;
pub mod state;
pub mod storage;
pub mod store;
pub mod view;
