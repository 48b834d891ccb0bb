//! Integration test support for RocketShoes.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p rocketshoes-integration-tests
//! ```
//!
//! Tests run the real `HttpCatalogClient` against [`FakeCatalogServer`], an in-process `axum` server bound to an
//! ephemeral port that serves the same `stock/{id}` and `products/{id}`
//! routes as the catalog API.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Behaviour of the fake catalog, mutable while the server runs.
#[derive(Debug, Default)]
struct Catalog {
    stock: HashMap<i32, i64>,
    products: HashMap<i32, serde_json::Value>,
    malformed: HashSet<i32>,
    stock_delay: Option<Duration>,
}

#[derive(Clone, Default)]
struct ServerState {
    catalog: Arc<RwLock<Catalog>>,
    stock_hits: Arc<AtomicUsize>,
    product_hits: Arc<AtomicUsize>,
}

/// In-process catalog API.
///
/// The server task is aborted when this value is dropped.
pub struct FakeCatalogServer {
    base_url: String,
    state: ServerState,
    handle: JoinHandle<()>,
}

impl FakeCatalogServer {
    /// Bind to `127.0.0.1:0` and start serving.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn start() -> Self {
        let state = ServerState::default();

        let app = Router::new()
            .route("/stock/{id}", get(stock))
            .route("/products/{id}", get(product))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake catalog");
        let addr = listener.local_addr().expect("Listener has no address");

        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
            handle,
        }
    }

    /// Base URL to point the catalog client at.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Register a product with a title, price and stock level.
    pub fn add_product(&self, id: i32, title: &str, price: f64, stock: i64) {
        self.add_record(
            json!({
                "id": id,
                "title": title,
                "price": price,
                "image": format!("https://cdn.example.test/{id}.jpg"),
            }),
            stock,
        );
    }

    /// Register a raw product record, served as-is.
    ///
    /// # Panics
    ///
    /// Panics if the record has no integer `id`.
    pub fn add_record(&self, record: serde_json::Value, stock: i64) {
        let id = record["id"]
            .as_i64()
            .and_then(|id| i32::try_from(id).ok())
            .expect("Product record needs an integer id");
        let mut catalog = self.catalog_mut();
        catalog.stock.insert(id, stock);
        catalog.products.insert(id, record);
    }

    /// Change the stock level of a product.
    pub fn set_stock(&self, id: i32, stock: i64) {
        self.catalog_mut().stock.insert(id, stock);
    }

    /// Make `products/{id}` return a body that is not a product record.
    pub fn make_malformed(&self, id: i32) {
        self.catalog_mut().malformed.insert(id);
    }

    /// Delay every stock response.
    pub fn delay_stock(&self, delay: Duration) {
        self.catalog_mut().stock_delay = Some(delay);
    }

    /// Number of `stock/{id}` requests served.
    #[must_use]
    pub fn stock_hits(&self) -> usize {
        self.state.stock_hits.load(Ordering::SeqCst)
    }

    /// Number of `products/{id}` requests served.
    #[must_use]
    pub fn product_hits(&self) -> usize {
        self.state.product_hits.load(Ordering::SeqCst)
    }

    fn catalog_mut(&self) -> std::sync::RwLockWriteGuard<'_, Catalog> {
        self.state
            .catalog
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Drop for FakeCatalogServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn stock(State(state): State<ServerState>, Path(id): Path<i32>) -> Response {
    state.stock_hits.fetch_add(1, Ordering::SeqCst);

    let (amount, delay) = {
        let catalog = state
            .catalog
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        (catalog.stock.get(&id).copied(), catalog.stock_delay)
    };

    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    match amount {
        Some(amount) => Json(json!({ "id": id, "amount": amount })).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn product(State(state): State<ServerState>, Path(id): Path<i32>) -> Response {
    state.product_hits.fetch_add(1, Ordering::SeqCst);

    let catalog = state
        .catalog
        .read()
        .unwrap_or_else(std::sync::PoisonError::into_inner);

    if catalog.malformed.contains(&id) {
        return (StatusCode::OK, "<html>maintenance</html>").into_response();
    }

    match catalog.products.get(&id) {
        Some(record) => Json(record.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
