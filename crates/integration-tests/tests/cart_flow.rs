//! End-to-end cart flows.
//!
//! Each test runs a `CartStore` over the real HTTP catalog client and file
//! storage, against an in-process fake catalog.

#![allow(clippy::unwrap_used)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use rocketshoes_core::{Cart, ProductId};
use rocketshoes_integration_tests::FakeCatalogServer;
use rocketshoes_storefront::catalog::{CatalogError, HttpCatalogClient};
use rocketshoes_storefront::config::CatalogApiConfig;
use rocketshoes_storefront::error::{CartError, CartErrorKind, OUT_OF_STOCK_MESSAGE};
use rocketshoes_storefront::notify::MemoryNotifier;
use rocketshoes_storefront::storage::{CART_STORAGE_KEY, CartStorage, FileStorage, LocalCartStorage};
use rocketshoes_storefront::store::{CartStore, UpdateProductAmount};

type Store = CartStore<HttpCatalogClient, LocalCartStorage<FileStorage>, Arc<MemoryNotifier>>;

fn client(server: &FakeCatalogServer, timeout: Duration) -> HttpCatalogClient {
    let config = CatalogApiConfig::new(server.base_url(), timeout).unwrap();
    HttpCatalogClient::new(&config).unwrap()
}

fn open_store(server: &FakeCatalogServer, path: &Path, notifier: &Arc<MemoryNotifier>) -> Store {
    CartStore::new(
        client(server, Duration::from_secs(5)),
        LocalCartStorage::file(path),
        Arc::clone(notifier),
    )
}

fn amounts(cart: &Cart) -> Vec<(i32, u32)> {
    cart.items()
        .iter()
        .map(|item| (item.id().as_i32(), item.amount))
        .collect()
}

async fn sneaker_catalog() -> FakeCatalogServer {
    let server = FakeCatalogServer::start().await;
    server.add_product(1, "Tenis de Caminhada Leve Confortavel", 179.9, 3);
    server.add_product(2, "Tenis VR Caminhada Confortavel", 139.9, 5);
    server.add_product(5, "Tenis Adidas Duramo Lite 2.0", 219.9, 10);
    server
}

#[tokio::test]
async fn test_add_new_product_fetches_record_and_persists() {
    let server = sneaker_catalog().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("storage.json");
    let notifier = Arc::new(MemoryNotifier::new());
    let store = open_store(&server, &path, &notifier);

    let cart = store.add_product(ProductId::new(5)).await.unwrap();

    assert_eq!(amounts(&cart), vec![(5, 1)]);
    let item = cart.find(ProductId::new(5)).unwrap();
    assert_eq!(item.product.title, "Tenis Adidas Duramo Lite 2.0");
    assert_eq!(item.product.price.to_string(), "$219.90");

    // Persisted snapshot equals the in-memory cart
    let persisted = LocalCartStorage::file(&path).load().unwrap();
    assert_eq!(persisted, Some(cart));
    assert!(notifier.messages().is_empty());
}

#[tokio::test]
async fn test_cart_survives_restart() {
    let server = sneaker_catalog().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("storage.json");
    let notifier = Arc::new(MemoryNotifier::new());

    {
        let store = open_store(&server, &path, &notifier);
        store.add_product(ProductId::new(1)).await.unwrap();
        store.add_product(ProductId::new(1)).await.unwrap();
        store.add_product(ProductId::new(2)).await.unwrap();
    }

    let reopened = open_store(&server, &path, &notifier);
    assert_eq!(amounts(&reopened.cart()), vec![(1, 2), (2, 1)]);

    // The storage file is a key/value map holding the cart under its key
    let raw = std::fs::read_to_string(&path).unwrap();
    let map: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert!(map[CART_STORAGE_KEY].is_string());
}

#[tokio::test]
async fn test_add_existing_product_uses_cached_record() {
    let server = sneaker_catalog().await;
    let dir = tempfile::tempdir().unwrap();
    let notifier = Arc::new(MemoryNotifier::new());
    let store = open_store(&server, &dir.path().join("storage.json"), &notifier);

    store.add_product(ProductId::new(2)).await.unwrap();
    store.add_product(ProductId::new(2)).await.unwrap();
    let cart = store.add_product(ProductId::new(2)).await.unwrap();

    assert_eq!(amounts(&cart), vec![(2, 3)]);
    // stock is checked every time, the product record only once
    assert_eq!(server.stock_hits(), 3);
    assert_eq!(server.product_hits(), 1);
}

#[tokio::test]
async fn test_add_past_stock_notifies_and_keeps_cart() {
    let server = sneaker_catalog().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("storage.json");
    let notifier = Arc::new(MemoryNotifier::new());
    let store = open_store(&server, &path, &notifier);

    store.add_product(ProductId::new(1)).await.unwrap();
    store.add_product(ProductId::new(1)).await.unwrap();
    server.set_stock(1, 2);

    let err = store.add_product(ProductId::new(1)).await.unwrap_err();

    assert_eq!(err.kind(), CartErrorKind::OutOfStock);
    assert_eq!(amounts(&store.cart()), vec![(1, 2)]);
    assert_eq!(
        LocalCartStorage::file(&path).load().unwrap(),
        Some(store.cart())
    );
    assert_eq!(notifier.messages(), vec![OUT_OF_STOCK_MESSAGE]);
}

#[tokio::test]
async fn test_update_and_remove_flow() {
    let server = sneaker_catalog().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("storage.json");
    let notifier = Arc::new(MemoryNotifier::new());
    let store = open_store(&server, &path, &notifier);

    for id in [1, 2, 5] {
        store.add_product(ProductId::new(id)).await.unwrap();
    }

    let cart = store
        .update_product_amount(UpdateProductAmount {
            product_id: ProductId::new(5),
            amount: 7,
        })
        .await
        .unwrap();
    assert_eq!(amounts(&cart), vec![(1, 1), (2, 1), (5, 7)]);

    let err = store
        .update_product_amount(UpdateProductAmount {
            product_id: ProductId::new(5),
            amount: 11,
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), CartErrorKind::OutOfStock);

    let cart = store.remove_product(ProductId::new(2)).await.unwrap();
    assert_eq!(amounts(&cart), vec![(1, 1), (5, 7)]);

    let err = store.remove_product(ProductId::new(2)).await.unwrap_err();
    assert_eq!(err.kind(), CartErrorKind::NotFound);

    assert_eq!(
        notifier.messages(),
        vec![OUT_OF_STOCK_MESSAGE, "Error removing product"]
    );
    assert_eq!(LocalCartStorage::file(&path).load().unwrap(), Some(cart));
}

#[tokio::test]
async fn test_unknown_product_reports_add_failure() {
    let server = sneaker_catalog().await;
    let dir = tempfile::tempdir().unwrap();
    let notifier = Arc::new(MemoryNotifier::new());
    let store = open_store(&server, &dir.path().join("storage.json"), &notifier);

    let err = store.add_product(ProductId::new(404)).await.unwrap_err();

    assert!(matches!(err, CartError::Catalog(CatalogError::NotFound(_))));
    assert!(store.cart().is_empty());
    assert_eq!(notifier.messages(), vec!["Error adding product"]);
}

#[tokio::test]
async fn test_malformed_product_record_reports_add_failure() {
    let server = sneaker_catalog().await;
    server.make_malformed(5);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("storage.json");
    let notifier = Arc::new(MemoryNotifier::new());
    let store = open_store(&server, &path, &notifier);

    let err = store.add_product(ProductId::new(5)).await.unwrap_err();

    assert!(matches!(err, CartError::Catalog(CatalogError::Parse(_))));
    assert!(store.cart().is_empty());
    assert!(!path.exists());
    assert_eq!(notifier.messages(), vec!["Error adding product"]);
}

#[tokio::test]
async fn test_catalog_record_is_stored_as_received() {
    let server = FakeCatalogServer::start().await;
    server.add_record(
        serde_json::json!({
            "id": 8,
            "title": "Tenis Limitado",
            "image": "https://cdn.example.test/8.jpg",
            "brand": "Olympikus",
            "colors": ["preto", "branco"],
        }),
        -1,
    );
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("storage.json");
    let notifier = Arc::new(MemoryNotifier::new());
    let store = open_store(&server, &path, &notifier);

    // A new product is appended even when the catalog reports negative stock
    let cart = store.add_product(ProductId::new(8)).await.unwrap();
    assert_eq!(amounts(&cart), vec![(8, 1)]);

    // ...but cannot be incremented
    let err = store.add_product(ProductId::new(8)).await.unwrap_err();
    assert_eq!(err.kind(), CartErrorKind::OutOfStock);

    let reopened = open_store(&server, &path, &notifier);
    let item = reopened.cart().find(ProductId::new(8)).cloned().unwrap();
    assert_eq!(item.product.price.to_string(), "$0.00");
    assert_eq!(item.product.extra["brand"], "Olympikus");
    assert_eq!(
        item.product.extra["colors"],
        serde_json::json!(["preto", "branco"])
    );
    assert_eq!(notifier.messages(), vec![OUT_OF_STOCK_MESSAGE]);
}

#[tokio::test]
async fn test_hung_stock_lookup_times_out() {
    let server = sneaker_catalog().await;
    server.delay_stock(Duration::from_secs(5));
    let dir = tempfile::tempdir().unwrap();
    let notifier = Arc::new(MemoryNotifier::new());
    let store = CartStore::new(
        client(&server, Duration::from_millis(200)),
        LocalCartStorage::file(dir.path().join("storage.json")),
        Arc::clone(&notifier),
    );

    let err = store.add_product(ProductId::new(1)).await.unwrap_err();

    assert!(matches!(err, CartError::Catalog(CatalogError::Http(_))));
    assert_eq!(err.kind(), CartErrorKind::Unexpected);
    assert!(store.cart().is_empty());
    assert_eq!(notifier.messages(), vec!["Error adding product"]);
}

#[tokio::test]
async fn test_concurrent_adds_through_shared_store() {
    let server = sneaker_catalog().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("storage.json");
    let notifier = Arc::new(MemoryNotifier::new());
    let store = Arc::new(open_store(&server, &path, &notifier));

    store.add_product(ProductId::new(5)).await.unwrap();

    let tasks: Vec<_> = (0..4)
        .map(|_| {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.add_product(ProductId::new(5)).await })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(store.cart().amount_of(ProductId::new(5)), Some(5));
    assert_eq!(LocalCartStorage::file(&path).load().unwrap(), Some(store.cart()));
}
