//! Cart persistence.
//!
//! Carts are stored the way a browser stores them in local storage: one JSON
//! string under a fixed key in a flat key/value store. [`LocalCartStorage`]
//! layers the cart encoding on top of any [`StorageBackend`]:
//!
//! - [`FileStorage`] - JSON object file on disk, replaced atomically on write
//! - [`MemoryStorage`] - process-local map, for tests and ephemeral carts

mod file;
mod memory;

use std::path::PathBuf;
use std::sync::Arc;

use rocketshoes_core::Cart;
use thiserror::Error;

pub use file::FileStorage;
pub use memory::MemoryStorage;

/// Key the cart snapshot is stored under.
pub const CART_STORAGE_KEY: &str = "@RocketShoes:cart";

/// Errors raised by storage backends.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("storage I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The backing file is not a JSON object of strings.
    #[error("storage file {} is malformed: {source}", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The value stored under a key is not a valid cart.
    #[error("stored value for {key} is not a valid cart: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Encoding a value failed.
    #[error("failed to encode value: {0}")]
    Encode(#[from] serde_json::Error),

    /// A writer panicked while holding the storage lock.
    #[error("storage lock poisoned")]
    Poisoned,
}

/// A flat string key/value store.
pub trait StorageBackend: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

impl<T: StorageBackend + ?Sized> StorageBackend for Arc<T> {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set_item(key, value)
    }
}

/// Cart persistence used by the cart store.
pub trait CartStorage: Send + Sync {
    /// Load the persisted cart, or `None` if nothing has been saved yet.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend fails or the snapshot is invalid.
    fn load(&self) -> Result<Option<Cart>, StorageError>;

    /// Persist a full cart snapshot.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the snapshot cannot be written.
    fn save(&self, cart: &Cart) -> Result<(), StorageError>;
}

impl<T: CartStorage + ?Sized> CartStorage for Arc<T> {
    fn load(&self) -> Result<Option<Cart>, StorageError> {
        (**self).load()
    }

    fn save(&self, cart: &Cart) -> Result<(), StorageError> {
        (**self).save(cart)
    }
}

/// Stores the cart as a JSON string under a fixed key of a backend.
#[derive(Debug, Clone)]
pub struct LocalCartStorage<B> {
    backend: B,
    key: String,
}

impl<B: StorageBackend> LocalCartStorage<B> {
    /// Store under [`CART_STORAGE_KEY`].
    #[must_use]
    pub fn new(backend: B) -> Self {
        Self::with_key(backend, CART_STORAGE_KEY)
    }

    /// Store under a custom key.
    #[must_use]
    pub fn with_key(backend: B, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
        }
    }

    /// The underlying backend.
    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl LocalCartStorage<FileStorage> {
    /// File-backed storage at `path`.
    #[must_use]
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::new(FileStorage::new(path))
    }
}

impl LocalCartStorage<MemoryStorage> {
    /// Empty in-memory storage.
    #[must_use]
    pub fn memory() -> Self {
        Self::new(MemoryStorage::default())
    }
}

impl<B: StorageBackend> CartStorage for LocalCartStorage<B> {
    fn load(&self) -> Result<Option<Cart>, StorageError> {
        let Some(raw) = self.backend.get_item(&self.key)? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| StorageError::Corrupt {
                key: self.key.clone(),
                source,
            })
    }

    fn save(&self, cart: &Cart) -> Result<(), StorageError> {
        let raw = serde_json::to_string(cart)?;
        self.backend.set_item(&self.key, &raw)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rocketshoes_core::{Price, Product, ProductId};

    use super::*;

    fn sample_cart() -> Cart {
        Cart::empty()
            .with_product_appended(Product::new(
                ProductId::new(1),
                "Tenis de Caminhada",
                Price::from_cents(17990),
                "https://cdn.example.test/1.jpg",
            ))
            .unwrap()
            .with_amount_incremented(ProductId::new(1))
            .unwrap()
    }

    #[test]
    fn test_load_empty_is_none() {
        let storage = LocalCartStorage::memory();
        assert!(storage.load().unwrap().is_none());
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let storage = LocalCartStorage::memory();
        let cart = sample_cart();
        storage.save(&cart).unwrap();
        assert_eq!(storage.load().unwrap(), Some(cart));
    }

    #[test]
    fn test_saves_under_fixed_key() {
        let storage = LocalCartStorage::memory();
        storage.save(&sample_cart()).unwrap();
        let raw = storage.backend().get_item(CART_STORAGE_KEY).unwrap().unwrap();
        assert!(raw.starts_with("[{"));
        assert!(raw.contains("\"amount\":2"));
    }

    #[test]
    fn test_corrupt_value() {
        let storage = LocalCartStorage::memory();
        storage
            .backend()
            .set_item(CART_STORAGE_KEY, "{not json")
            .unwrap();
        let err = storage.load().unwrap_err();
        assert!(matches!(err, StorageError::Corrupt { ref key, .. } if key == CART_STORAGE_KEY));
    }

    #[test]
    fn test_custom_key_is_isolated() {
        let backend = Arc::new(MemoryStorage::default());
        let a = LocalCartStorage::with_key(Arc::clone(&backend), "a");
        let b = LocalCartStorage::with_key(Arc::clone(&backend), "b");
        a.save(&sample_cart()).unwrap();
        assert!(b.load().unwrap().is_none());
        assert_eq!(a.key(), "a");
    }
}
