//! User-facing notifications.
//!
//! The cart store reports every failed operation through a [`Notifier`].
//! Delivery is fire-and-forget; how a message reaches the user (toast,
//! stderr, log line) is up to the implementation.

use std::sync::{Arc, Mutex};

use crate::error::add_breadcrumb;

/// Receives user-visible error messages.
pub trait Notifier: Send + Sync {
    /// Deliver an error message.
    fn error(&self, message: &str);
}

impl<T: Notifier + ?Sized> Notifier for Arc<T> {
    fn error(&self, message: &str) {
        (**self).error(message);
    }
}

/// Emits notifications as `tracing` events and Sentry breadcrumbs.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn error(&self, message: &str) {
        tracing::warn!(target: "rocketshoes::notify", %message, "Cart notification");
        add_breadcrumb("notification", message, None);
    }
}

/// Keeps every message in memory.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    messages: Mutex<Vec<String>>,
}

impl MemoryNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages received so far, oldest first.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .map(|messages| messages.clone())
            .unwrap_or_default()
    }

    /// Drain and return the received messages.
    pub fn take(&self) -> Vec<String> {
        self.messages
            .lock()
            .map(|mut messages| std::mem::take(&mut *messages))
            .unwrap_or_default()
    }
}

impl Notifier for MemoryNotifier {
    fn error(&self, message: &str) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(message.to_string());
        }
    }
}
