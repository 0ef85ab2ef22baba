//! Shared application state for all routes.

use crate::schema::Registry;
use crate::store::EntityStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn EntityStore>,
    /// Resolved once at startup; never mutated afterwards.
    pub registry: Arc<Registry>,
}

impl AppState {
    pub fn new(store: Arc<dyn EntityStore>, registry: Registry) -> Self {
        AppState {
            store,
            registry: Arc::new(registry),
        }
    }
}
