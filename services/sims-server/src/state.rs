//! Shared axum state: a single registry handle cloned into every handler.

use std::sync::Arc;

use sims_core::Registry;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
}

impl AppState {
    pub fn new(registry: Arc<Registry>) -> Self {
        AppState { registry }
    }
}
