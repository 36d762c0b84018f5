use crate::vault::VaultService;
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub vault: Arc<VaultService>,
}

impl AppState {
    pub fn new(vault: VaultService) -> Self {
        Self {
            vault: Arc::new(vault),
        }
    }
}
