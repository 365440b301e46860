//! Application state for shared services

use std::sync::Arc;

use crate::domain::SearchBackend;
use crate::infrastructure::credential::AuthMode;

/// Shared state handed to every request handler and middleware
#[derive(Clone)]
pub struct AppState {
    /// Authentication mode, selected once at startup
    pub auth: Arc<AuthMode>,
    /// Downstream document-search handler, invoked only after acceptance
    pub search: Arc<dyn SearchBackend>,
}

impl AppState {
    pub fn new(auth: AuthMode, search: Arc<dyn SearchBackend>) -> Self {
        Self {
            auth: Arc::new(auth),
            search,
        }
    }
}
