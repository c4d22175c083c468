//! Application state shared across all request handlers.

use std::sync::Arc;

use crate::catalog::ElementCatalog;
use crate::chat::{ChatService, GeminiClient, SessionRegistry};
use crate::config::UshaConfig;

/// Shared application state.
pub struct AppState {
    /// Read-only element catalog.
    pub catalog: Arc<ElementCatalog>,
    /// Upstream chat client.
    pub chat: Arc<dyn ChatService>,
    /// Live chat sessions.
    pub sessions: SessionRegistry,
    /// Effective configuration.
    pub config: UshaConfig,
}

impl AppState {
    /// Create the application state from configuration and the bundled catalog.
    ///
    /// # Errors
    /// Returns an error if the catalog fails validation or the chat client
    /// cannot be built.
    pub fn new(config: UshaConfig) -> Result<Arc<Self>, Box<dyn std::error::Error + Send + Sync>> {
        let catalog = ElementCatalog::bundled()
            .map_err(|e| format!("Failed to load element catalog: {e}"))?;
        tracing::info!(elements = catalog.len(), "Element catalog loaded");

        let client =
            GeminiClient::new(&config).map_err(|e| format!("Failed to create chat client: {e}"))?;

        Ok(Self::with_parts(config, catalog, Arc::new(client)))
    }

    /// Assemble state from already-built parts.
    #[must_use]
    pub fn with_parts(
        config: UshaConfig,
        catalog: ElementCatalog,
        chat: Arc<dyn ChatService>,
    ) -> Arc<Self> {
        Arc::new(Self {
            catalog: Arc::new(catalog),
            chat,
            sessions: SessionRegistry::new(config.max_sessions),
            config,
        })
    }
}
