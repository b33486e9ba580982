//! Application state shared across handlers.

use std::sync::Arc;

use crate::api::{ApiError, QkartClient};
use crate::config::StorefrontConfig;
use crate::search::SearchDebouncer;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the backend client and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    api: QkartClient,
    search: SearchDebouncer,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend HTTP client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, ApiError> {
        let api = QkartClient::new(&config.api)?;
        let search = SearchDebouncer::new(config.search_debounce);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                api,
                search,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the QKart backend client.
    #[must_use]
    pub fn api(&self) -> &QkartClient {
        &self.inner.api
    }

    /// Get a reference to the live-search debouncer.
    #[must_use]
    pub fn search(&self) -> &SearchDebouncer {
        &self.inner.search
    }
}
