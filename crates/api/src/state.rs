//! Application state shared across handlers.

use std::sync::Arc;

use crate::auth::TokenService;
use crate::config::ApiConfig;
use crate::db::{AccountStore, AddressStore, ProductStore, Stores};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Services are built per request from the
/// stores held here.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    stores: Stores,
    tokens: TokenService,
}

impl AppState {
    #[must_use]
    pub fn new(config: ApiConfig, stores: Stores) -> Self {
        let tokens = TokenService::new(&config.jwt_secret, config.token_ttl);
        Self {
            inner: Arc::new(AppStateInner {
                config,
                stores,
                tokens,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.inner.tokens
    }

    #[must_use]
    pub fn products(&self) -> &dyn ProductStore {
        self.inner.stores.products.as_ref()
    }

    #[must_use]
    pub fn addresses(&self) -> &dyn AddressStore {
        self.inner.stores.addresses.as_ref()
    }

    #[must_use]
    pub fn accounts(&self) -> &dyn AccountStore {
        self.inner.stores.accounts.as_ref()
    }
}
