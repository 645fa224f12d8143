//! The storefront services bundled behind one cloneable handle.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::api::{ApiClient, ApiError};
use crate::cart::CartMirror;
use crate::config::StorefrontConfig;
use crate::error::StorefrontError;
use crate::favorites::FavoritesMirror;
use crate::orders::OrderService;
use crate::search::CatalogSearch;
use crate::session::SessionMirror;
use crate::token::{FileTokenStore, TokenStore};

/// Client, mirrors and services sharing one token store.
///
/// This struct is cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct Storefront {
    inner: Arc<StorefrontInner>,
}

struct StorefrontInner {
    config: StorefrontConfig,
    api: ApiClient,
    session: SessionMirror,
    cart: CartMirror,
    favorites: FavoritesMirror,
    search: CatalogSearch,
    orders: OrderService,
}

impl Storefront {
    /// Wire up every service around `tokens`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: StorefrontConfig, tokens: Arc<dyn TokenStore>) -> Result<Self, ApiError> {
        let api = ApiClient::new(&config, tokens)?;
        let session = SessionMirror::new(api.clone());
        let cart = CartMirror::new(api.clone(), session.clone());
        let favorites = FavoritesMirror::new(api.clone(), session.clone());
        let search = CatalogSearch::new(api.clone(), config.search_debounce);
        let orders = OrderService::new(api.clone());

        Ok(Self {
            inner: Arc::new(StorefrontInner {
                config,
                api,
                session,
                cart,
                favorites,
                search,
                orders,
            }),
        })
    }

    /// Wire up every service around the credential file at
    /// `config.token_path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the credential file cannot be read or the HTTP
    /// client cannot be constructed.
    pub fn open(config: StorefrontConfig) -> Result<Self, StorefrontError> {
        let tokens = FileTokenStore::open(&config.token_path)?;
        Ok(Self::new(config, Arc::new(tokens))?)
    }

    /// Start the tasks that keep the mirrors in step with each other.
    ///
    /// The session follows the client's login-required events; the cart and
    /// favorites follow the session. The tasks stop when the returned guard
    /// drops.
    #[must_use]
    pub fn spawn_sync_tasks(&self) -> SyncTasks {
        SyncTasks(vec![
            self.inner.session.watch_client_events(),
            self.inner.cart.spawn_session_sync(),
            self.inner.favorites.spawn_session_sync(),
        ])
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    #[must_use]
    pub fn session(&self) -> &SessionMirror {
        &self.inner.session
    }

    #[must_use]
    pub fn cart(&self) -> &CartMirror {
        &self.inner.cart
    }

    #[must_use]
    pub fn favorites(&self) -> &FavoritesMirror {
        &self.inner.favorites
    }

    #[must_use]
    pub fn search(&self) -> &CatalogSearch {
        &self.inner.search
    }

    #[must_use]
    pub fn orders(&self) -> &OrderService {
        &self.inner.orders
    }
}

/// Background sync tasks, aborted on drop.
#[derive(Debug)]
pub struct SyncTasks(Vec<JoinHandle<()>>);

impl Drop for SyncTasks {
    fn drop(&mut self) {
        for task in &self.0 {
            task.abort();
        }
    }
}
