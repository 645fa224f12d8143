//! Debounced, cancellable catalog search.
//!
//! Each [`CatalogSearch::search`] call cancels the one before it. A call waits
//! for the debounce delay before hitting the backend, so a burst of keystrokes
//! produces a single request. A superseded call returns
//! [`SearchOutcome::Superseded`] and never publishes its result.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use marketstall_core::{Item, PageRequest};

use crate::api::{ApiClient, ApiError};

/// How a search call ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    Results(Vec<Item>),
    /// A newer search (or an explicit cancel) replaced this one.
    Superseded,
}

/// Shared handle to the search box state.
#[derive(Clone)]
pub struct CatalogSearch {
    inner: Arc<SearchInner>,
}

struct SearchInner {
    api: ApiClient,
    debounce: Duration,
    page: PageRequest,
    current: Mutex<CancellationToken>,
    latest: watch::Sender<Vec<Item>>,
}

impl CatalogSearch {
    #[must_use]
    pub fn new(api: ApiClient, debounce: Duration) -> Self {
        Self::with_page(api, debounce, PageRequest::default())
    }

    /// Search with a non-default page size.
    #[must_use]
    pub fn with_page(api: ApiClient, debounce: Duration, page: PageRequest) -> Self {
        Self {
            inner: Arc::new(SearchInner {
                api,
                debounce,
                page,
                current: Mutex::new(CancellationToken::new()),
                latest: watch::Sender::new(Vec::new()),
            }),
        }
    }

    /// Search the catalog; a blank query lists items instead.
    ///
    /// # Errors
    ///
    /// Returns the API error of a failed fetch. A fetch that fails after being
    /// superseded reports [`SearchOutcome::Superseded`] instead.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<SearchOutcome, ApiError> {
        let token = CancellationToken::new();
        {
            let mut current = self.inner.current.lock().unwrap_or_else(PoisonError::into_inner);
            current.cancel();
            *current = token.clone();
        }

        let query = query.trim().to_owned();
        let fetch = async {
            tokio::time::sleep(self.inner.debounce).await;
            if query.is_empty() {
                self.inner.api.get_items(self.inner.page).await
            } else {
                self.inner.api.search_items(&query, self.inner.page).await
            }
        };

        let result = tokio::select! {
            biased;
            () = token.cancelled() => {
                debug!("Search superseded");
                return Ok(SearchOutcome::Superseded);
            }
            result = fetch => result,
        };

        // Publish only while this call is still the current one
        let _current = self.inner.current.lock().unwrap_or_else(PoisonError::into_inner);
        if token.is_cancelled() {
            return Ok(SearchOutcome::Superseded);
        }
        match result {
            Ok(items) => {
                debug!(results = items.len(), "Search finished");
                self.inner.latest.send_replace(items.clone());
                Ok(SearchOutcome::Results(items))
            }
            Err(err) => {
                self.inner.latest.send_replace(Vec::new());
                Err(err)
            }
        }
    }

    /// Cancel the pending search, if any.
    pub fn cancel(&self) {
        self.inner
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .cancel();
    }

    /// Results of the most recent search that was not superseded.
    #[must_use]
    pub fn latest(&self) -> Vec<Item> {
        self.inner.latest.borrow().clone()
    }

    /// Follow published results.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Vec<Item>> {
        self.inner.latest.subscribe()
    }
}
