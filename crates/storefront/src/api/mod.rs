//! Authenticated REST client for the storefront backend.
//!
//! # Architecture
//!
//! - One `reqwest::Client` behind a cheaply cloneable handle
//! - The stored access token is attached as a bearer credential to every call
//! - A `401` is recovered once: the token is refreshed and the request is
//!   replayed. The retry budget travels with the call as an explicit
//!   [`RetryBudget`] value, so nothing shared is mutated to mark a request
//!   as retried.
//! - When the refresh fails both tokens are cleared and a
//!   [`ClientEvent::LoginRequired`] is broadcast
//!
//! Endpoint groups live in submodules, each adding methods to [`ApiClient`]:
//! [`auth`], [`profile`], [`catalog`], [`cart`], [`orders`], [`favorites`].
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use marketstall_storefront::{ApiClient, MemoryTokenStore, StorefrontConfig};
//!
//! let client = ApiClient::new(&config, Arc::new(MemoryTokenStore::new()))?;
//! let items = client.get_items(PageRequest::default()).await?;
//! ```

pub mod auth;
pub mod cart;
pub mod catalog;
mod error;
pub mod favorites;
pub mod orders;
pub mod profile;

pub use error::ApiError;

use std::sync::Arc;

use reqwest::{Method, StatusCode};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::broadcast;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::StorefrontConfig;
use crate::token::{TokenKey, TokenStore};

const EVENT_CAPACITY: usize = 16;

/// Placeholder body type for requests without a body.
pub(crate) const NO_BODY: Option<&()> = None;

/// `{"itemId": .., "quantity": ..}` body shared by the cart and order endpoints.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ItemQuantity {
    pub item_id: marketstall_core::ItemId,
    pub quantity: u32,
}

/// `{"quantity": ..}` body for line updates.
#[derive(Serialize)]
pub(crate) struct Quantity {
    pub quantity: u32,
}

/// Notifications the client emits outside the request/response flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// The session could not be refreshed; the user must sign in again at
    /// `login_path`.
    LoginRequired { login_path: String },
}

/// How many times a request may still be replayed after a credential refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBudget(u8);

impl RetryBudget {
    /// One refresh-and-replay allowed.
    pub const ONCE: Self = Self(1);
    /// No replay; a `401` is returned to the caller as is.
    pub const NONE: Self = Self(0);

    /// Consume one retry, returning the remaining budget.
    #[must_use]
    pub const fn spend(self) -> Option<Self> {
        match self.0 {
            0 => None,
            n => Some(Self(n - 1)),
        }
    }
}

/// Client for the storefront REST API.
///
/// Cloning is cheap; all clones share the HTTP connection pool, token store
/// and event channel.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    base_url: Url,
    login_path: String,
    tokens: Arc<dyn TokenStore>,
    events: broadcast::Sender<ClientEvent>,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &StorefrontConfig, tokens: Arc<dyn TokenStore>) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder().user_agent(concat!(
            "marketstall/",
            env!("CARGO_PKG_VERSION")
        ));
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                http: builder.build()?,
                base_url: config.api_base_url.clone(),
                login_path: config.login_path.clone(),
                tokens,
                events,
            }),
        })
    }

    /// The credential store this client reads and refreshes.
    #[must_use]
    pub fn tokens(&self) -> &Arc<dyn TokenStore> {
        &self.inner.tokens
    }

    /// Base URL every endpoint path is appended to.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Subscribe to [`ClientEvent`]s.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.inner.events.subscribe()
    }

    // =========================================================================
    // Request Execution
    // =========================================================================

    /// Issue a request and decode the response body.
    ///
    /// `path` is appended to the base URL and may carry a query string. An
    /// empty response body decodes as JSON `null`, so `T = ()` and
    /// `T = Option<_>` work for endpoints that return nothing.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Transport`] when no response arrives,
    /// [`ApiError::Status`] for error statuses (a `401` only after the one
    /// refresh-and-replay), [`ApiError::RefreshFailed`] when the session could
    /// not be refreshed, and [`ApiError::Decode`] for unexpected bodies.
    pub async fn request<T, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized + Sync,
    {
        let url = self.url(path)?;
        self.execute(method, url, body).await
    }

    /// Issue a request whose response body carries nothing the caller needs.
    ///
    /// The status is checked exactly as in [`request`](Self::request),
    /// including the refresh-and-replay on `401`, but the body is ignored.
    /// Acknowledgements such as a plain-text `Item added to cart` succeed.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Transport`], [`ApiError::Status`] or
    /// [`ApiError::RefreshFailed`]; never [`ApiError::Decode`].
    pub async fn request_discard<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<(), ApiError>
    where
        B: Serialize + ?Sized + Sync,
    {
        let url = self.url(path)?;
        self.send(&method, &url, body, RetryBudget::ONCE).await?;
        Ok(())
    }

    /// Build the absolute URL for an endpoint path.
    pub(crate) fn url(&self, path: &str) -> Result<Url, ApiError> {
        let base = self.inner.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Url::parse(&format!("{base}/{path}")).map_err(|source| ApiError::InvalidUrl {
            path: path.to_string(),
            source,
        })
    }

    /// Build an endpoint URL with query parameters (values are percent-encoded).
    pub(crate) fn url_with_query(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Url, ApiError> {
        let mut url = self.url(path)?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    pub(crate) async fn execute<T, B>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized + Sync,
    {
        let bytes = self.send(&method, &url, body, RetryBudget::ONCE).await?;
        decode(&bytes)
    }

    /// Send a request, recovering from an expired access token while the
    /// retry budget allows.
    #[instrument(skip_all, fields(method = %method, path = %url.path()))]
    async fn send<B>(
        &self,
        method: &Method,
        url: &Url,
        body: Option<&B>,
        mut budget: RetryBudget,
    ) -> Result<Vec<u8>, ApiError>
    where
        B: Serialize + ?Sized + Sync,
    {
        loop {
            let mut request = self.inner.http.request(method.clone(), url.clone());
            if let Some(token) = self.inner.tokens.get(TokenKey::Access) {
                request = request.bearer_auth(token.expose_secret());
            }
            if let Some(body) = body {
                request = request.json(body);
            }

            let response = request.send().await?;
            let status = response.status();

            if status == StatusCode::UNAUTHORIZED
                && let Some(remaining) = budget.spend()
            {
                budget = remaining;
                debug!("Access token rejected, refreshing");
                if let Err(err) = self.refresh_credential().await {
                    warn!(error = %err, "Session expired, login required");
                    let _ = self.inner.events.send(ClientEvent::LoginRequired {
                        login_path: self.inner.login_path.clone(),
                    });
                    return Err(err);
                }
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                debug!(status = %status, "Backend returned error status");
                return Err(ApiError::Status {
                    method: method.clone(),
                    path: url.path().to_string(),
                    status,
                    body,
                });
            }

            return Ok(response.bytes().await?.to_vec());
        }
    }

    // =========================================================================
    // Typed Helpers
    // =========================================================================

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(Method::GET, path, NO_BODY).await
    }

    pub(crate) async fn post<T, B>(&self, path: &str, body: Option<&B>) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized + Sync,
    {
        self.request(Method::POST, path, body).await
    }

    pub(crate) async fn put<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized + Sync,
    {
        self.request(Method::PUT, path, Some(body)).await
    }
}

/// Decode a response body, treating an empty body as JSON `null`.
fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ApiError> {
    let bytes = if bytes.iter().all(u8::is_ascii_whitespace) {
        b"null".as_slice()
    } else {
        bytes
    };
    Ok(serde_json::from_slice(bytes)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::token::MemoryTokenStore;

    fn test_client(base: &str) -> ApiClient {
        let config = StorefrontConfig::new(Url::parse(base).unwrap());
        ApiClient::new(&config, Arc::new(MemoryTokenStore::new())).unwrap()
    }

    #[test]
    fn test_retry_budget() {
        let once = RetryBudget::ONCE;
        let remaining = once.spend().unwrap();
        assert_eq!(remaining, RetryBudget::NONE);
        assert!(remaining.spend().is_none());
    }

    #[test]
    fn test_url_keeps_base_path() {
        let client = test_client("http://localhost:9090/api");
        assert_eq!(
            client.url("/cart/total").unwrap().as_str(),
            "http://localhost:9090/api/cart/total"
        );

        let client = test_client("http://localhost:9090/api/");
        assert_eq!(
            client.url("items").unwrap().as_str(),
            "http://localhost:9090/api/items"
        );
    }

    #[test]
    fn test_url_with_query_encodes_values() {
        let client = test_client("http://localhost:9090/api");
        let url = client
            .url_with_query(
                "/items/search",
                &[("query", "red & blue".to_string()), ("page", "2".to_string())],
            )
            .unwrap();
        assert_eq!(url.path(), "/api/items/search");
        assert_eq!(url.query(), Some("query=red+%26+blue&page=2"));
    }

    #[test]
    fn test_decode_empty_body_as_null() {
        decode::<()>(b"").unwrap();
        decode::<()>(b"  \n").unwrap();
        assert_eq!(decode::<Option<u32>>(b"").unwrap(), None);
        assert_eq!(decode::<u32>(b"7").unwrap(), 7);
        assert!(matches!(decode::<u32>(b"{}"), Err(ApiError::Decode(_))));
    }
}
