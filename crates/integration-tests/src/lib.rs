//! Integration tests for Marketstall.
//!
//! Every test runs the storefront library against a `wiremock` mock backend,
//! so no live server is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p marketstall-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `api_client` - bearer handling and the refresh-and-replay path
//! - `session` - session mirror lifecycle
//! - `cart` - cart mirror policy and refetching
//! - `search` - debounced, cancellable search
//! - `orders` / `favorites` - order and favorites services

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use marketstall_storefront::{MemoryTokenStore, Storefront, StorefrontConfig, TokenStore};
use serde_json::{Value, json};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A mock backend plus a storefront wired to it.
pub struct TestContext {
    pub server: MockServer,
    pub tokens: Arc<MemoryTokenStore>,
    pub storefront: Storefront,
}

impl TestContext {
    /// No stored credentials.
    pub async fn new() -> Self {
        Self::start(MemoryTokenStore::new(), Duration::ZERO).await
    }

    /// Start with the given credentials already stored.
    pub async fn with_tokens(access: Option<&str>, refresh: Option<&str>) -> Self {
        Self::start(MemoryTokenStore::with_tokens(access, refresh), Duration::ZERO).await
    }

    /// Start with a stored session that the backend accepts, already restored.
    pub async fn signed_in() -> Self {
        let ctx = Self::with_tokens(Some("access-1"), Some("refresh-1")).await;
        mount_profile(&ctx.server).await;
        let state = ctx.storefront.session().initialize().await.unwrap();
        assert!(state.is_authenticated());
        ctx
    }

    pub async fn start(tokens: MemoryTokenStore, search_debounce: Duration) -> Self {
        let server = MockServer::start().await;
        let mut config = StorefrontConfig::new(Url::parse(&format!("{}/api", server.uri())).unwrap());
        config.search_debounce = search_debounce;

        let tokens = Arc::new(tokens);
        let store: Arc<dyn TokenStore> = tokens.clone();
        let storefront = Storefront::new(config, store).unwrap();

        Self {
            server,
            tokens,
            storefront,
        }
    }

    /// Requests the backend has seen for `http_method` and `url_path`.
    pub async fn requests_to(&self, http_method: &str, url_path: &str) -> Vec<wiremock::Request> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|req| req.method.as_str() == http_method && req.url.path() == url_path)
            .collect()
    }
}

// =============================================================================
// Fixtures
// =============================================================================

pub fn profile_json() -> Value {
    json!({
        "id": 1,
        "firstName": "Ada",
        "lastName": "Lovelace",
        "email": "ada@example.com",
        "city": "London"
    })
}

pub fn item_json(id: i64, name: &str, price: f64) -> Value {
    json!({
        "id": id,
        "name": name,
        "price": price,
        "stockQuantity": 10
    })
}

/// A `GET /cart` body (wrapped shape) holding `(item_id, quantity)` lines.
pub fn cart_json(lines: &[(i64, u32)]) -> Value {
    let items: Vec<Value> = lines
        .iter()
        .map(|(id, quantity)| {
            json!({
                "item": item_json(*id, &format!("Item {id}"), 5.0),
                "quantity": quantity
            })
        })
        .collect();
    json!({ "items": items })
}

pub fn order_json(id: i64, status: &str) -> Value {
    json!({
        "id": id,
        "status": status,
        "orderDate": "2024-03-01T10:15:00",
        "totalPrice": 10.0,
        "shippingAddress": "1 Analytical Row, London",
        "orderItems": [
            { "id": 70, "itemId": 5, "itemName": "Item 5", "price": 5.0, "quantity": 2 }
        ]
    })
}

// =============================================================================
// Mounts
// =============================================================================

pub async fn mount_profile(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/users/profile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_json()))
        .mount(server)
        .await;
}

/// Serve `cart` and `total` for every cart refetch.
pub async fn mount_cart(server: &MockServer, cart: Value, total: Value) {
    Mock::given(method("GET"))
        .and(path("/api/cart"))
        .respond_with(ResponseTemplate::new(200).set_body_json(cart))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/cart/total"))
        .respond_with(ResponseTemplate::new(200).set_body_json(total))
        .mount(server)
        .await;
}

pub async fn mount_availability(server: &MockServer, item_id: i64, in_stock: bool, available: u32) {
    Mock::given(method("GET"))
        .and(path(format!("/api/items/{item_id}/availability")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "inStock": in_stock,
            "availableQuantity": available
        })))
        .mount(server)
        .await;
}
