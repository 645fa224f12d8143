//! Cart endpoints (`/cart`).
//!
//! Cart bodies are returned raw: the backend has shipped both a wrapped
//! `{"items": [...]}` and a bare array shape, and the mirror normalizes them
//! with [`CartSnapshot::from_bodies`](marketstall_core::CartSnapshot::from_bodies).

use reqwest::Method;
use serde_json::Value;
use tracing::instrument;

use marketstall_core::ItemId;

use super::{ApiClient, ApiError, ItemQuantity, NO_BODY, Quantity};

impl ApiClient {
    /// Raw cart contents (`GET /cart`).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is not JSON.
    #[instrument(skip(self))]
    pub async fn get_cart(&self) -> Result<Value, ApiError> {
        self.get("/cart").await
    }

    /// Server-computed cart total (`GET /cart/total`).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is not JSON.
    #[instrument(skip(self))]
    pub async fn get_cart_total(&self) -> Result<Value, ApiError> {
        self.get("/cart/total").await
    }

    /// Add units of an item (`POST /cart`).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn add_to_cart(&self, item_id: ItemId, quantity: u32) -> Result<(), ApiError> {
        self.request_discard(Method::POST, "/cart", Some(&ItemQuantity { item_id, quantity }))
            .await
    }

    /// Set the quantity of a cart line (`PUT /cart/{itemId}`).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn update_cart_item(&self, item_id: ItemId, quantity: u32) -> Result<(), ApiError> {
        self.request_discard(Method::PUT, &format!("/cart/{item_id}"), Some(&Quantity { quantity }))
            .await
    }

    /// Drop a cart line (`DELETE /cart/{itemId}`).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn remove_cart_item(&self, item_id: ItemId) -> Result<(), ApiError> {
        self.request_discard(Method::DELETE, &format!("/cart/{item_id}"), NO_BODY)
            .await
    }

    /// Empty the cart (`DELETE /cart`).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self) -> Result<(), ApiError> {
        self.request_discard(Method::DELETE, "/cart", NO_BODY).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use url::Url;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::config::StorefrontConfig;
    use crate::token::MemoryTokenStore;

    #[tokio::test]
    async fn test_add_to_cart_body_shape() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/cart"))
            .and(body_json(serde_json::json!({ "itemId": 5, "quantity": 2 })))
            .respond_with(ResponseTemplate::new(200).set_body_string("Item added to cart"))
            .expect(1)
            .mount(&server)
            .await;

        let base = Url::parse(&format!("{}/api", server.uri())).unwrap();
        let client =
            ApiClient::new(&StorefrontConfig::new(base), Arc::new(MemoryTokenStore::new())).unwrap();

        // Plain-text acknowledgement is not decoded
        client.add_to_cart(ItemId::new(5), 2).await.unwrap();
    }

    #[tokio::test]
    async fn test_update_cart_item_path() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/cart/9"))
            .and(body_json(serde_json::json!({ "quantity": 1 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "ok": true })))
            .expect(1)
            .mount(&server)
            .await;

        let base = Url::parse(&format!("{}/api", server.uri())).unwrap();
        let client =
            ApiClient::new(&StorefrontConfig::new(base), Arc::new(MemoryTokenStore::new())).unwrap();
        client.update_cart_item(ItemId::new(9), 1).await.unwrap();
    }
}
