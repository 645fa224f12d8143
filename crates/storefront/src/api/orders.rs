//! Order endpoints (`/orders`).

use reqwest::Method;
use tracing::instrument;

use marketstall_core::{CreatedOrder, ItemId, Order, OrderId, OrderItemId};

use super::{ApiClient, ApiError, ItemQuantity, NO_BODY, Quantity};

impl ApiClient {
    /// All orders of the signed-in user (`GET /orders`).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is not an order list.
    #[instrument(skip(self))]
    pub async fn list_orders(&self) -> Result<Vec<Order>, ApiError> {
        self.get("/orders").await
    }

    /// One order with its lines (`GET /orders/{id}`).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is not an order.
    #[instrument(skip(self))]
    pub async fn get_order(&self, order_id: OrderId) -> Result<Order, ApiError> {
        self.get(&format!("/orders/{order_id}")).await
    }

    /// The order still being assembled, if any (`GET /orders/pending`).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is not an order.
    #[instrument(skip(self))]
    pub async fn get_pending_order(&self) -> Result<Option<Order>, ApiError> {
        self.get("/orders/pending").await
    }

    /// Place the pending order (`POST /orders`).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn place_order(&self) -> Result<(), ApiError> {
        self.request_discard(Method::POST, "/orders", NO_BODY).await
    }

    /// Turn the cart into a new order (`POST /orders/create-from-cart`).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body has no `orderId`.
    #[instrument(skip(self))]
    pub async fn create_order_from_cart(&self) -> Result<OrderId, ApiError> {
        let created: CreatedOrder = self.post("/orders/create-from-cart", NO_BODY).await?;
        Ok(created.order_id)
    }

    /// Close an order so it can no longer be edited (`POST /orders/{id}/close`).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn close_order(&self, order_id: OrderId) -> Result<(), ApiError> {
        self.request_discard(Method::POST, &format!("/orders/{order_id}/close"), NO_BODY)
            .await
    }

    /// Placed orders (`GET /orders/history`).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is not an order list.
    #[instrument(skip(self))]
    pub async fn order_history(&self) -> Result<Vec<Order>, ApiError> {
        self.get("/orders/history").await
    }

    /// Add an item to the pending order (`POST /orders/items`).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn add_to_order(&self, item_id: ItemId, quantity: u32) -> Result<(), ApiError> {
        self.request_discard(
            Method::POST,
            "/orders/items",
            Some(&ItemQuantity { item_id, quantity }),
        )
        .await
    }

    /// Add an item to a specific order (`POST /orders/{id}/items`).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn add_item_to_order(
        &self,
        order_id: OrderId,
        item_id: ItemId,
        quantity: u32,
    ) -> Result<(), ApiError> {
        self.request_discard(
            Method::POST,
            &format!("/orders/{order_id}/items"),
            Some(&ItemQuantity { item_id, quantity }),
        )
        .await
    }

    /// Change the quantity of an order line (`PUT /orders/{id}/items/{orderItemId}`).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn update_order_item(
        &self,
        order_id: OrderId,
        order_item_id: OrderItemId,
        quantity: u32,
    ) -> Result<(), ApiError> {
        self.request_discard(
            Method::PUT,
            &format!("/orders/{order_id}/items/{order_item_id}"),
            Some(&Quantity { quantity }),
        )
        .await
    }

    /// Remove an order line (`DELETE /orders/{id}/items/{orderItemId}`).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn remove_order_item(
        &self,
        order_id: OrderId,
        order_item_id: OrderItemId,
    ) -> Result<(), ApiError> {
        self.request_discard(
            Method::DELETE,
            &format!("/orders/{order_id}/items/{order_item_id}"),
            NO_BODY,
        )
        .await
    }

    /// Set an item's quantity in the order being processed
    /// (`PUT /orders/process/update-quantity`).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn update_process_quantity(
        &self,
        item_id: ItemId,
        quantity: u32,
    ) -> Result<(), ApiError> {
        self.request_discard(
            Method::PUT,
            "/orders/process/update-quantity",
            Some(&ItemQuantity { item_id, quantity }),
        )
        .await
    }
}
