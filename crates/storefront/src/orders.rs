//! Order service.
//!
//! Wraps the order endpoints with the editable-order rule: items may only be
//! added, changed or removed while an order is `TEMP`. Mutations on any other
//! order are rejected locally before the mutating call is made, and every
//! accepted mutation returns the refetched order.

use thiserror::Error;
use tracing::{info, instrument};

use marketstall_core::{ItemId, Order, OrderId, OrderItemId, OrderStatus};

use crate::api::{ApiClient, ApiError};

/// Errors raised by [`OrderService`] operations.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Order {order_id} is {status} and can no longer be changed")]
    NotEditable {
        order_id: OrderId,
        status: OrderStatus,
    },

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl OrderError {
    /// Message suitable for showing to the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::NotEditable { .. } => "This order can no longer be changed.".to_string(),
            Self::Api(err) => err
                .server_message()
                .unwrap_or_else(|| "Failed to update the order. Please try again.".to_string()),
        }
    }
}

/// Order operations for the signed-in user.
#[derive(Clone)]
pub struct OrderService {
    api: ApiClient,
}

impl OrderService {
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// # Errors
    ///
    /// Returns the underlying API error.
    pub async fn list(&self) -> Result<Vec<Order>, OrderError> {
        Ok(self.api.list_orders().await?)
    }

    /// # Errors
    ///
    /// Returns the underlying API error.
    pub async fn history(&self) -> Result<Vec<Order>, OrderError> {
        Ok(self.api.order_history().await?)
    }

    /// # Errors
    ///
    /// Returns the underlying API error.
    pub async fn get(&self, order_id: OrderId) -> Result<Order, OrderError> {
        Ok(self.api.get_order(order_id).await?)
    }

    /// The order still being assembled, if any.
    ///
    /// # Errors
    ///
    /// Returns the underlying API error.
    pub async fn pending(&self) -> Result<Option<Order>, OrderError> {
        Ok(self.api.get_pending_order().await?)
    }

    /// Place the pending order.
    ///
    /// # Errors
    ///
    /// Returns the underlying API error.
    #[instrument(skip(self))]
    pub async fn place(&self) -> Result<(), OrderError> {
        self.api.place_order().await?;
        info!("Order placed");
        Ok(())
    }

    /// Add an item to the pending order, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns the underlying API error.
    #[instrument(skip(self))]
    pub async fn add_to_pending(&self, item_id: ItemId, quantity: u32) -> Result<(), OrderError> {
        self.api.add_to_order(item_id, quantity).await?;
        Ok(())
    }

    /// Set an item's quantity in the order being processed.
    ///
    /// # Errors
    ///
    /// Returns the underlying API error.
    #[instrument(skip(self))]
    pub async fn update_process_quantity(
        &self,
        item_id: ItemId,
        quantity: u32,
    ) -> Result<(), OrderError> {
        self.api.update_process_quantity(item_id, quantity).await?;
        Ok(())
    }

    /// Close an editable order.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::NotEditable`] unless the order is `TEMP`.
    #[instrument(skip(self))]
    pub async fn close(&self, order_id: OrderId) -> Result<Order, OrderError> {
        self.ensure_editable(order_id).await?;
        self.api.close_order(order_id).await?;
        info!(%order_id, "Order closed");
        self.get(order_id).await
    }

    /// Add an item to an editable order.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::NotEditable`] unless the order is `TEMP`.
    #[instrument(skip(self))]
    pub async fn add_item(
        &self,
        order_id: OrderId,
        item_id: ItemId,
        quantity: u32,
    ) -> Result<Order, OrderError> {
        self.ensure_editable(order_id).await?;
        self.api.add_item_to_order(order_id, item_id, quantity).await?;
        self.get(order_id).await
    }

    /// Change the quantity of a line on an editable order. Zero removes it.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::NotEditable`] unless the order is `TEMP`.
    #[instrument(skip(self))]
    pub async fn update_item(
        &self,
        order_id: OrderId,
        order_item_id: OrderItemId,
        quantity: u32,
    ) -> Result<Order, OrderError> {
        if quantity == 0 {
            return self.remove_item(order_id, order_item_id).await;
        }
        self.ensure_editable(order_id).await?;
        self.api
            .update_order_item(order_id, order_item_id, quantity)
            .await?;
        self.get(order_id).await
    }

    /// Remove a line from an editable order.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::NotEditable`] unless the order is `TEMP`.
    #[instrument(skip(self))]
    pub async fn remove_item(
        &self,
        order_id: OrderId,
        order_item_id: OrderItemId,
    ) -> Result<Order, OrderError> {
        self.ensure_editable(order_id).await?;
        self.api.remove_order_item(order_id, order_item_id).await?;
        self.get(order_id).await
    }

    async fn ensure_editable(&self, order_id: OrderId) -> Result<Order, OrderError> {
        let order = self.api.get_order(order_id).await?;
        if order.status.is_editable() {
            Ok(order)
        } else {
            Err(OrderError::NotEditable {
                order_id,
                status: order.status,
            })
        }
    }
}
