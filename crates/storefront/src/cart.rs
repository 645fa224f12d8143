//! Client-side mirror of the server cart.
//!
//! Mutations are strictly request-then-refetch: the mutating call's response
//! body is ignored and the cart and its total are fetched again in parallel.
//! Every operation requires an authenticated session and makes no network
//! call without one.
//!
//! A failed mutating call or refetch leaves the mirror cleared with the
//! error recorded in [`CartState::error`]. Local policy rejections (the
//! per-item cap, stock) only record the error.

use core::fmt;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use marketstall_core::{CartSnapshot, ItemId, MAX_QUANTITY_PER_ITEM, OrderId, Price};

use crate::api::{ApiClient, ApiError};
use crate::session::SessionMirror;

/// The user action a cart error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartAction {
    Add,
    Update,
    Remove,
    Clear,
    Checkout,
}

impl CartAction {
    const fn login_prompt(self) -> &'static str {
        match self {
            Self::Add => "add items to your cart",
            Self::Update => "update your cart",
            Self::Remove => "remove items from your cart",
            Self::Clear => "clear your cart",
            Self::Checkout => "check out",
        }
    }

    const fn failure(self) -> &'static str {
        match self {
            Self::Add => "add item to cart",
            Self::Update => "update item quantity",
            Self::Remove => "remove item from cart",
            Self::Clear => "clear cart",
            Self::Checkout => "create order from cart",
        }
    }
}

impl fmt::Display for CartAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.failure())
    }
}

/// Errors raised by [`CartMirror`] operations.
#[derive(Debug, Error)]
pub enum CartError {
    #[error("Not signed in (cannot {})", .action.login_prompt())]
    NotAuthenticated { action: CartAction },

    #[error("Quantity per item is limited to {max}")]
    QuantityLimit { max: u32 },

    #[error("Item {item_id} is out of stock or the requested quantity is not available")]
    Unavailable { item_id: ItemId },

    /// The availability round trip failed.
    #[error("Availability check for item {item_id} failed: {source}")]
    AvailabilityCheck {
        item_id: ItemId,
        #[source]
        source: ApiError,
    },

    /// The mutating call failed.
    #[error("Failed to {action}: {source}")]
    Mutation {
        action: CartAction,
        #[source]
        source: ApiError,
    },

    /// Fetching the cart or its total failed.
    #[error("Failed to fetch cart: {0}")]
    Fetch(#[source] ApiError),
}

impl CartError {
    /// Message suitable for showing to the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::NotAuthenticated { action } => {
                format!("Please log in to {}.", action.login_prompt())
            }
            Self::QuantityLimit { max } => {
                format!("You can't add more than {max} of the same item to your cart.")
            }
            Self::Unavailable { .. } => {
                "This item is out of stock or the requested quantity is not available.".to_string()
            }
            Self::AvailabilityCheck { .. } => {
                "Could not check item availability. Please try again later.".to_string()
            }
            Self::Mutation {
                action: CartAction::Add,
                source,
            } => source
                .server_message()
                .unwrap_or_else(|| format!("Failed to {}. Please try again later.", CartAction::Add)),
            Self::Mutation { action, .. } => format!("Failed to {action}. Please try again later."),
            Self::Fetch(_) => "Failed to fetch cart data. Please try again.".to_string(),
        }
    }

    /// Whether this failure invalidates the mirrored snapshot.
    #[must_use]
    pub const fn clears_mirror(&self) -> bool {
        matches!(self, Self::Mutation { .. } | Self::Fetch(_))
    }

    /// The underlying API error, if any.
    #[must_use]
    pub const fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::AvailabilityCheck { source, .. } | Self::Mutation { source, .. } => Some(source),
            Self::Fetch(source) => Some(source),
            _ => None,
        }
    }
}

/// What observers of the cart see.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartState {
    pub snapshot: CartSnapshot,
    /// A fetch is in flight.
    pub loading: bool,
    /// User-facing message of the last failure, cleared by the next success.
    pub error: Option<String>,
}

impl CartState {
    /// Sum of quantities in the snapshot.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.snapshot.item_count()
    }

    #[must_use]
    pub const fn total(&self) -> Price {
        self.snapshot.total
    }
}

/// Shared handle to the cart mirror.
#[derive(Clone)]
pub struct CartMirror {
    inner: Arc<CartInner>,
}

struct CartInner {
    api: ApiClient,
    session: SessionMirror,
    state: watch::Sender<CartState>,
}

impl CartMirror {
    #[must_use]
    pub fn new(api: ApiClient, session: SessionMirror) -> Self {
        Self {
            inner: Arc::new(CartInner {
                api,
                session,
                state: watch::Sender::new(CartState::default()),
            }),
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> CartState {
        self.inner.state.borrow().clone()
    }

    /// Latest fetched snapshot.
    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        self.inner.state.borrow().snapshot.clone()
    }

    /// Sum of quantities in the latest fetched snapshot.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.inner.state.borrow().item_count()
    }

    /// Follow state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartState> {
        self.inner.state.subscribe()
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Add `quantity` units of an item.
    ///
    /// Rejected locally when the cart would hold more than
    /// [`MAX_QUANTITY_PER_ITEM`] units of the item, and after an availability
    /// check when the stock does not cover `quantity`.
    ///
    /// # Errors
    ///
    /// See [`CartError`].
    #[instrument(skip(self))]
    pub async fn add(&self, item_id: ItemId, quantity: u32) -> Result<CartSnapshot, CartError> {
        self.require_session(CartAction::Add)?;
        if quantity == 0 {
            return Ok(self.snapshot());
        }

        let held = self.inner.state.borrow().snapshot.quantity_of(item_id);
        if held.saturating_add(quantity) > MAX_QUANTITY_PER_ITEM {
            return Err(self.record(CartError::QuantityLimit {
                max: MAX_QUANTITY_PER_ITEM,
            }));
        }

        self.ensure_available(item_id, quantity).await?;

        if let Err(source) = self.inner.api.add_to_cart(item_id, quantity).await {
            return Err(self.record(CartError::Mutation {
                action: CartAction::Add,
                source,
            }));
        }
        info!(%item_id, quantity, "Added to cart");
        self.refetch().await
    }

    /// Set the quantity of a cart line. Zero removes the line.
    ///
    /// # Errors
    ///
    /// See [`CartError`].
    #[instrument(skip(self))]
    pub async fn set_quantity(&self, item_id: ItemId, quantity: u32) -> Result<CartSnapshot, CartError> {
        if quantity == 0 {
            return self.remove(item_id).await;
        }

        self.require_session(CartAction::Update)?;
        if quantity > MAX_QUANTITY_PER_ITEM {
            return Err(self.record(CartError::QuantityLimit {
                max: MAX_QUANTITY_PER_ITEM,
            }));
        }

        self.ensure_available(item_id, quantity).await?;

        if let Err(source) = self.inner.api.update_cart_item(item_id, quantity).await {
            return Err(self.record(CartError::Mutation {
                action: CartAction::Update,
                source,
            }));
        }
        self.refetch().await
    }

    /// Remove a cart line.
    ///
    /// # Errors
    ///
    /// See [`CartError`].
    #[instrument(skip(self))]
    pub async fn remove(&self, item_id: ItemId) -> Result<CartSnapshot, CartError> {
        self.require_session(CartAction::Remove)?;

        if let Err(source) = self.inner.api.remove_cart_item(item_id).await {
            return Err(self.record(CartError::Mutation {
                action: CartAction::Remove,
                source,
            }));
        }
        self.refetch().await
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// See [`CartError`].
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<CartSnapshot, CartError> {
        self.require_session(CartAction::Clear)?;

        if let Err(source) = self.inner.api.clear_cart().await {
            return Err(self.record(CartError::Mutation {
                action: CartAction::Clear,
                source,
            }));
        }
        self.refetch().await
    }

    /// Turn the cart into an order and refetch the (now empty) cart.
    ///
    /// # Errors
    ///
    /// See [`CartError`].
    #[instrument(skip(self))]
    pub async fn checkout(&self) -> Result<OrderId, CartError> {
        self.require_session(CartAction::Checkout)?;

        let order_id = match self.inner.api.create_order_from_cart().await {
            Ok(order_id) => order_id,
            Err(source) => {
                return Err(self.record(CartError::Mutation {
                    action: CartAction::Checkout,
                    source,
                }));
            }
        };
        info!(%order_id, "Order created from cart");
        self.refetch().await?;
        Ok(order_id)
    }

    /// Re-read the cart from the backend.
    ///
    /// Without a session the mirror is cleared and no call is made.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Fetch`] if the cart or total cannot be fetched.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<CartSnapshot, CartError> {
        if !self.inner.session.is_authenticated() {
            self.reset();
            return Ok(CartSnapshot::default());
        }
        self.refetch().await
    }

    /// Follow the session: refresh on sign-in, clear on sign-out.
    pub fn spawn_session_sync(&self) -> JoinHandle<()> {
        let mut session = self.inner.session.subscribe();
        let cart = self.clone();
        tokio::spawn(async move {
            while session.changed().await.is_ok() {
                let state = session.borrow_and_update().clone();
                if state.is_authenticated() {
                    if let Err(err) = cart.refetch().await {
                        debug!(error = %err, "Cart refresh after sign-in failed");
                    }
                } else if !state.is_loading() {
                    cart.reset();
                }
            }
        })
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn require_session(&self, action: CartAction) -> Result<(), CartError> {
        if self.inner.session.is_authenticated() {
            Ok(())
        } else {
            Err(self.record(CartError::NotAuthenticated { action }))
        }
    }

    async fn ensure_available(&self, item_id: ItemId, quantity: u32) -> Result<(), CartError> {
        match self.inner.api.check_availability(item_id).await {
            Ok(availability) if availability.covers(quantity) => Ok(()),
            Ok(availability) => {
                debug!(?availability, quantity, "Insufficient stock");
                Err(self.record(CartError::Unavailable { item_id }))
            }
            Err(source) => Err(self.record(CartError::AvailabilityCheck { item_id, source })),
        }
    }

    async fn refetch(&self) -> Result<CartSnapshot, CartError> {
        self.inner.state.send_modify(|state| state.loading = true);

        let fetched = tokio::try_join!(self.inner.api.get_cart(), self.inner.api.get_cart_total());
        match fetched {
            Ok((cart, total)) => {
                let snapshot = CartSnapshot::from_bodies(cart, &total);
                debug!(items = snapshot.item_count(), "Cart refreshed");
                self.inner.state.send_replace(CartState {
                    snapshot: snapshot.clone(),
                    loading: false,
                    error: None,
                });
                Ok(snapshot)
            }
            Err(err) => Err(self.record(CartError::Fetch(err))),
        }
    }

    fn reset(&self) {
        self.inner.state.send_replace(CartState::default());
    }

    /// Record `err` on the mirror and hand it back.
    fn record(&self, err: CartError) -> CartError {
        warn!(error = %err, "Cart operation failed");
        let message = err.user_message();
        let clear = err.clears_mirror();
        self.inner.state.send_modify(|state| {
            if clear {
                state.snapshot = CartSnapshot::default();
            }
            state.loading = false;
            state.error = Some(message);
        });
        err
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages_match_storefront_copy() {
        assert_eq!(
            CartError::NotAuthenticated {
                action: CartAction::Add
            }
            .user_message(),
            "Please log in to add items to your cart."
        );
        assert_eq!(
            CartError::QuantityLimit { max: 2 }.user_message(),
            "You can't add more than 2 of the same item to your cart."
        );
        assert_eq!(
            CartError::Unavailable {
                item_id: ItemId::new(1)
            }
            .user_message(),
            "This item is out of stock or the requested quantity is not available."
        );
        assert_eq!(
            CartError::Fetch(ApiError::MissingRefreshToken).user_message(),
            "Failed to fetch cart data. Please try again."
        );
    }

    fn rejected(method: reqwest::Method, message: &str) -> ApiError {
        ApiError::Status {
            method,
            path: "/api/cart".to_string(),
            status: reqwest::StatusCode::BAD_REQUEST,
            body: format!(r#"{{"message":"{message}"}}"#),
        }
    }

    #[test]
    fn test_add_message_prefers_server_text() {
        let err = CartError::Mutation {
            action: CartAction::Add,
            source: rejected(reqwest::Method::POST, "Item is discontinued"),
        };
        assert_eq!(err.user_message(), "Item is discontinued");

        let err = CartError::Mutation {
            action: CartAction::Add,
            source: ApiError::MissingRefreshToken,
        };
        assert_eq!(
            err.user_message(),
            "Failed to add item to cart. Please try again later."
        );
    }

    #[test]
    fn test_other_mutations_use_fixed_copy() {
        let cases = [
            (CartAction::Update, "Failed to update item quantity. Please try again later."),
            (CartAction::Remove, "Failed to remove item from cart. Please try again later."),
            (CartAction::Clear, "Failed to clear cart. Please try again later."),
        ];
        for (action, expected) in cases {
            let err = CartError::Mutation {
                action,
                source: rejected(reqwest::Method::DELETE, "Line is locked"),
            };
            assert_eq!(err.user_message(), expected);
        }
    }

    #[test]
    fn test_only_call_failures_clear_the_mirror() {
        assert!(CartError::Fetch(ApiError::MissingRefreshToken).clears_mirror());
        assert!(!CartError::QuantityLimit { max: 2 }.clears_mirror());
        assert!(
            !CartError::NotAuthenticated {
                action: CartAction::Clear
            }
            .clears_mirror()
        );
    }
}
